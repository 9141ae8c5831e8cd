use crate::error::CatalogError;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static PLURAL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(pouch|tub)(?:es|s)\b").unwrap());

/// 包装规格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Pouch,
    Tub,
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeClass::Pouch => f.write_str("Pouch"),
            SizeClass::Tub => f.write_str("Tub"),
        }
    }
}

/// 商品目录条目
#[derive(Debug, Clone, Serialize)]
pub struct ProductEntry {
    pub code: String,
    pub name: String,
    pub size: SizeClass,
    pub unit_price: u32,
    #[serde(skip)]
    pub aliases: Vec<String>,
}

impl ProductEntry {
    pub fn new(code: &str, name: &str, size: SizeClass, unit_price: u32, aliases: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            size,
            unit_price,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// 例如 "Pouch Cheese"
    pub fn label(&self) -> String {
        format!("{} {}", self.size, self.name)
    }
}

/// 小写、ñ -> n、复数规格词还原 (pouches -> pouch, tubs -> tub)
///
/// 保留换行和标点，解析器依赖原有的行结构。
pub fn fold_text(text: &str) -> String {
    let lowered = text.to_lowercase().replace('ñ', "n");
    PLURAL_SIZE.replace_all(&lowered, "$1").into_owned()
}

/// 在 fold_text 基础上去掉首尾空白并合并连续空白
pub fn normalize_token(token: &str) -> String {
    fold_text(token).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// 查找 `needle` 在 `haystack` 中从 `from` 开始的第一个整词出现位置
pub(crate) fn find_word(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let mut start = from;
    while let Some(pos) = haystack.get(start..)?.find(needle) {
        let at = start + pos;
        let end = at + needle.len();
        let before_ok = haystack[..at].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return Some(at);
        }
        start = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// 商品目录: 进程启动时加载一次，之后只读
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: IndexMap<String, ProductEntry>,
    alias_index: HashMap<String, String>,
    /// (别名, 商品编码)，按别名长度降序，长别名优先
    aliases: Vec<(String, String)>,
}

impl Catalog {
    /// 校验并构建目录: 编码唯一、单价为正、同一别名不能指向两个商品
    pub fn new(entries: Vec<ProductEntry>) -> Result<Self, CatalogError> {
        let mut by_code: IndexMap<String, ProductEntry> = IndexMap::new();
        let mut alias_index: HashMap<String, String> = HashMap::new();

        for entry in entries {
            let code = entry.code.trim().to_uppercase();
            if entry.unit_price == 0 {
                return Err(CatalogError::NonPositivePrice {
                    code,
                    price: entry.unit_price,
                });
            }
            if by_code.contains_key(&code) {
                return Err(CatalogError::DuplicateCode(code));
            }

            let names = std::iter::once(code.as_str()).chain(entry.aliases.iter().map(String::as_str));
            for alias in names.map(normalize_token).filter(|a| !a.is_empty()) {
                match alias_index.get(&alias) {
                    Some(owner) if *owner != code => {
                        return Err(CatalogError::AmbiguousAlias {
                            alias,
                            first: owner.clone(),
                            second: code.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        alias_index.insert(alias, code.clone());
                    }
                }
            }

            by_code.insert(code.clone(), ProductEntry { code, ..entry });
        }

        let mut aliases: Vec<(String, String)> = alias_index
            .iter()
            .map(|(alias, code)| (alias.clone(), code.clone()))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Ok(Self {
            entries: by_code,
            alias_index,
            aliases,
        })
    }

    /// 固定的 8 个商品
    pub fn standard() -> Result<Self, CatalogError> {
        let flavors: [(&str, &str, &[&str]); 4] = [
            ("CHZ", "Cheese", &["cheese", "chz"]),
            ("SC", "Sour Cream", &["sour cream", "sourcream"]),
            ("BBQ", "BBQ", &["bbq", "barbecue", "barbeque"]),
            ("OG", "Original", &["original", "og", "original blend", "original spice blend"]),
        ];

        let mut entries = Vec::with_capacity(flavors.len() * 2);
        for (size, prefix, price) in [(SizeClass::Pouch, "P", 150), (SizeClass::Tub, "2L", 290)] {
            for (suffix, name, words) in &flavors {
                let code = format!("{}-{}", prefix, suffix);
                let mut aliases = Vec::new();
                for w in words.iter() {
                    match size {
                        SizeClass::Pouch => {
                            aliases.push(w.to_string());
                            aliases.push(format!("{} pouch", w));
                            aliases.push(format!("pouch {}", w));
                            aliases.push(format!("pouch of {}", w));
                        }
                        SizeClass::Tub => {
                            aliases.push(format!("{} tub", w));
                            aliases.push(format!("tub {}", w));
                            aliases.push(format!("tub of {}", w));
                            aliases.push(format!("2l {}", w));
                            aliases.push(format!("{} 2l", w));
                        }
                    }
                }
                entries.push(ProductEntry {
                    code,
                    name: name.to_string(),
                    size,
                    unit_price: price,
                    aliases,
                });
            }
        }

        Self::new(entries)
    }

    /// 按编码或别名查找 (不区分大小写)，多词描述时按长别名优先做包含匹配
    pub fn lookup(&self, token: &str) -> Option<&ProductEntry> {
        let phrase = normalize_token(token);
        if phrase.is_empty() {
            return None;
        }
        if let Some(code) = self.alias_index.get(&phrase) {
            return self.entries.get(code);
        }
        if !phrase.contains(' ') {
            return None;
        }
        self.aliases
            .iter()
            .find(|(alias, _)| find_word(&phrase, alias, 0).is_some())
            .and_then(|(_, code)| self.entries.get(code))
    }

    /// 按编码精确查找
    pub fn get(&self, code: &str) -> Option<&ProductEntry> {
        self.entries.get(&code.trim().to_uppercase())
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProductEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有别名 (含编码本身)，长别名在前
    pub fn aliases_longest_first(&self) -> impl Iterator<Item = (&str, &ProductEntry)> {
        self.aliases
            .iter()
            .filter_map(|(alias, code)| self.entries.get(code).map(|e| (alias.as_str(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_eight_products() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.get("p-chz").unwrap().unit_price, 150);
        assert_eq!(catalog.get("2L-OG").unwrap().unit_price, 290);
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.lookup("  P-CHZ ").unwrap().code, "P-CHZ");
        assert_eq!(catalog.lookup("Cheese").unwrap().code, "P-CHZ");
        assert_eq!(catalog.lookup("cheese pouch").unwrap().code, "P-CHZ");
        assert_eq!(catalog.lookup("Cheese Pouches").unwrap().code, "P-CHZ");
        assert_eq!(catalog.lookup("2l-sc").unwrap().code, "2L-SC");
    }

    #[test]
    fn longest_alias_wins_on_multi_word_descriptions() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.lookup("bbq").unwrap().code, "P-BBQ");
        assert_eq!(catalog.lookup("1 bbq tub please").unwrap().code, "2L-BBQ");
        assert_eq!(catalog.lookup("extra sour cream tubs").unwrap().code, "2L-SC");
    }

    #[test]
    fn unknown_tokens_are_not_found() {
        let catalog = Catalog::standard().unwrap();
        assert!(catalog.lookup("").is_none());
        assert!(catalog.lookup("kimchi").is_none());
        assert!(catalog.lookup("cheesy").is_none());
        assert!(catalog.lookup("spicy kimchi").is_none());
    }

    #[test]
    fn rejects_duplicate_codes() {
        let entries = vec![
            ProductEntry::new("P-CHZ", "Cheese", SizeClass::Pouch, 150, &["cheese"]),
            ProductEntry::new("p-chz", "Cheese", SizeClass::Pouch, 150, &[]),
        ];
        assert_eq!(
            Catalog::new(entries).unwrap_err(),
            CatalogError::DuplicateCode("P-CHZ".to_string())
        );
    }

    #[test]
    fn rejects_zero_price() {
        let entries = vec![ProductEntry::new("P-CHZ", "Cheese", SizeClass::Pouch, 0, &["cheese"])];
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn rejects_alias_shared_by_two_products() {
        let entries = vec![
            ProductEntry::new("P-CHZ", "Cheese", SizeClass::Pouch, 150, &["cheese"]),
            ProductEntry::new("2L-CHZ", "Cheese", SizeClass::Tub, 290, &["Cheese "]),
        ];
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::AmbiguousAlias { .. })
        ));
    }

    #[test]
    fn find_word_respects_boundaries() {
        assert_eq!(find_word("gcash bbq", "bbq", 0), Some(6));
        assert_eq!(find_word("p-bbq", "bbq", 0), Some(2));
        assert_eq!(find_word("bbqs", "bbq", 0), None);
        assert_eq!(find_word("og og", "og", 1), Some(3));
    }
}
