use crate::models::catalog::find_word;
use crate::models::{
    fold_text, Catalog, Location, ProductEntry, RawExtraction, RawItem, LOCATION_KEYWORDS,
    PAYMENT_KEYWORDS,
};
use regex::Regex;
use std::sync::{Arc, LazyLock};

const NAME: &str = r"([A-Z][\p{L}'-]*(?:[ \t]+(?:(?:de|dela|del|delos|san|sta)[ \t]+)?[A-Z][\p{L}'-]*){0,3})";

/// 英文 / 菲律宾语数量词
const NUMBER_WORDS: &[(&str, u32)] = &[
    ("a", 1),
    ("an", 1),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("couple", 2),
    ("dozen", 12),
    ("isa", 1),
    ("isang", 1),
    ("dalawa", 2),
    ("dalawang", 2),
    ("tatlo", 3),
    ("tatlong", 3),
    ("apat", 4),
    ("lima", 5),
    ("limang", 5),
    ("anim", 6),
    ("pito", 7),
    ("pitong", 7),
    ("walo", 8),
    ("walong", 8),
    ("siyam", 9),
    ("sampu", 10),
    ("sampung", 10),
];

/// 含义模糊的数量词，取配置的默认数量
const VAGUE_WORDS: &[&str] = &["some", "few", "several"];

fn quantity_words_pattern() -> String {
    let mut words: Vec<&str> = NUMBER_WORDS
        .iter()
        .map(|(w, _)| *w)
        .chain(VAGUE_WORDS.iter().copied())
        .collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.join("|")
}

static QTY_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,4}}|{})[ \t]*(?:x|×|\*|pcs?\.?|pieces?|packs?|bags?)?(?:[ \t]+(?:more|extra|of|na|ng|the|orders?))*[ \t]*[:\-]?[ \t]*$",
        quantity_words_pattern()
    ))
    .unwrap()
});

static QTY_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[ \t]*(?:(?:x|×|\*)[ \t]*(\d{1,4})\b|[:=\-][ \t]*(\d{1,4})\b(?:[ \t]*(?:pcs?|pieces?|packs?))?|(\d{1,4})[ \t]*(?:pcs?|pieces?|packs?)\b|\((\d{1,4})\))",
    )
    .unwrap()
});

/// 商品后面直接跟一个裸数字 ("cheese pouch 2")，数字后必须是分隔符或全文结束
static QTY_TRAILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]+(\d{1,4})[ \t]*([,;.\n])?").unwrap());

static CUSTOMER_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i:this[ \t]+(?:order[ \t]+)?is[ \t]+for)[ \t]+",
        r"(?i:order[ \t]+for)[ \t]+",
        r"(?i:para[ \t]+(?:kay|kina|sa))[ \t]+",
    ]
    .iter()
    .map(|marker| Regex::new(&format!("{}{}", marker, NAME)).unwrap())
    .collect()
});

static TRAILING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^[ \t]*[-–—~][ \t]*{}[ \t]*[.!]?[ \t]*$", NAME)).unwrap());

static FOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b(?i:for)[ \t]+{}", NAME)).unwrap());

/// 运费: sf / df / shipping / delivery fee 任意写法；单独的 "delivery" 必须带 ":" 或币种
static SHIPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(?:sf|df|shipping(?:[ \t]+fee)?|delivery[ \t]+(?:fee|charge))\b[ \t]*[:=\-]?[ \t]*(?:php|p|₱)?|delivery[ \t]*(?:[:=][ \t]*(?:php|p|₱)?|php|₱))[ \t]*(\d{1,5})\b")
        .unwrap()
});

static DISCOUNT_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})[ \t]*%").unwrap());

static DISCOUNT_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:less|discount)[ \t]*[:\-]?[ \t]*(?:php|p|₱)?[ \t]*(\d{1,5})\b|\b(\d{1,5})[ \t]*(?:php|pesos?)?[ \t]+off\b")
        .unwrap()
});

/// 姓名候选里不该出现的首词
const NOT_A_NAME: &[&str] = &["pickup", "delivery", "today", "tomorrow", "quezon", "me", "us"];

/// 只用于泛化的 "for <Name>" 匹配: 日期时间词
const TIME_WORDS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december", "tonight", "later", "now", "next",
    "this", "lunch", "dinner", "breakfast", "merienda", "christmas", "noche",
];

/// 商品提及位置
#[derive(Debug)]
struct Mention<'c> {
    start: usize,
    end: usize,
    alias: &'c str,
    product: &'c ProductEntry,
}

/// 启发式解析器: 规则 + 关键字，纯函数，不依赖任何外部服务
#[derive(Debug, Clone)]
pub struct HeuristicParser {
    catalog: Arc<Catalog>,
    default_quantity: u32,
}

impl HeuristicParser {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            default_quantity: 1,
        }
    }

    /// 没写数量或写了 "some"/"few" 时使用的数量
    pub fn with_default_quantity(mut self, quantity: u32) -> Self {
        self.default_quantity = quantity.max(1);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn parse(&self, message: &str) -> RawExtraction {
        let folded = fold_text(message);

        let (discount_percentage, discount_amount) = match extract_discount_percent(&folded) {
            Some(pct) => (Some(pct), None),
            None => (None, extract_discount_amount(&folded)),
        };

        let raw = RawExtraction {
            customer_name: self.extract_customer(message),
            items: self.extract_items(&folded),
            payment_method: extract_payment(&folded),
            location: extract_location(&folded),
            shipping_fee: self.extract_shipping(&folded),
            discount_percentage,
            discount_amount,
        };

        tracing::debug!(
            "heuristic parse: customer={:?}, items={}, payment={:?}, location={:?}",
            raw.customer_name,
            raw.items.len(),
            raw.payment_method,
            raw.location
        );
        raw
    }

    /// 显式标记中位置最靠前的合格姓名；其次末行 "- Name"；最后才用泛化的 "for <Name>"
    fn extract_customer(&self, message: &str) -> Option<String> {
        let marked = CUSTOMER_MARKERS
            .iter()
            .flat_map(|marker| marker.captures_iter(message))
            .filter_map(|c| {
                let start = c.get(0)?.start();
                let name = c.get(1)?.as_str().trim().to_string();
                self.is_marked_name(&name).then_some((start, name))
            })
            .min_by_key(|(start, _)| *start);
        if let Some((_, name)) = marked {
            return Some(name);
        }

        if let Some(last) = message.lines().rev().find(|l| !l.trim().is_empty()) {
            if let Some(name) = TRAILING_NAME
                .captures(last)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|n| self.is_marked_name(n))
            {
                return Some(name);
            }
        }

        FOR_NAME
            .captures_iter(message)
            .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
            .find(|n| self.is_plausible_name(n))
    }

    /// 显式标记后的姓名: 只排除商品名、单独的地区词和 NOT_A_NAME
    fn is_marked_name(&self, candidate: &str) -> bool {
        let Some(first) = candidate.split_whitespace().next() else {
            return false;
        };
        let folded = fold_text(candidate);
        !NOT_A_NAME.contains(&fold_text(first).as_str())
            && !LOCATION_KEYWORDS.iter().any(|(k, _)| *k == folded)
            && self.catalog.lookup(candidate).is_none()
    }

    /// 泛化的 "for X" 更容易误判，额外排除付款/地区/时间词开头的候选
    fn is_plausible_name(&self, candidate: &str) -> bool {
        let Some(first) = candidate.split_whitespace().next() else {
            return false;
        };
        let first = fold_text(first);
        if NOT_A_NAME.contains(&first.as_str())
            || TIME_WORDS.contains(&first.as_str())
            || PAYMENT_KEYWORDS.iter().any(|(k, _)| *k == first)
            || LOCATION_KEYWORDS.iter().any(|(k, _)| *k == first)
        {
            return false;
        }
        self.catalog.lookup(candidate).is_none() && self.catalog.lookup(&first).is_none()
    }

    /// 找出所有商品提及 (长别名优先，不重叠)，再取紧邻的数量
    fn extract_items(&self, folded: &str) -> Vec<RawItem> {
        let mentions = self.find_mentions(folded);

        let mut items = Vec::with_capacity(mentions.len());
        let mut consumed = 0usize;
        for (idx, mention) in mentions.iter().enumerate() {
            let next_start = mentions.get(idx + 1).map_or(folded.len(), |m| m.start);

            let before_from = consumed.min(mention.start);
            let before = &folded[before_from..mention.start];
            let before_line = before.rsplit('\n').next().unwrap_or(before);

            let quantity = match QTY_BEFORE
                .captures(before_line)
                .and_then(|c| c.get(1))
                .and_then(|m| self.quantity_from_token(m.as_str()))
            {
                Some(q) => {
                    consumed = mention.end;
                    q
                }
                None => {
                    let after = &folded[mention.end..next_start];
                    let at_end = next_start == folded.len();
                    match quantity_after(after, at_end) {
                        Some((q, len)) => {
                            consumed = mention.end + len;
                            q
                        }
                        None => {
                            consumed = mention.end;
                            self.default_quantity
                        }
                    }
                }
            };

            tracing::debug!(
                "mention '{}' -> {} x{}",
                mention.alias,
                mention.product.code,
                quantity
            );
            items.push(RawItem::new(mention.alias, quantity));
        }
        items
    }

    fn find_mentions<'c>(&'c self, folded: &str) -> Vec<Mention<'c>> {
        let mut mentions: Vec<Mention<'c>> = Vec::new();
        for (alias, product) in self.catalog.aliases_longest_first() {
            let mut from = 0;
            while let Some(start) = find_word(folded, alias, from) {
                let end = start + alias.len();
                let overlaps = mentions.iter().any(|m| start < m.end && m.start < end);
                if !overlaps {
                    mentions.push(Mention {
                        start,
                        end,
                        alias,
                        product,
                    });
                }
                from = end;
            }
        }
        mentions.sort_by_key(|m| m.start);
        mentions
    }

    fn quantity_from_token(&self, token: &str) -> Option<u32> {
        if let Ok(n) = token.parse::<u32>() {
            return Some(n);
        }
        if VAGUE_WORDS.contains(&token) {
            return Some(self.default_quantity);
        }
        NUMBER_WORDS
            .iter()
            .find(|(w, _)| *w == token)
            .map(|(_, n)| *n)
    }

    /// 运费金额后面紧跟商品名时，那个数字其实是数量 ("delivery: 2 bbq tubs")
    fn extract_shipping(&self, folded: &str) -> Option<u32> {
        SHIPPING
            .captures_iter(folded)
            .filter_map(|c| c.get(1))
            .filter(|m| {
                let rest = folded[m.end()..].trim_start();
                !self
                    .catalog
                    .aliases_longest_first()
                    .any(|(alias, _)| find_word(rest, alias, 0) == Some(0))
            })
            .find_map(|m| m.as_str().parse::<u32>().ok())
            .filter(|fee| *fee > 0)
    }
}

/// 付款方式: 全文子串扫描，位置最靠前的关键字获胜
fn extract_payment(folded: &str) -> Option<String> {
    PAYMENT_KEYWORDS
        .iter()
        .filter_map(|(keyword, _)| folded.find(keyword).map(|pos| (pos, *keyword)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, keyword)| keyword.to_string())
}

/// 地区: 归一到 "QC" / "Paranaque"
fn extract_location(folded: &str) -> Option<String> {
    LOCATION_KEYWORDS
        .iter()
        .filter_map(|(keyword, location)| find_word(folded, keyword, 0).map(|pos| (pos, *location)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, location): (usize, Location)| location.as_str().to_string())
}

/// 商品后面的数量: 显式标记 ("x3"、": 3"、"3 pcs"、"(3)")，或行尾/分隔符前的裸数字
///
/// 返回 (数量, 在 after 中消耗的字节数)。
fn quantity_after(after: &str, at_end: bool) -> Option<(u32, usize)> {
    if let Some(caps) = QTY_AFTER.captures(after) {
        let len = caps.get(0).map_or(0, |m| m.end());
        let quantity = (1..=4)
            .filter_map(|i| caps.get(i))
            .find_map(|m| m.as_str().parse::<u32>().ok())?;
        return Some((quantity, len));
    }

    let caps = QTY_TRAILING.captures(after)?;
    let whole = caps.get(0)?;
    // "cheese 3 bbq" 里的 3 属于后面的 bbq
    if caps.get(2).is_none() && !(at_end && whole.end() == after.len()) {
        return None;
    }
    let quantity = caps.get(1)?.as_str().parse::<u32>().ok()?;
    Some((quantity, whole.end()))
}

fn extract_discount_percent(folded: &str) -> Option<u32> {
    DISCOUNT_PERCENT
        .captures(folded)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|pct| *pct > 0 && *pct <= 100)
}

fn extract_discount_amount(folded: &str) -> Option<u32> {
    DISCOUNT_AMOUNT
        .captures(folded)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|amt| *amt > 0)
}
