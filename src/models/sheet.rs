use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// 单元格取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Number(u64),
    Blank,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Blank => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_u64(*n),
            CellValue::Blank => serializer.serialize_str(""),
        }
    }
}

/// ORDER 工作表的列布局
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub date: &'static str,
    pub customer: &'static str,
    pub assignee: &'static str,
    pub payment: &'static str,
    pub location: &'static str,
    pub status: &'static str,
    /// (商品编码, 数量列)
    pub products: [(&'static str, &'static str); 8],
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            date: "C",
            customer: "D",
            assignee: "E",
            payment: "F",
            location: "G",
            status: "H",
            products: [
                ("P-CHZ", "N"),
                ("P-SC", "O"),
                ("P-BBQ", "P"),
                ("P-OG", "Q"),
                ("2L-CHZ", "T"),
                ("2L-SC", "U"),
                ("2L-BBQ", "V"),
                ("2L-OG", "W"),
            ],
        }
    }
}

impl SheetLayout {
    pub fn product_column(&self, code: &str) -> Option<&'static str> {
        self.products
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, column)| *column)
    }
}

/// 写表计划: 目标行 + 列 -> 值
#[derive(Debug, Clone, Serialize)]
pub struct SheetAssignment {
    pub row: u32,
    pub columns: IndexMap<&'static str, CellValue>,
    /// 数量列 (8 个商品各一列)
    #[serde(skip)]
    pub product_columns: Vec<&'static str>,
}

impl SheetAssignment {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns.get(column)
    }

    pub fn product_cells(&self) -> impl Iterator<Item = (&'static str, &CellValue)> + '_ {
        self.product_columns
            .iter()
            .filter_map(|col| self.columns.get(col).map(|value| (*col, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_covers_all_products() {
        let layout = SheetLayout::default();
        assert_eq!(layout.product_column("2L-BBQ"), Some("V"));
        assert_eq!(layout.product_column("X"), None);
    }
}
