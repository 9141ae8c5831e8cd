use serde::{Deserialize, Serialize};

fn default_quantity() -> u32 {
    1
}

/// 解析器输出的单条商品描述 (未经目录校验)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(alias = "product_code", alias = "product")]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl RawItem {
    pub fn new(description: impl Into<String>, quantity: u32) -> Self {
        Self {
            description: description.into(),
            quantity,
        }
    }
}

/// 解析器原始输出 (不可信的中间结果)
///
/// 启发式解析器和 LLM 都产出这个结构，LLM 返回的 JSON 也按这个形状反序列化，
/// 所以字段都带默认值，缺字段不算格式错误。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(default, alias = "customer")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default, alias = "payment")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "customer_location")]
    pub location: Option<String>,
    #[serde(default)]
    pub shipping_fee: Option<u32>,
    #[serde(default)]
    pub discount_percentage: Option<u32>,
    #[serde(default)]
    pub discount_amount: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_llm_payload() {
        let raw: RawExtraction = serde_json::from_str(
            r#"{"customer_name":"Ana","items":[{"product_code":"P-CHZ","quantity":2},{"description":"bbq tub"}],"customer_location":"Quezon City"}"#,
        )
        .unwrap();
        assert_eq!(raw.customer_name.as_deref(), Some("Ana"));
        assert_eq!(raw.items, vec![RawItem::new("P-CHZ", 2), RawItem::new("bbq tub", 1)]);
        assert_eq!(raw.location.as_deref(), Some("Quezon City"));
        assert!(raw.payment_method.is_none());
    }

    #[test]
    fn rejects_negative_quantity() {
        let parsed = serde_json::from_str::<RawExtraction>(
            r#"{"items":[{"description":"cheese","quantity":-1}]}"#,
        );
        assert!(parsed.is_err());
    }
}
