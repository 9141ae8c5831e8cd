use crate::error::LlmError;
use crate::models::{Catalog, RawExtraction};
use crate::service::extractor::{ExtractionSource, FallbackReason, OrderExtractor, ParseOutcome};
use crate::service::llm::{extract_json, LlmClient, LlmRequest};
use crate::service::HeuristicParser;
use async_trait::async_trait;
use std::fmt::Write;
use std::time::Duration;

const MAX_LOG_CHARS: usize = 2_000;

/// 辅助解析器配置
#[derive(Debug, Clone)]
pub struct AssistedParserConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for AssistedParserConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1000,
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

/// LLM 辅助解析器: 任何失败都退回启发式解析，不会把错误抛给调用方
pub struct AssistedParser<C: LlmClient> {
    client: C,
    config: AssistedParserConfig,
    fallback: HeuristicParser,
}

impl<C: LlmClient> AssistedParser<C> {
    pub fn new(client: C, config: AssistedParserConfig, fallback: HeuristicParser) -> Self {
        Self {
            client,
            config,
            fallback,
        }
    }

    pub async fn parse(&self, message: &str, api_key: Option<&str>) -> ParseOutcome {
        if message.trim().is_empty() {
            return ParseOutcome::heuristic(self.fallback.parse(message), None);
        }

        let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            tracing::debug!("no api key, using heuristic parser");
            return ParseOutcome::heuristic(
                self.fallback.parse(message),
                Some(FallbackReason::MissingApiKey),
            );
        };

        match self.try_assisted(message, key).await {
            Ok(raw) => {
                tracing::info!("assisted parse ok: {} items", raw.items.len());
                ParseOutcome {
                    raw,
                    source: ExtractionSource::Assisted,
                    fallback: None,
                }
            }
            Err(e) => {
                tracing::warn!("assisted parse failed, falling back to heuristic parser: {}", e);
                ParseOutcome::heuristic(
                    self.fallback.parse(message),
                    Some(FallbackReason::Failed(e.to_string())),
                )
            }
        }
    }

    async fn try_assisted(&self, message: &str, api_key: &str) -> Result<RawExtraction, LlmError> {
        let request = LlmRequest {
            api_key: api_key.to_string(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            prompt: build_prompt(self.fallback.catalog(), message),
        };

        let output = tokio::time::timeout(self.config.timeout, self.client.complete(request))
            .await
            .map_err(|_| LlmError::Timeout)??;
        tracing::debug!("llm output: {}", truncate_for_log(&output, MAX_LOG_CHARS));

        let json = extract_json(&output)
            .ok_or_else(|| LlmError::Response("output did not contain JSON".to_string()))?;
        serde_json::from_str::<RawExtraction>(json).map_err(|e| LlmError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl<C: LlmClient> OrderExtractor for AssistedParser<C> {
    async fn extract(&self, message: &str, api_key: Option<&str>) -> ParseOutcome {
        let key = api_key
            .filter(|k| !k.trim().is_empty())
            .or(self.config.api_key.as_deref());
        self.parse(message, key).await
    }
}

/// 构造提示词: 商品表 + 输出 JSON 形状 + 原始消息
pub fn build_prompt(catalog: &Catalog, message: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are an order parser for a chickpea chips shop. Customers write in English, Filipino or Taglish.\n\n",
    );
    prompt.push_str("Products (code: size name, price):\n");
    for product in catalog.entries() {
        let _ = writeln!(
            prompt,
            "- {}: {}, PHP {}",
            product.code,
            product.label(),
            product.unit_price
        );
    }
    prompt.push_str(
        "\nA flavour without a size means the pouch. \"tub\" or \"2L\" means the tub.\n\
         Payment methods: GCash, BPI, Maya, Cash, BDO.\n\
         Locations: Quezon City (QC), Paranaque.\n\n\
         Return ONLY one JSON object with this shape:\n",
    );
    prompt.push_str(
        r#"{"customer_name":"string or null","items":[{"product_code":"P-CHZ","quantity":1}],"payment_method":"string or null","location":"string or null","shipping_fee":null,"discount_percentage":null,"discount_amount":null}"#,
    );
    prompt.push_str("\nUse only the product codes listed above.\n\nCUSTOMER MESSAGE TO PARSE:\n");
    prompt.push_str(message);
    prompt
}

fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
