use crate::models::{RawExtraction, Warning};
use crate::service::HeuristicParser;
use async_trait::async_trait;
use serde::Serialize;

/// 原始结果来自哪个解析器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Assisted,
    Heuristic,
}

/// 退回启发式解析的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    MissingApiKey,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub raw: RawExtraction,
    pub source: ExtractionSource,
    pub fallback: Option<FallbackReason>,
}

impl ParseOutcome {
    pub fn heuristic(raw: RawExtraction, fallback: Option<FallbackReason>) -> Self {
        Self {
            raw,
            source: ExtractionSource::Heuristic,
            fallback,
        }
    }

    /// 没配 key 属于正常路径，只有真正调用失败才提示
    pub fn warning(&self) -> Option<Warning> {
        match &self.fallback {
            Some(FallbackReason::Failed(reason)) => Some(Warning::AssistedParserFailed(reason.clone())),
            _ => None,
        }
    }
}

/// 从原始文本抽取订单的统一接口
///
/// `api_key` 是单次请求携带的 key，不需要 key 的实现直接忽略。
#[async_trait]
pub trait OrderExtractor: Send + Sync {
    async fn extract(&self, message: &str, api_key: Option<&str>) -> ParseOutcome;
}

#[async_trait]
impl OrderExtractor for HeuristicParser {
    async fn extract(&self, message: &str, _api_key: Option<&str>) -> ParseOutcome {
        ParseOutcome::heuristic(self.parse(message), None)
    }
}
