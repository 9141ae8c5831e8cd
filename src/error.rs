use thiserror::Error;

/// 商品目录配置错误 (启动时致命)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate product code: {0}")]
    DuplicateCode(String),
    #[error("product {code} has non-positive price {price}")]
    NonPositivePrice { code: String, price: u32 },
    #[error("alias '{alias}' claimed by both {first} and {second}")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },
}

/// LLM 调用错误 (只在辅助解析器内部出现，不会抛给调用方)
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e.to_string())
        }
    }
}

/// 表格协作方错误 (探测行号 / 写入失败)
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("invalid target row {0}, rows are 1-based")]
    InvalidRow(u32),
    #[error("next free row probe failed: {0}")]
    Probe(String),
    #[error("sheet write failed: {0}")]
    Write(String),
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
