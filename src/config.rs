use crate::error::ConfigError;
use crate::service::sheet::DEFAULT_STATUS_MARKER;
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub parser: ParserConfig,
    pub sheet: SheetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_key: Option<String>,
}

// api_key 不进日志
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// 没写数量或写了 "some"/"few" 时的默认数量
    pub default_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub worksheet: String,
    pub header_rows: u32,
    pub status_marker: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            llm: LlmConfig {
                endpoint: "https://api.anthropic.com/v1/messages".to_string(),
                model: "claude-3-haiku-20240307".to_string(),
                max_tokens: 1000,
                timeout_secs: 30,
                api_key: None,
            },
            parser: ParserConfig { default_quantity: 1 },
            sheet: SheetConfig {
                worksheet: "ORDER".to_string(),
                header_rows: 1,
                status_marker: DEFAULT_STATUS_MARKER.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 默认值 -> chip-order.toml (可选) -> CHIP_ORDER_* 环境变量
    ///
    /// 例如 `CHIP_ORDER_SERVER__PORT=9000`、`CHIP_ORDER_LLM__API_KEY=...`。
    /// 未配置 key 时读取 ANTHROPIC_API_KEY。
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&AppConfig::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("chip-order").required(false))
            .add_source(
                config::Environment::with_prefix("CHIP_ORDER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: AppConfig = settings.try_deserialize()?;
        if app.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            app.llm.api_key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.default_quantity == 0 {
            return Err(ConfigError::Invalid("parser.default_quantity must be >= 1".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("llm.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sheet.worksheet, "ORDER");
    }

    #[test]
    fn zero_default_quantity_is_rejected() {
        let mut config = AppConfig::default();
        config.parser.default_quantity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_hides_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
    }
}
