use chip_order_rust::api::{self, AppState};
use chip_order_rust::models::SheetLayout;
use chip_order_rust::service::{
    AssistedParser, AssistedParserConfig, HeuristicParser, HttpLlmClient, InMemorySheet,
    OrderNormalizer, SheetTargetResolver,
};
use chip_order_rust::{AppConfig, Catalog, OrderProcessor};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let catalog = Arc::new(Catalog::standard()?);
    info!("Catalog loaded: {} products", catalog.len());

    // 启发式解析器同时作为 LLM 失败时的兜底
    let heuristic = HeuristicParser::new(catalog.clone())
        .with_default_quantity(config.parser.default_quantity);

    let timeout = Duration::from_secs(config.llm.timeout_secs);
    let client = HttpLlmClient::new(config.llm.endpoint.clone(), timeout)?;
    let assisted = AssistedParser::new(
        client,
        AssistedParserConfig {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            timeout,
            api_key: config.llm.api_key.clone(),
        },
        heuristic,
    );
    if config.llm.api_key.is_none() {
        info!("No API key configured, requests without api_key use heuristic parsing");
    }

    let processor = Arc::new(OrderProcessor::new(
        Arc::new(assisted),
        OrderNormalizer::new(catalog),
        SheetTargetResolver::new(SheetLayout::default(), config.sheet.status_marker.clone()),
    ));

    let state = AppState {
        processor,
        sheet: Arc::new(InMemorySheet::new(config.sheet.header_rows)),
    };

    let app = api::router(state).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/orders/parse   - parse only");
    info!("  POST /api/orders/plan    - parse + row plan");
    info!("  POST /api/orders/commit  - parse + write to worksheet {}", config.sheet.worksheet);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
