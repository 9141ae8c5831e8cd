pub mod handlers;

pub use handlers::{commit_order, health_check, parse_order, plan_order, AppState};

use axum::{
    routing::{get, post},
    Router,
};

/// 路由表
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/orders/parse", post(parse_order))
        .route("/api/orders/plan", post(plan_order))
        .route("/api/orders/commit", post(commit_order))
        .with_state(state)
}
