use crate::error::SheetError;
use crate::models::SheetAssignment;
use crate::service::{FixedRow, OrderProcessor, ProcessedOrder, SheetStore};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<OrderProcessor>,
    pub sheet: Arc<dyn SheetStore>,
}

/// 请求体: 聊天原文 + 可选 API key
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub message: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// 请求体: 聊天原文 + 调用方探测到的空行
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub message: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub next_free_row: u32,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
    pub result: Option<ProcessedOrder>,
    pub assignment: Option<SheetAssignment>,
}

impl OrderResponse {
    fn failure(message: String, result: Option<ProcessedOrder>) -> Self {
        Self {
            success: false,
            message,
            result,
            assignment: None,
        }
    }
}

fn sheet_error_status(e: &SheetError) -> StatusCode {
    match e {
        SheetError::InvalidRow(_) => StatusCode::BAD_REQUEST,
        SheetError::Probe(_) | SheetError::Write(_) => StatusCode::BAD_GATEWAY,
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 解析订单 (不写表)
pub async fn parse_order(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Response {
    let processed = state
        .processor
        .process(&req.message, req.api_key.as_deref())
        .await;
    let response = OrderResponse {
        success: true,
        message: format!(
            "Parsed {} line items, {} warnings",
            processed.order.items().len(),
            processed.warnings.len()
        ),
        result: Some(processed),
        assignment: None,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 解析订单并计算写表计划，行号由调用方提供
pub async fn plan_order(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Response {
    let processed = state
        .processor
        .process(&req.message, req.api_key.as_deref())
        .await;

    match state
        .processor
        .plan(&processed.order, &FixedRow(req.next_free_row))
    {
        Ok(assignment) => {
            let response = OrderResponse {
                success: true,
                message: format!("Order planned for row {}", assignment.row),
                result: Some(processed),
                assignment: Some(assignment),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let status = sheet_error_status(&e);
            let response = OrderResponse::failure(format!("Error: {}", e), Some(processed));
            (status, Json(response)).into_response()
        }
    }
}

/// 解析订单，探测空行并写入表格
pub async fn commit_order(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Response {
    let processed = state
        .processor
        .process(&req.message, req.api_key.as_deref())
        .await;

    if processed.order.is_empty() {
        let response = OrderResponse::failure(
            "No recognized products, nothing to write".to_string(),
            Some(processed),
        );
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response();
    }

    let written = async {
        let row = state.sheet.next_free_row().await?;
        let assignment = state.processor.plan(&processed.order, &FixedRow(row))?;
        state.sheet.write_row(assignment.row, &assignment.columns).await?;
        Ok::<_, SheetError>(assignment)
    }
    .await;

    match written {
        Ok(assignment) => {
            tracing::info!("order written to row {}", assignment.row);
            let response = OrderResponse {
                success: true,
                message: format!("Order added to row {}", assignment.row),
                result: Some(processed),
                assignment: Some(assignment),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("sheet update failed: {}", e);
            let status = sheet_error_status(&e);
            let response = OrderResponse::failure(format!("Error: {}", e), Some(processed));
            (status, Json(response)).into_response()
        }
    }
}
