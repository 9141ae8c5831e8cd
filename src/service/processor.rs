use crate::error::SheetError;
use crate::models::{Catalog, ExportRecord, Order, SheetAssignment, Warning};
use crate::service::extractor::{ExtractionSource, OrderExtractor};
use crate::service::sheet::{RowProbe, SheetTargetResolver};
use crate::service::OrderNormalizer;
use serde::Serialize;
use std::sync::Arc;

/// 一次 "处理订单" 的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedOrder {
    pub order: Order,
    pub warnings: Vec<Warning>,
    pub source: ExtractionSource,
    pub export: ExportRecord,
    pub breakdown: String,
}

/// 文本 -> 解析器 -> 规范化 -> 订单，再按需计算写表计划
pub struct OrderProcessor {
    extractor: Arc<dyn OrderExtractor>,
    normalizer: OrderNormalizer,
    resolver: SheetTargetResolver,
}

impl OrderProcessor {
    pub fn new(
        extractor: Arc<dyn OrderExtractor>,
        normalizer: OrderNormalizer,
        resolver: SheetTargetResolver,
    ) -> Self {
        Self {
            extractor,
            normalizer,
            resolver,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.normalizer.catalog()
    }

    /// 任何用户输入都会得到一个 (可能为空的) 订单加提示，不会失败
    pub async fn process(&self, message: &str, api_key: Option<&str>) -> ProcessedOrder {
        let outcome = self.extractor.extract(message, api_key).await;
        let source = outcome.source;
        let fallback_warning = outcome.warning();

        let (order, mut warnings) = self.normalizer.normalize(outcome.raw);
        if let Some(w) = fallback_warning {
            warnings.insert(0, w);
        }

        let catalog = self.normalizer.catalog();
        let export = ExportRecord::from_order(&order, catalog);
        let breakdown = order.breakdown(catalog);

        tracing::info!(
            "order processed via {:?}: customer={:?}, total={}, warnings={}",
            source,
            order.customer_name(),
            order.total(),
            warnings.len()
        );

        ProcessedOrder {
            order,
            warnings,
            source,
            export,
            breakdown,
        }
    }

    pub fn plan<P: RowProbe + ?Sized>(&self, order: &Order, probe: &P) -> Result<SheetAssignment, SheetError> {
        self.resolver.resolve(order, probe)
    }
}
