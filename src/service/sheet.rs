use crate::error::SheetError;
use crate::models::{CellValue, Order, SheetAssignment, SheetLayout};
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;

pub const DEFAULT_STATUS_MARKER: &str = "🤖";

/// "下一个空行" 探测能力，由表格协作方注入
pub trait RowProbe {
    fn next_free_row(&self) -> Result<u32, SheetError>;
}

impl<F> RowProbe for F
where
    F: Fn() -> Result<u32, SheetError>,
{
    fn next_free_row(&self) -> Result<u32, SheetError> {
        self()
    }
}

/// 调用方已经拿到行号时使用
#[derive(Debug, Clone, Copy)]
pub struct FixedRow(pub u32);

impl RowProbe for FixedRow {
    fn next_free_row(&self) -> Result<u32, SheetError> {
        Ok(self.0)
    }
}

/// 写表目标计算: 纯函数，不做任何 I/O
#[derive(Debug, Clone)]
pub struct SheetTargetResolver {
    layout: SheetLayout,
    status_marker: String,
}

impl Default for SheetTargetResolver {
    fn default() -> Self {
        Self::new(SheetLayout::default(), DEFAULT_STATUS_MARKER)
    }
}

impl SheetTargetResolver {
    pub fn new(layout: SheetLayout, status_marker: impl Into<String>) -> Self {
        Self {
            layout,
            status_marker: status_marker.into(),
        }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn status_value(&self) -> String {
        format!("Reserved {}", self.status_marker)
    }

    pub fn resolve<P: RowProbe + ?Sized>(
        &self,
        order: &Order,
        probe: &P,
    ) -> Result<SheetAssignment, SheetError> {
        let row = probe.next_free_row()?;
        if row == 0 {
            return Err(SheetError::InvalidRow(row));
        }

        let layout = &self.layout;
        let mut columns: IndexMap<&'static str, CellValue> = IndexMap::new();
        columns.insert(
            layout.date,
            CellValue::text(order.processed_at().format("%m/%d/%Y").to_string()),
        );
        let customer = match order.customer_name() {
            "" => "Unknown",
            name => name,
        };
        columns.insert(layout.customer, CellValue::text(customer));
        columns.insert(
            layout.assignee,
            order
                .assignee()
                .map_or(CellValue::Blank, |a| CellValue::text(a.as_str())),
        );
        columns.insert(layout.payment, CellValue::text(order.payment().as_str()));
        columns.insert(layout.location, CellValue::text(order.location().as_str()));
        columns.insert(layout.status, CellValue::text(self.status_value()));

        // 每个商品列都写，订单里没有的清空，避免残留旧值
        let mut product_columns = Vec::with_capacity(layout.products.len());
        for (code, column) in layout.products {
            let value = match order.quantity_of(code) {
                0 => CellValue::Blank,
                qty => CellValue::Number(u64::from(qty)),
            };
            columns.insert(column, value);
            product_columns.push(column);
        }

        tracing::info!(
            "sheet target resolved: row {}, {} columns",
            row,
            columns.len()
        );

        Ok(SheetAssignment {
            row,
            columns,
            product_columns,
        })
    }
}

/// 表格协作方: 探测空行 + 写入整行
///
/// 核心逻辑只消费 next_free_row 的结果，写入由调用方决定何时发生。
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn next_free_row(&self) -> Result<u32, SheetError>;
    async fn write_row(&self, row: u32, columns: &IndexMap<&'static str, CellValue>) -> Result<(), SheetError>;
}

/// 内存表格，供本地运行和测试使用
#[derive(Debug, Default)]
pub struct InMemorySheet {
    header_rows: u32,
    rows: DashMap<u32, IndexMap<String, CellValue>>,
}

impl InMemorySheet {
    pub fn new(header_rows: u32) -> Self {
        Self {
            header_rows,
            rows: DashMap::new(),
        }
    }

    pub fn row(&self, row: u32) -> Option<IndexMap<String, CellValue>> {
        self.rows.get(&row).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SheetStore for InMemorySheet {
    async fn next_free_row(&self) -> Result<u32, SheetError> {
        let last = self.rows.iter().map(|r| *r.key()).max().unwrap_or(self.header_rows);
        Ok(last.max(self.header_rows) + 1)
    }

    async fn write_row(&self, row: u32, columns: &IndexMap<&'static str, CellValue>) -> Result<(), SheetError> {
        if row <= self.header_rows {
            return Err(SheetError::Write(format!("row {} is a header row", row)));
        }
        let values = columns
            .iter()
            .map(|(col, value)| (col.to_string(), value.clone()))
            .collect();
        self.rows.insert(row, values);
        Ok(())
    }
}
