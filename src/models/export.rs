use crate::models::{Catalog, Order};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportItem {
    pub code: String,
    pub name: String,
    pub qty: u32,
}

/// 导出用的扁平结构: {customer, items:[{code,name,qty}], payment, location, total, assignee}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    pub customer: String,
    pub items: Vec<ExportItem>,
    pub payment: String,
    pub location: String,
    pub total: u64,
    pub assignee: Option<String>,
}

impl ExportRecord {
    pub fn from_order(order: &Order, catalog: &Catalog) -> Self {
        let items = order
            .items()
            .iter()
            .map(|item| ExportItem {
                code: item.code.clone(),
                name: catalog
                    .get(&item.code)
                    .map(|p| p.label())
                    .unwrap_or_else(|| item.code.clone()),
                qty: item.quantity,
            })
            .collect();

        Self {
            customer: order.customer_name().to_string(),
            items,
            payment: order.payment().to_string(),
            location: order.location().to_string(),
            total: order.total(),
            assignee: order.assignee().map(|a| a.to_string()),
        }
    }
}
