use crate::models::{
    Catalog, DiscountRule, LineItem, Location, Order, OrderDraft, PaymentMethod, RawExtraction,
    Warning,
};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use std::sync::Arc;

/// 订单规范化: 对照目录校验原始结果，合并数量，计算金额
#[derive(Debug, Clone)]
pub struct OrderNormalizer {
    catalog: Arc<Catalog>,
}

impl OrderNormalizer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn normalize(&self, raw: RawExtraction) -> (Order, Vec<Warning>) {
        self.normalize_at(raw, Local::now())
    }

    /// 同 normalize，但处理时间由调用方给定
    pub fn normalize_at(&self, raw: RawExtraction, processed_at: DateTime<Local>) -> (Order, Vec<Warning>) {
        let mut warnings = Vec::new();

        let customer_name = raw
            .customer_name
            .as_deref()
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        if customer_name.is_empty() {
            warnings.push(Warning::MissingCustomerName);
        }

        // 同一编码的数量累加，保持首次出现的顺序
        let mut merged: IndexMap<String, u32> = IndexMap::new();
        for item in &raw.items {
            let Some(product) = self.catalog.lookup(&item.description) else {
                tracing::warn!("unrecognized item dropped: {}", item.description);
                warnings.push(Warning::UnrecognizedItem(item.description.clone()));
                continue;
            };
            if item.quantity == 0 {
                warnings.push(Warning::InvalidQuantity(item.description.clone()));
                continue;
            }
            let entry = merged.entry(product.code.clone()).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }
        if merged.is_empty() {
            warnings.push(Warning::NoRecognizedProducts);
        }

        let payment_token = raw.payment_method.as_deref().filter(|t| !t.trim().is_empty());
        if payment_token.is_none() {
            warnings.push(Warning::MissingPaymentMethod);
        }
        let location_token = raw.location.as_deref().filter(|t| !t.trim().is_empty());
        if location_token.is_none() {
            warnings.push(Warning::MissingLocation);
        }

        let discount = match (raw.discount_percentage, raw.discount_amount) {
            (Some(pct), _) if pct > 0 => Some(DiscountRule::Percent(pct.min(100))),
            (_, Some(amt)) if amt > 0 => Some(DiscountRule::Amount(amt)),
            _ => None,
        };

        let draft = OrderDraft {
            customer_name,
            items: merged
                .into_iter()
                .map(|(code, quantity)| LineItem { code, quantity })
                .collect(),
            payment: PaymentMethod::from_token(payment_token),
            location: Location::from_token(location_token),
            shipping_fee: raw.shipping_fee.unwrap_or(0),
            discount,
        };
        let order = draft.finalize(&self.catalog, processed_at);

        tracing::info!(
            "order normalized: customer={:?}, lines={}, total={}, warnings={}",
            order.customer_name(),
            order.items().len(),
            order.total(),
            warnings.len()
        );
        (order, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignee, RawItem};

    fn normalizer() -> OrderNormalizer {
        OrderNormalizer::new(Arc::new(Catalog::standard().unwrap()))
    }

    fn codes(order: &Order) -> Vec<(&str, u32)> {
        order
            .items()
            .iter()
            .map(|i| (i.code.as_str(), i.quantity))
            .collect()
    }

    #[test]
    fn merges_quantities_by_code() {
        let raw = RawExtraction {
            customer_name: Some("  Maria   Santos ".to_string()),
            items: vec![
                RawItem::new("cheese pouch", 2),
                RawItem::new("2L-BBQ", 1),
                RawItem::new("P-CHZ", 1),
            ],
            ..RawExtraction::default()
        };
        let (order, warnings) = normalizer().normalize(raw);
        assert_eq!(order.customer_name(), "Maria Santos");
        assert_eq!(codes(&order), vec![("P-CHZ", 3), ("2L-BBQ", 1)]);
        assert_eq!(order.total(), 3 * 150 + 290);
        assert!(!warnings.contains(&Warning::MissingCustomerName));
    }

    #[test]
    fn drops_unrecognized_and_zero_quantity_items() {
        let raw = RawExtraction {
            customer_name: Some("Ana".to_string()),
            items: vec![
                RawItem::new("kimchi chips", 2),
                RawItem::new("cheese", 0),
                RawItem::new("sour cream", 1),
            ],
            ..RawExtraction::default()
        };
        let (order, warnings) = normalizer().normalize(raw);
        assert_eq!(codes(&order), vec![("P-SC", 1)]);
        assert!(warnings.contains(&Warning::UnrecognizedItem("kimchi chips".to_string())));
        assert!(warnings.contains(&Warning::InvalidQuantity("cheese".to_string())));
        assert!(!warnings.contains(&Warning::NoRecognizedProducts));
    }

    #[test]
    fn empty_extraction_still_produces_an_order() {
        let (order, warnings) = normalizer().normalize(RawExtraction::default());
        assert!(order.is_empty());
        assert_eq!(order.customer_name(), "");
        assert_eq!(order.total(), 0);
        assert_eq!(order.payment(), PaymentMethod::Others);
        assert_eq!(order.location(), Location::Unspecified);
        assert_eq!(order.assignee(), None);
        assert!(warnings.contains(&Warning::MissingCustomerName));
        assert!(warnings.contains(&Warning::NoRecognizedProducts));
    }

    #[test]
    fn resolves_payment_location_and_assignee() {
        let raw = RawExtraction {
            customer_name: Some("Liza".to_string()),
            items: vec![RawItem::new("og", 1)],
            payment_method: Some("maya".to_string()),
            location: Some("Paranaque".to_string()),
            ..RawExtraction::default()
        };
        let (order, warnings) = normalizer().normalize(raw);
        assert_eq!(order.payment(), PaymentMethod::Maya);
        assert_eq!(order.location(), Location::Paranaque);
        assert_eq!(order.assignee(), Some(Assignee::Nina));
        assert!(warnings.is_empty());

        let raw = RawExtraction {
            payment_method: Some("crypto".to_string()),
            location: Some("Cebu".to_string()),
            ..RawExtraction::default()
        };
        let (order, _) = normalizer().normalize(raw);
        assert_eq!(order.payment(), PaymentMethod::Others);
        assert_eq!(order.location(), Location::Unspecified);
    }

    #[test]
    fn carries_shipping_and_discount() {
        let raw = RawExtraction {
            items: vec![RawItem::new("cheese tub", 2)],
            shipping_fee: Some(100),
            discount_percentage: Some(5),
            ..RawExtraction::default()
        };
        let (order, _) = normalizer().normalize(raw);
        assert_eq!(order.total(), 580);
        assert_eq!(order.shipping_fee(), 100);
        assert_eq!(order.discount().map(|d| d.amount), Some(29));
        assert_eq!(order.grand_total(), 651);
    }
}
