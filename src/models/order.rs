use crate::models::catalog::{find_word, fold_text, Catalog};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 付款方式关键字，按优先级排列 (gcash 必须在 cash 前面)
pub const PAYMENT_KEYWORDS: &[(&str, PaymentMethod)] = &[
    ("gcash", PaymentMethod::GCash),
    ("g-cash", PaymentMethod::GCash),
    ("paymaya", PaymentMethod::Maya),
    ("maya", PaymentMethod::Maya),
    ("bpi", PaymentMethod::Bpi),
    ("bdo", PaymentMethod::Bdo),
    ("cash", PaymentMethod::Cash),
];

/// 地区关键字
pub const LOCATION_KEYWORDS: &[(&str, Location)] = &[
    ("quezon city", Location::Qc),
    ("qc", Location::Qc),
    ("paranaque", Location::Paranaque),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "GCash")]
    GCash,
    #[serde(rename = "BPI")]
    Bpi,
    Maya,
    Cash,
    #[serde(rename = "BDO")]
    Bdo,
    Others,
}

impl PaymentMethod {
    /// 任何输入都映射到唯一的枚举值，识别不了就是 Others
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(token) = token else {
            return PaymentMethod::Others;
        };
        let folded = fold_text(token);
        PAYMENT_KEYWORDS
            .iter()
            .find(|(keyword, _)| folded.contains(keyword))
            .map(|(_, method)| *method)
            .unwrap_or(PaymentMethod::Others)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::GCash => "GCash",
            PaymentMethod::Bpi => "BPI",
            PaymentMethod::Maya => "Maya",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Bdo => "BDO",
            PaymentMethod::Others => "Others",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "QC")]
    Qc,
    Paranaque,
    Unspecified,
}

impl Location {
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(token) = token else {
            return Location::Unspecified;
        };
        let folded = fold_text(token);
        LOCATION_KEYWORDS
            .iter()
            .find(|(keyword, _)| find_word(&folded, keyword, 0).is_some())
            .map(|(_, location)| *location)
            .unwrap_or(Location::Unspecified)
    }

    /// QC -> Ferdie, Paranaque -> Nina, 未指定地区没有负责人
    pub fn assignee(&self) -> Option<Assignee> {
        match self {
            Location::Qc => Some(Assignee::Ferdie),
            Location::Paranaque => Some(Assignee::Nina),
            Location::Unspecified => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Qc => "QC",
            Location::Paranaque => "Paranaque",
            Location::Unspecified => "Unspecified",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 订单负责人
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assignee {
    Ferdie,
    Nina,
}

impl Assignee {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assignee::Ferdie => "Ferdie",
            Assignee::Nina => "Nina",
        }
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 订单行: 同一商品编码只出现一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub code: String,
    pub quantity: u32,
}

/// 折扣规则 (百分比或固定金额)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountRule {
    Percent(u32),
    Amount(u32),
}

/// 已结算的折扣
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discount {
    pub rule: DiscountRule,
    pub amount: u64,
}

/// 规范化过程中的订单草稿，finalize 时统一计算金额
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub payment: PaymentMethod,
    pub location: Location,
    pub shipping_fee: u32,
    pub discount: Option<DiscountRule>,
}

impl OrderDraft {
    pub fn finalize(self, catalog: &Catalog, processed_at: DateTime<Local>) -> Order {
        let total: u64 = self
            .items
            .iter()
            .map(|item| {
                let price = catalog.get(&item.code).map_or(0, |p| p.unit_price);
                u64::from(item.quantity) * u64::from(price)
            })
            .sum();

        let discount = self.discount.map(|rule| {
            let amount = match rule {
                DiscountRule::Percent(pct) => (total * u64::from(pct.min(100)) + 50) / 100,
                DiscountRule::Amount(amt) => u64::from(amt),
            };
            Discount { rule, amount }
        });

        Order {
            customer_name: self.customer_name,
            items: self.items,
            payment: self.payment,
            location: self.location,
            assignee: self.location.assignee(),
            shipping_fee: self.shipping_fee,
            discount,
            total,
            processed_at,
        }
    }
}

/// 规范订单: 金额由订单行和目录单价推导，不可单独设置
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    customer_name: String,
    items: Vec<LineItem>,
    payment: PaymentMethod,
    location: Location,
    assignee: Option<Assignee>,
    shipping_fee: u32,
    discount: Option<Discount>,
    total: u64,
    processed_at: DateTime<Local>,
}

impl Order {
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn quantity_of(&self, code: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.code == code)
            .map_or(0, |item| item.quantity)
    }

    pub fn payment(&self) -> PaymentMethod {
        self.payment
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn assignee(&self) -> Option<Assignee> {
        self.assignee
    }

    pub fn shipping_fee(&self) -> u32 {
        self.shipping_fee
    }

    pub fn discount(&self) -> Option<Discount> {
        self.discount
    }

    /// 商品金额合计: Σ 数量 × 单价
    pub fn total(&self) -> u64 {
        self.total
    }

    /// 加运费、减折扣后的应付金额，不低于 0
    pub fn grand_total(&self) -> u64 {
        let discount = self.discount.map_or(0, |d| d.amount);
        (self.total + u64::from(self.shipping_fee)).saturating_sub(discount)
    }

    pub fn processed_at(&self) -> DateTime<Local> {
        self.processed_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 发给客户的明细文本
    ///
    /// ```text
    /// Pouch Cheese - 2 - ₱150
    /// Shipping Fee: ₱100
    /// ----------
    /// Total - ₱400
    /// ```
    pub fn breakdown(&self, catalog: &Catalog) -> String {
        let mut lines: Vec<String> = Vec::new();
        for item in &self.items {
            match catalog.get(&item.code) {
                Some(product) => lines.push(format!(
                    "{} - {} - {}",
                    product.label(),
                    item.quantity,
                    peso(u64::from(product.unit_price))
                )),
                None => lines.push(format!("{} - {}", item.code, item.quantity)),
            }
        }
        if self.shipping_fee > 0 {
            lines.push(format!("Shipping Fee: {}", peso(u64::from(self.shipping_fee))));
        }
        if let Some(discount) = self.discount {
            match discount.rule {
                DiscountRule::Percent(pct) => {
                    lines.push(format!("Discount ({}%): -{}", pct, peso(discount.amount)))
                }
                DiscountRule::Amount(_) => lines.push(format!("Discount: -{}", peso(discount.amount))),
            }
        }
        lines.push("----------".to_string());
        lines.push(format!("Total - {}", peso(self.grand_total())));
        lines.join("\n")
    }
}

/// ₱ 加千分位
pub fn peso(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    out.push('₱');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
