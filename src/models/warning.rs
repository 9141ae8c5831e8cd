use serde::{Serialize, Serializer};
use std::fmt;

/// 可恢复问题: 附在订单上返回，从不阻断处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingCustomerName,
    UnrecognizedItem(String),
    InvalidQuantity(String),
    NoRecognizedProducts,
    MissingPaymentMethod,
    MissingLocation,
    AssistedParserFailed(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingCustomerName => f.write_str("missing customer name"),
            Warning::UnrecognizedItem(d) => write!(f, "unrecognized item: {}", d),
            Warning::InvalidQuantity(d) => write!(f, "invalid quantity for item: {}", d),
            Warning::NoRecognizedProducts => f.write_str("no recognized products"),
            Warning::MissingPaymentMethod => f.write_str("missing payment method"),
            Warning::MissingLocation => f.write_str("missing location"),
            Warning::AssistedParserFailed(reason) => write!(f, "assisted parser failed: {}", reason),
        }
    }
}

impl Serialize for Warning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
