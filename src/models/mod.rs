pub mod catalog;
pub mod export;
pub mod extraction;
pub mod order;
pub mod sheet;
pub mod warning;

pub use catalog::{fold_text, normalize_token, Catalog, ProductEntry, SizeClass};
pub use export::{ExportItem, ExportRecord};
pub use extraction::{RawExtraction, RawItem};
pub use order::{
    peso, Assignee, Discount, DiscountRule, LineItem, Location, Order, OrderDraft, PaymentMethod,
    LOCATION_KEYWORDS, PAYMENT_KEYWORDS,
};
pub use sheet::{CellValue, SheetAssignment, SheetLayout};
pub use warning::Warning;
