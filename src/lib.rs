pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use models::{Catalog, Order, RawExtraction, SheetAssignment, Warning};
pub use service::{OrderProcessor, ProcessedOrder};
