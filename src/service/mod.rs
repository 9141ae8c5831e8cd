pub mod assisted;
pub mod extractor;
pub mod heuristic;
pub mod llm;
pub mod normalizer;
pub mod processor;
pub mod sheet;

pub use assisted::{AssistedParser, AssistedParserConfig};
pub use extractor::{ExtractionSource, FallbackReason, OrderExtractor, ParseOutcome};
pub use heuristic::HeuristicParser;
pub use llm::{HttpLlmClient, LlmClient, LlmRequest, MockLlmClient};
pub use normalizer::OrderNormalizer;
pub use processor::{OrderProcessor, ProcessedOrder};
pub use sheet::{FixedRow, InMemorySheet, RowProbe, SheetStore, SheetTargetResolver};
