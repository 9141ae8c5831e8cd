use chip_order_rust::models::{CellValue, Location, PaymentMethod, SheetLayout};
use chip_order_rust::service::{
    AssistedParser, AssistedParserConfig, ExtractionSource, FixedRow, HeuristicParser,
    InMemorySheet, MockLlmClient, OrderNormalizer, SheetStore, SheetTargetResolver,
};
use chip_order_rust::{Catalog, OrderProcessor};
use std::sync::Arc;

const SCENARIO_A: &str =
    "Hi! I'd like to order 2 cheese pouches and 1 BBQ tub please. This is for Maria Santos.";
const SCENARIO_B: &str = "Order for John:\n- 3x P-CHZ\n- 2x 2L-SC\n- 1x P-BBQ";

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::standard().unwrap())
}

fn heuristic_processor() -> OrderProcessor {
    let catalog = catalog();
    OrderProcessor::new(
        Arc::new(HeuristicParser::new(catalog.clone())),
        OrderNormalizer::new(catalog),
        SheetTargetResolver::default(),
    )
}

fn assisted_processor(client: MockLlmClient) -> OrderProcessor {
    let catalog = catalog();
    let config = AssistedParserConfig {
        api_key: Some("sk-test".to_string()),
        ..AssistedParserConfig::default()
    };
    let parser = AssistedParser::new(client, config, HeuristicParser::new(catalog.clone()));
    OrderProcessor::new(
        Arc::new(parser),
        OrderNormalizer::new(catalog),
        SheetTargetResolver::new(SheetLayout::default(), "🤖"),
    )
}

fn warning_texts(warnings: &[chip_order_rust::Warning]) -> Vec<String> {
    warnings.iter().map(|w| w.to_string()).collect()
}

#[tokio::test]
async fn conversational_order_end_to_end() {
    let processed = heuristic_processor().process(SCENARIO_A, None).await;
    let order = &processed.order;

    assert_eq!(processed.source, ExtractionSource::Heuristic);
    assert_eq!(order.customer_name(), "Maria Santos");
    assert_eq!(order.quantity_of("P-CHZ"), 2);
    assert_eq!(order.quantity_of("2L-BBQ"), 1);
    assert_eq!(order.items().len(), 2);
    assert_eq!(order.total(), 590);
    assert_eq!(order.payment(), PaymentMethod::Others);
    assert_eq!(order.location(), Location::Unspecified);
    assert_eq!(order.assignee(), None);
    assert_eq!(
        warning_texts(&processed.warnings),
        vec!["missing payment method", "missing location"]
    );
}

#[tokio::test]
async fn code_list_order_end_to_end() {
    let processed = heuristic_processor().process(SCENARIO_B, None).await;
    let order = &processed.order;

    assert_eq!(order.customer_name(), "John");
    assert_eq!(order.quantity_of("P-CHZ"), 3);
    assert_eq!(order.quantity_of("2L-SC"), 2);
    assert_eq!(order.quantity_of("P-BBQ"), 1);
    assert_eq!(order.total(), 1180);
}

#[tokio::test]
async fn empty_message_yields_empty_order() {
    let processed = heuristic_processor().process("", None).await;

    assert!(processed.order.is_empty());
    assert_eq!(processed.order.total(), 0);
    let warnings = warning_texts(&processed.warnings);
    assert!(warnings.contains(&"missing customer name".to_string()));
    assert!(warnings.contains(&"no recognized products".to_string()));
}

#[tokio::test]
async fn repeated_mentions_are_merged() {
    let processed = heuristic_processor()
        .process("2 cheese pouches, then 1 more cheese pouch. gcash, QC", None)
        .await;
    let order = &processed.order;

    assert_eq!(order.items().len(), 1);
    assert_eq!(order.quantity_of("P-CHZ"), 3);
    assert_eq!(order.total(), 450);
    assert_eq!(order.payment(), PaymentMethod::GCash);
    assert_eq!(order.location(), Location::Qc);
    assert_eq!(order.assignee().map(|a| a.to_string()).as_deref(), Some("Ferdie"));
}

#[tokio::test]
async fn assisted_result_is_used_when_valid() {
    let reply = r#"Here you go:
{"customer_name": "Maria Santos",
 "items": [{"description": "P-CHZ", "quantity": 2}, {"description": "2L-BBQ", "quantity": 1}],
 "payment_method": "GCash", "location": "Paranaque"}"#;
    let processed = assisted_processor(MockLlmClient::Respond(reply.to_string()))
        .process(SCENARIO_A, None)
        .await;
    let order = &processed.order;

    assert_eq!(processed.source, ExtractionSource::Assisted);
    assert_eq!(order.total(), 590);
    assert_eq!(order.payment(), PaymentMethod::GCash);
    assert_eq!(order.location(), Location::Paranaque);
    assert_eq!(order.assignee().map(|a| a.to_string()).as_deref(), Some("Nina"));
    assert!(processed.warnings.is_empty());
}

#[tokio::test]
async fn assisted_failure_matches_heuristic_output() {
    let fallback = assisted_processor(MockLlmClient::Fail("connection refused".to_string()))
        .process(SCENARIO_B, None)
        .await;
    let heuristic = heuristic_processor().process(SCENARIO_B, None).await;

    assert_eq!(fallback.source, ExtractionSource::Heuristic);
    assert_eq!(fallback.order.items(), heuristic.order.items());
    assert_eq!(fallback.order.customer_name(), heuristic.order.customer_name());
    assert_eq!(fallback.order.total(), heuristic.order.total());
    assert_eq!(fallback.export, heuristic.export);
    assert!(fallback.warnings[0]
        .to_string()
        .starts_with("assisted parser failed"));
}

#[tokio::test]
async fn malformed_assisted_output_falls_back() {
    let processed = assisted_processor(MockLlmClient::Respond("sorry, I can't".to_string()))
        .process(SCENARIO_A, None)
        .await;

    assert_eq!(processed.source, ExtractionSource::Heuristic);
    assert_eq!(processed.order.total(), 590);
}

#[tokio::test]
async fn plan_fills_every_product_column() {
    let processor = heuristic_processor();
    let processed = processor.process(SCENARIO_A, None).await;
    let plan = processor.plan(&processed.order, &FixedRow(12)).unwrap();

    assert_eq!(plan.row, 12);
    assert_eq!(plan.product_cells().count(), 8);
    assert_eq!(plan.get("D"), Some(&CellValue::text("Maria Santos")));
    assert_eq!(plan.get("E"), Some(&CellValue::Blank));
    assert_eq!(plan.get("F"), Some(&CellValue::text("Others")));
    assert_eq!(plan.get("N"), Some(&CellValue::Number(2)));
    assert_eq!(plan.get("V"), Some(&CellValue::Number(1)));
    assert_eq!(plan.get("O"), Some(&CellValue::Blank));
    assert_eq!(plan.get("H"), Some(&CellValue::text("Reserved 🤖")));
}

#[tokio::test]
async fn commit_writes_after_last_row() {
    let processor = heuristic_processor();
    let sheet = InMemorySheet::new(1);

    for message in [SCENARIO_A, SCENARIO_B] {
        let processed = processor.process(message, None).await;
        let row = sheet.next_free_row().await.unwrap();
        let plan = processor.plan(&processed.order, &FixedRow(row)).unwrap();
        sheet.write_row(plan.row, &plan.columns).await.unwrap();
    }

    assert_eq!(sheet.len(), 2);
    let second = sheet.row(3).unwrap();
    assert_eq!(second.get("D"), Some(&CellValue::text("John")));
    assert_eq!(second.get("N"), Some(&CellValue::Number(3)));
    assert_eq!(sheet.next_free_row().await.unwrap(), 4);
}

#[tokio::test]
async fn export_record_shape() {
    let processed = heuristic_processor().process(SCENARIO_A, None).await;
    let json = serde_json::to_value(&processed.export).unwrap();

    assert_eq!(json["customer"], "Maria Santos");
    assert_eq!(json["total"], 590);
    assert_eq!(json["payment"], "Others");
    assert_eq!(json["location"], "Unspecified");
    assert!(json["assignee"].is_null());
    assert_eq!(json["items"][0]["code"], "P-CHZ");
    assert_eq!(json["items"][0]["name"], "Pouch Cheese");
    assert_eq!(json["items"][0]["qty"], 2);
    assert_eq!(json["items"][1]["code"], "2L-BBQ");
}

#[tokio::test]
async fn list_with_trailing_quantities() {
    let processed = heuristic_processor()
        .process("Order for Liza:\nCheese pouch 2\nBBQ tub 3", None)
        .await;
    let order = &processed.order;

    assert_eq!(order.customer_name(), "Liza");
    assert_eq!(order.quantity_of("P-CHZ"), 2);
    assert_eq!(order.quantity_of("2L-BBQ"), 3);
    assert_eq!(order.total(), 1170);
}

#[tokio::test]
async fn delivery_mention_adds_no_shipping_fee() {
    let processed = heuristic_processor()
        .process("For delivery 2 bbq tubs po, this is for Ana", None)
        .await;
    let order = &processed.order;

    assert_eq!(order.customer_name(), "Ana");
    assert_eq!(order.shipping_fee(), 0);
    assert_eq!(order.grand_total(), 580);
    assert!(!processed.breakdown.contains("Shipping Fee"));
}
