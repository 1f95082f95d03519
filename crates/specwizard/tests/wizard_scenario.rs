//! End-to-end wizard scenario: import a JSON export, load it the way the CLI
//! does, and walk through a sequence of checkbox toggles.

use std::time::Duration;

use specwizard::catalog::CatalogBuilder;
use specwizard::config::DisplayConfig;
use specwizard::facet::{QueryState, ResultPanel};
use specwizard::view::{render_text, PanelView, WizardView};
use specwizard::{DatasetLoader, FacetEngine, Product};

const EXPORT: &str = r#"{
    "products": [
        {
            "product_id": "p1",
            "display_name": "P1",
            "product_url": "https://example.com/p1",
            "price": 10,
            "specs": [
                {"group": "A", "key": "color", "value": "red"},
                {"group": "B", "key": "size", "value": "M"}
            ]
        },
        {
            "product_id": "p2",
            "display_name": "P2",
            "product_url": "https://example.com/p2",
            "price": 5,
            "specs": [{"group": "A", "key": "color", "value": "blue"}]
        },
        {
            "product_id": "p3",
            "display_name": "P3",
            "product_url": "https://example.com/p3",
            "price": 20
        }
    ]
}"#;

fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.product_id.as_str()).collect()
}

async fn load_engine(dir: &tempfile::TempDir) -> FacetEngine {
    let input = dir.path().join("export.json");
    let dataset = dir.path().join("products.db");
    std::fs::write(&input, EXPORT).unwrap();

    let mut builder = CatalogBuilder::create(&dataset).unwrap();
    builder.import_json(&input).unwrap();
    builder.finish().unwrap();

    let mut engine = FacetEngine::new();
    engine
        .load(&DatasetLoader::new(&dataset, Duration::from_millis(10)))
        .await
        .unwrap();
    engine
}

#[tokio::test]
async fn test_scenario_toggle_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = load_engine(&dir).await;
    assert!(engine.catalog().unwrap().fingerprint().is_some());

    // nothing checked: everything, cheapest first
    assert_eq!(engine.query_state(), QueryState::NoSelection);
    assert_eq!(ids(engine.results()), vec!["p2", "p1", "p3"]);

    engine.toggle_criterion("A", "color", "red", true);
    assert_eq!(ids(engine.results()), vec!["p1"]);
    assert_eq!(engine.compute_badge_count("A").count, 1);

    engine.toggle_criterion("B", "size", "M", true);
    assert_eq!(ids(engine.results()), vec!["p1"]);
    assert_eq!(engine.compute_matching_count(), 1);

    engine.toggle_criterion("B", "size", "M", false);
    engine.toggle_criterion("B", "size", "L", true);
    assert!(engine.results().is_empty());
    assert_eq!(engine.result_panel(), ResultPanel::NoMatches);

    let text = render_text(&WizardView::project(&engine, &DisplayConfig::default()));
    assert!(text.contains("No matching products."));
    assert!(text.contains("Selected: A (1), B (1)"));
}

#[tokio::test]
async fn test_scenario_toggle_off_restores_all() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = load_engine(&dir).await;
    let before = engine.results().to_vec();

    engine.toggle_criterion("A", "color", "red", true);
    engine.toggle_criterion("A", "color", "red", false);

    assert_eq!(engine.results(), before.as_slice());
    assert!(!engine.compute_badge_count("A").visible);
}

#[tokio::test]
async fn test_scenario_same_key_union() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = load_engine(&dir).await;

    engine.toggle_criterion("A", "color", "red", true);
    engine.toggle_criterion("A", "color", "blue", true);

    assert_eq!(ids(engine.results()), vec!["p2", "p1"]);
    assert_eq!(engine.compute_badge_count("A").count, 2);
}

#[tokio::test]
async fn test_scenario_inverted_panel() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = load_engine(&dir).await;

    engine.toggle_criterion("A", "color", "red", true);
    engine.set_invert(true);

    // P3 has no specifications, so it is in neither panel
    assert_eq!(ids(engine.inverted_results().unwrap()), vec!["p2"]);

    let view = WizardView::project(&engine, &DisplayConfig::default());
    let Some(PanelView::Products { lines }) = &view.inverted else {
        panic!("expected an inverted product panel");
    };
    assert_eq!(lines[0].name, "P2");
    assert_eq!(lines[0].price, "5");
}

#[tokio::test]
async fn test_missing_dataset_shows_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = FacetEngine::new();

    let result = engine
        .load(&DatasetLoader::new(dir.path().join("missing.db"), Duration::from_millis(1)))
        .await;

    assert!(result.is_err());
    assert!(!engine.toggle_criterion("A", "color", "red", true));
    assert!(matches!(engine.result_panel(), ResultPanel::LoadFailed { .. }));
}
