use super::*;
use meli_journey::config::JourneyConfig;
use meli_journey::journey::Journey;
use meli_journey::screenshots::ScreenshotPlan;
use meli_journey::{AppConfig, Extractor, SelectorCatalog};

fn journey_config() -> JourneyConfig {
    let mut config = AppConfig::defaults().unwrap().journey;
    config.settle_ms = 0;
    config
}

#[tokio::test]
async fn test_journey_runs_steps_in_order() -> anyhow::Result<()> {
    let config = journey_config();
    let catalog = SelectorCatalog::default();
    let driver = RecordingDriver::new(RESULTS_PAGE);

    let report = Journey::new(
        &driver,
        &config,
        &catalog,
        Extractor::default(),
        ScreenshotPlan::new("shots"),
    )
    .run()
    .await?;

    let actions = driver.actions();
    let position = |needle: &str| {
        actions
            .iter()
            .position(|a| a.contains(needle))
            .unwrap_or_else(|| panic!("missing action {}", needle))
    };

    assert!(actions[0].starts_with("navigate https://www.mercadolibre.com/"));
    assert!(position("1-landing-page") < position("'méxico'"));
    assert!(position("'méxico'") < position("2-mexico-landing-page"));
    assert!(position("fill(Playstation 5)") < position("3-playstation-search"));
    assert!(position("3-playstation-search") < position("'buscar'"));
    assert!(position("visible css=#root-app") < position("4-results-without-filter"));
    assert!(position("screenshot full 5-results-with-new-filter") < position("'más relevantes'"));
    assert!(position("6-sort-options") < position("'Menor precio'"));
    assert!(position("'Menor precio'") < position("7-results-sorted-by-price"));

    assert_eq!(report.screenshots.len(), 7);
    assert_eq!(report.products.len(), 5);
    // Snapshot prices are not ascending
    assert!(!report.price_order_ok);
    Ok(())
}

#[tokio::test]
async fn test_missing_popups_are_ignored() -> anyhow::Result<()> {
    let config = journey_config();
    let catalog = SelectorCatalog::default();
    let driver = RecordingDriver::new(RESULTS_PAGE)
        .without(&Locator::button_named("Más tarde"))
        .without(&Locator::button_named("Aceptar cookies"));

    let report = Journey::new(&driver, &config, &catalog, Extractor::default(), ScreenshotPlan::disabled())
        .run()
        .await?;

    assert!(report.screenshots.is_empty());
    assert_eq!(report.products.len(), 5);
    assert!(!driver.actions().iter().any(|a| a.contains("más tarde")));
    Ok(())
}

#[tokio::test]
async fn test_missing_filter_fails_filter_step() {
    let config = journey_config();
    let catalog = SelectorCatalog::default();
    let driver = RecordingDriver::new(RESULTS_PAGE).without(&Locator::css(&config.new_item_filter));

    let result = Journey::new(&driver, &config, &catalog, Extractor::default(), ScreenshotPlan::disabled())
        .run()
        .await;

    match result {
        Err(AppError::Step { step, .. }) => assert_eq!(step, "filter"),
        other => panic!("expected filter step failure, got {:?}", other.map(|r| r.products)),
    }
    assert!(!driver.actions().iter().any(|a| a.contains("más relevantes")));
}

#[tokio::test]
async fn test_empty_results_are_not_a_failure() -> anyhow::Result<()> {
    let config = journey_config();
    let catalog = SelectorCatalog::default();
    let driver = RecordingDriver::new("<html><body><p>Sin resultados</p></body></html>");

    let report = Journey::new(&driver, &config, &catalog, Extractor::default(), ScreenshotPlan::disabled())
        .run()
        .await?;

    assert!(report.products.is_empty());
    assert!(report.price_order_ok);
    Ok(())
}

#[tokio::test]
async fn test_report_serializes() -> anyhow::Result<()> {
    let config = journey_config();
    let catalog = SelectorCatalog::default();
    let driver = RecordingDriver::new(RESULTS_PAGE);

    let report = Journey::new(&driver, &config, &catalog, Extractor::new(2, "n/a"), ScreenshotPlan::disabled())
        .run()
        .await?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["products"][1]["title"], "PlayStation 5 Digital");
    assert_eq!(json["products"][1]["price"], "9,299");
    Ok(())
}
