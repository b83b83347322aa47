use super::*;
use meli_journey::catalog::{PRODUCT_PRICES, PRODUCT_TITLES};
use meli_journey::ElementFinder;
use rstest::rstest;

const CANDIDATES: [&str; 4] = [".current", ".previous", ".legacy", ".ancient"];

#[tokio::test]
async fn test_no_candidate_matches() {
    let page = FakePage::new().with_texts(".unrelated", &["x"]);

    let resolved = ElementFinder::new(&page).resolve(&CANDIDATES).await.unwrap();
    assert!(resolved.is_none());
    assert_eq!(page.queried(), CANDIDATES.to_vec());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(3)]
#[tokio::test]
async fn test_single_match_at_any_position(#[case] position: usize) {
    let page = FakePage::new().with_texts(CANDIDATES[position], &["only"]);

    let resolved = ElementFinder::new(&page)
        .resolve(&CANDIDATES)
        .await
        .unwrap()
        .expect("one candidate matches");
    assert_eq!(resolved.selector(), CANDIDATES[position]);
    assert_eq!(resolved.text_at(0).await.unwrap(), "only");
}

#[tokio::test]
async fn test_earliest_of_several_matches_wins() {
    let page = FakePage::new()
        .with_texts(".previous", &["newer markup"])
        .with_texts(".legacy", &["older markup", "more"])
        .with_texts(".ancient", &["oldest"]);

    let resolved = ElementFinder::new(&page).resolve(&CANDIDATES).await.unwrap().unwrap();
    assert_eq!(resolved.selector(), ".previous");
    assert_eq!(resolved.count().await.unwrap(), 1);
    assert_eq!(page.queried(), vec![".current", ".previous"]);
}

#[tokio::test]
async fn test_empty_set_does_not_count_as_match() {
    let page = FakePage::new()
        .with(".current", Vec::new())
        .with_texts(".legacy", &["x"]);

    let resolved = ElementFinder::new(&page).resolve(&CANDIDATES).await.unwrap().unwrap();
    assert_eq!(resolved.selector(), ".legacy");
}

#[tokio::test]
async fn test_catalog_prefers_current_markup_on_snapshot() {
    let page = HtmlPage::new(RESULTS_PAGE);
    let finder = ElementFinder::new(&page);

    let titles = finder.resolve(PRODUCT_TITLES).await.unwrap().unwrap();
    let prices = finder.resolve(PRODUCT_PRICES).await.unwrap().unwrap();
    assert_eq!(titles.selector(), ".poly-component__title");
    assert_eq!(titles.count().await.unwrap(), 8);
    assert_eq!(prices.selector(), ".andes-money-amount__fraction");
    assert_eq!(prices.count().await.unwrap(), 5);
}
