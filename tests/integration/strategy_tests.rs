use super::*;
use price_scout::ScrapeOutcome;
use price_scout::strategy::ExtractionChain;

const MILK: &str = "Great Value 2% Milk 1 Gallon";

async fn run_chain(service: &FakeRenderService, site: &str, query: &str) -> ScrapeOutcome {
    let target = target(site, query);
    let timings = fast_timings();
    ExtractionChain::new(service, &target, query, &timings)
        .run()
        .await
}

#[tokio::test]
async fn test_price_on_search_page() {
    let service = FakeRenderService::new().page(
        search_url("walmart", MILK),
        r#"<html><body><div><span itemprop="price" content="3.48"></span></div></body></html>"#,
    );

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Price("$3.48".to_string()));
    assert!(service.navigations().is_empty());
    assert_eq!(service.opened(), 1);
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_price_that_renders_late_is_picked_up_by_polling() {
    let service = FakeRenderService::new().snapshots(
        search_url("target", MILK),
        vec![
            EMPTY_PAGE.to_string(),
            EMPTY_PAGE.to_string(),
            r#"<html><body><div data-test="current-price"><span>$3.59</span></div></body></html>"#
                .to_string(),
        ],
    );

    let outcome = run_chain(&service, "target", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Price("$3.59".to_string()));
}

#[tokio::test]
async fn test_candidate_price_listed_next_to_title() {
    // The header placeholder defeats the direct cascade; the card's own price is found by
    // walking up from the matching title.
    let service = FakeRenderService::new().page(
        search_url("walmart", MILK),
        r#"<html><body>
            <header><span itemprop="price"></span></header>
            <div class="card">
                <div><a data-automation-id="product-title" href="/ip/111">Great Value 2% Reduced Fat Milk, 1 Gallon</a></div>
                <div><span itemprop="price" content="3.12"></span></div>
            </div>
        </body></html>"#,
    );

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Price("$3.12".to_string()));
    assert!(service.navigations().is_empty());
}

#[tokio::test]
async fn test_best_candidate_href_is_followed() {
    let service = FakeRenderService::new()
        .page(
            search_url("walmart", MILK),
            r#"<html><body>
                <a data-automation-id="product-title" href="/ip/900">Garden Hose 50 ft</a>
                <a data-automation-id="product-title" href="/ip/222">Great Value 2% Milk 1 Gallon</a>
            </body></html>"#,
        )
        .page(
            "https://www.walmart.com/ip/222",
            r#"<html><body><span itemprop="price">$3.27</span></body></html>"#,
        );

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Price("$3.27".to_string()));
    assert_eq!(service.navigations(), vec!["https://www.walmart.com/ip/222".to_string()]);
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_first_product_link_when_no_candidate_matches() {
    let service = FakeRenderService::new()
        .page(
            search_url("walmart", MILK),
            r#"<html><body><a href="/ip/333">Garden Hose</a></body></html>"#,
        )
        .page(
            "https://www.walmart.com/ip/333",
            r#"<html><body><span class="price-characteristic">24.97</span></body></html>"#,
        );

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Price("$24.97".to_string()));
    assert_eq!(service.navigations(), vec!["https://www.walmart.com/ip/333".to_string()]);
}

#[tokio::test]
async fn test_not_found_when_every_stage_is_exhausted() {
    let service = FakeRenderService::new();

    let outcome = run_chain(&service, "kroger", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::NotFound);
    assert_eq!(outcome.to_string(), "Price not found");
    assert_eq!(service.opened(), 1);
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_link_fallback_runs_on_the_followed_page() {
    // Nothing navigates back to the search results: the first product link is taken from
    // the candidate's page.
    let service = FakeRenderService::new()
        .page(
            search_url("target", MILK),
            r#"<html><body><a data-test="product-title" href="/p/milk/-/A-1">Great Value 2% Milk 1 Gallon</a></body></html>"#,
        )
        .page(
            "https://www.target.com/p/milk/-/A-1",
            r#"<html><body><a href="/p/related/-/A-2">Related item</a></body></html>"#,
        );

    let outcome = run_chain(&service, "target", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::NotFound);
    assert_eq!(
        service.navigations(),
        vec![
            "https://www.target.com/p/milk/-/A-1".to_string(),
            "https://www.target.com/p/related/-/A-2".to_string(),
        ]
    );
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_open_failure_is_an_error() {
    let service = FakeRenderService::new().failing_open("walmart.com");

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Error);
    assert_eq!(service.opened(), 0);
    assert_eq!(service.closed(), 0);
}

#[tokio::test]
async fn test_load_that_never_completes_is_an_error() {
    let service = FakeRenderService::new().stalled("target.com");

    let outcome = run_chain(&service, "target", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Error);
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_followed_page_that_never_loads_is_an_error() {
    let service = FakeRenderService::new()
        .page(
            search_url("walmart", MILK),
            r#"<html><body><a data-automation-id="product-title" href="/ip/444">Great Value 2% Milk 1 Gallon</a></body></html>"#,
        )
        .stalled("/ip/444");

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Error);
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_panic_during_extraction_still_releases_the_context() {
    let service = FakeRenderService::new().panicking("walmart.com");

    let outcome = run_chain(&service, "walmart", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Error);
    assert_eq!(service.opened(), 1);
    assert_eq!(service.closed(), 1);
}

#[tokio::test]
async fn test_extraction_failure_is_an_error_and_releases_the_context() {
    let service = FakeRenderService::new().failing_extract("kroger.com");

    let outcome = run_chain(&service, "kroger", MILK).await;

    assert_eq!(outcome, ScrapeOutcome::Error);
    assert_eq!(service.opened(), 1);
    assert_eq!(service.closed(), 1);
}
