//! End-to-end runs over a temp data directory with a mock affiliate network.
//!
//! Each test: seed deals_raw.json / deals.json → Pipeline::run() or
//! AffiliateConverter::convert() → assert on files and links. No network.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use dealflow_common::{Deal, PipelineError, Platform};
use dealflow_pipeline::testing::{deal, raw_deal, MockNetwork};
use dealflow_pipeline::traits::AffiliateNetwork;
use dealflow_pipeline::{
    AffiliateConverter, AffiliateSettings, Classifier, ConversionMethod, DealStore, Pipeline,
    RemoteMode,
};

fn settings(tag: Option<&str>) -> AffiliateSettings {
    AffiliateSettings {
        amazon_tag: tag.map(str::to_string),
        ..Default::default()
    }
}

fn converter(settings: AffiliateSettings, network: &Arc<MockNetwork>) -> AffiliateConverter {
    let network: Arc<dyn AffiliateNetwork> = network.clone();
    AffiliateConverter::new(settings, Some(network))
}

fn pipeline(dir: &std::path::Path, converter: AffiliateConverter) -> Pipeline {
    Pipeline::new(
        DealStore::new(dir),
        Classifier::standard().unwrap(),
        converter,
    )
}

fn seed(path: std::path::PathBuf, deals: &[Deal]) {
    fs::write(path, serde_json::to_string_pretty(deals).unwrap()).unwrap();
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_run_merges_persists_and_consumes_intake() {
    let dir = tempfile::tempdir().unwrap();
    let store = DealStore::new(dir.path());

    let repeat = raw_deal("Old Favourite", "https://www.ajio.com/p/1", Platform::Ajio);
    seed(
        store.intake_path(),
        &[
            raw_deal("Echo Dot", "https://flipshope.com/redirect/2/B0FAKE123", Platform::Unknown),
            raw_deal("Kurta", "https://www.myntra.com/kurta/123", Platform::Unknown),
            repeat.clone(),
        ],
    );
    seed(
        store.catalog_path(),
        &[repeat.clone(), deal("prev1", "https://x.example/prev1")],
    );

    let network = Arc::new(MockNetwork::new().on_coupon(
        "Myntra End of Season",
        "Myntra",
        "https://track.vcm.example/myntra",
    ));
    let p = pipeline(dir.path(), converter(settings(Some("buysasta-21")), &network));

    let stats = p.run().await.unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.via_indirection, 1);
    assert_eq!(stats.classified, 1);
    assert_eq!(stats.converted_local, 1);
    assert_eq!(stats.converted_remote, 1);
    assert_eq!(stats.duplicates_dropped, 1);
    assert_eq!(stats.catalog_size, 4);
    assert!(stats.intake_removed);

    assert!(!store.intake_path().exists(), "intake batch should be consumed");

    let catalog = store.load_catalog();
    let links: Vec<&str> = catalog.iter().map(|d| d.original_link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://www.amazon.in/dp/B0FAKE123?tag=buysasta-21",
            "https://track.vcm.example/myntra",
            "https://www.ajio.com/p/1",
            "https://x.example/prev1",
        ]
    );
    assert_eq!(catalog[0].platform, Platform::Amazon);
    assert_eq!(catalog[1].platform, Platform::Myntra);
}

#[tokio::test]
async fn missing_intake_leaves_catalog_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = DealStore::new(dir.path());
    seed(store.catalog_path(), &[deal("prev1", "https://x.example/prev1")]);
    let before = fs::read_to_string(store.catalog_path()).unwrap();

    let network = Arc::new(MockNetwork::new());
    let p = pipeline(dir.path(), converter(settings(None), &network));

    let err = p.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::IntakeMissing { .. }));
    assert_eq!(fs::read_to_string(store.catalog_path()).unwrap(), before);
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn malformed_intake_aborts_and_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = DealStore::new(dir.path());
    fs::write(store.intake_path(), "[{ broken").unwrap();

    let network = Arc::new(MockNetwork::new());
    let p = pipeline(dir.path(), converter(settings(None), &network));

    assert!(matches!(p.run().await, Err(PipelineError::Parse { .. })));
    assert!(store.intake_path().exists());
    assert!(!store.catalog_path().exists());
}

#[tokio::test]
async fn corrupt_catalog_is_replaced_by_new_batch() {
    let dir = tempfile::tempdir().unwrap();
    let store = DealStore::new(dir.path());
    fs::write(store.catalog_path(), "not json at all").unwrap();
    seed(
        store.intake_path(),
        &[raw_deal("Earbuds", "https://www.amazon.in/dp/B0EAR", Platform::Amazon)],
    );

    let network = Arc::new(MockNetwork::new());
    let p = pipeline(dir.path(), converter(settings(None), &network));

    let stats = p.run().await.unwrap();
    assert_eq!(stats.catalog_size, 1);
    assert_eq!(stats.passed_through, 1);

    let catalog = store.load_catalog();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].original_link, "https://www.amazon.in/dp/B0EAR");
}

#[tokio::test]
async fn catalog_cap_evicts_oldest() {
    let dir = tempfile::tempdir().unwrap();
    let store = DealStore::new(dir.path());
    let previous: Vec<Deal> = (0..5)
        .map(|i| deal(&format!("prev{i}"), "https://x.example/prev"))
        .collect();
    seed(store.catalog_path(), &previous);
    seed(
        store.intake_path(),
        &[
            deal("new0", "https://x.example/new0"),
            deal("new1", "https://x.example/new1"),
        ],
    );

    let network = Arc::new(MockNetwork::new());
    let p = pipeline(dir.path(), converter(settings(None), &network)).with_max_catalog(5);

    let stats = p.run().await.unwrap();
    assert_eq!(stats.evicted, 2);

    let ids: Vec<String> = store.load_catalog().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["new0", "new1", "prev0", "prev1", "prev2"]);
}

// ---------------------------------------------------------------------------
// Remote conversion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_returns_link_unchanged() {
    let network = Arc::new(MockNetwork::new().failing_with_status(500));
    let conv = converter(settings(None), &network);

    let out = conv.convert("https://m.example/x", Platform::Flipkart).await;
    assert_eq!(out.url, "https://m.example/x");
    assert_eq!(out.method, ConversionMethod::Passthrough);
    assert_eq!(network.calls(), 1);
}

#[tokio::test]
async fn coupon_match_uses_advertiser_or_name() {
    let network = Arc::new(
        MockNetwork::new()
            .on_coupon("Big Billion Days", "Flipkart", "https://track.vcm.example/fk")
            .on_coupon("Reliance Digital Sale", "RD", "https://track.vcm.example/rd"),
    );
    let conv = converter(settings(None), &network);

    let fk = conv.convert("https://www.flipkart.com/p/1", Platform::Flipkart).await;
    assert_eq!(fk.url, "https://track.vcm.example/fk");
    assert_eq!(fk.method, ConversionMethod::Remote);

    let rd = conv
        .convert("https://www.reliancedigital.in/product/9", Platform::RelianceDigital)
        .await;
    assert_eq!(rd.url, "https://track.vcm.example/rd");

    let none = conv.convert("https://www.nykaa.com/x", Platform::Nykaa).await;
    assert_eq!(none.url, "https://www.nykaa.com/x");
    assert_eq!(none.method, ConversionMethod::Passthrough);
}

#[tokio::test]
async fn unknown_platform_makes_no_coupon_request() {
    let network = Arc::new(MockNetwork::new().on_coupon("Anything", "Anyone", "https://t.example"));
    let conv = converter(settings(None), &network);

    let out = conv.convert("https://short.example/x", Platform::Unknown).await;
    assert_eq!(out.url, "https://short.example/x");
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn deeplink_mode_posts_each_url() {
    let network = Arc::new(
        MockNetwork::new().on_deeplink("https://www.ajio.com/p/42", "https://vcm.example/s/abc"),
    );
    let conv = converter(
        AffiliateSettings {
            remote_mode: RemoteMode::Deeplink,
            ..Default::default()
        },
        &network,
    );

    let hit = conv.convert("https://www.ajio.com/p/42", Platform::Ajio).await;
    assert_eq!(hit.url, "https://vcm.example/s/abc");
    assert_eq!(hit.method, ConversionMethod::Remote);

    let miss = conv.convert("https://www.ajio.com/p/43", Platform::Ajio).await;
    assert_eq!(miss.url, "https://www.ajio.com/p/43");
    assert_eq!(miss.method, ConversionMethod::Passthrough);
}

#[tokio::test]
async fn every_deal_gets_its_own_request() {
    let dir = tempfile::tempdir().unwrap();
    let store = DealStore::new(dir.path());
    seed(
        store.intake_path(),
        &[
            raw_deal("Shirt", "https://www.myntra.com/a", Platform::Myntra),
            raw_deal("Jeans", "https://www.myntra.com/b", Platform::Myntra),
            raw_deal("Tee", "https://www.ajio.com/c", Platform::Ajio),
        ],
    );

    let network = Arc::new(MockNetwork::new());
    let p = pipeline(dir.path(), converter(settings(None), &network));
    p.run().await.unwrap();

    assert_eq!(network.calls(), 3);
}

#[tokio::test]
async fn slow_network_times_out_to_passthrough() {
    let network = Arc::new(MockNetwork::new().with_delay(Duration::from_secs(5)).on_coupon(
        "Ajio Sale",
        "Ajio",
        "https://track.vcm.example/ajio",
    ));
    let conv = converter(
        AffiliateSettings {
            request_timeout: Duration::from_millis(50),
            ..Default::default()
        },
        &network,
    );

    let started = std::time::Instant::now();
    let out = conv.convert("https://www.ajio.com/p/1", Platform::Ajio).await;
    assert_eq!(out.url, "https://www.ajio.com/p/1");
    assert_eq!(out.method, ConversionMethod::Passthrough);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn amazon_is_tagged_locally_without_network() {
    let network = Arc::new(MockNetwork::new());
    let conv = converter(settings(Some("buysasta-21")), &network);

    let out = conv
        .convert("https://www.amazon.in/dp/B0X?tag=someone-21&th=1", Platform::Amazon)
        .await;
    assert_eq!(out.url, "https://www.amazon.in/dp/B0X?th=1&tag=buysasta-21");
    assert_eq!(out.method, ConversionMethod::LocalTag);
    assert_eq!(network.calls(), 0);
}
