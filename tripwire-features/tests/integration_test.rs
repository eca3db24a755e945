//! Integration tests for tripwire-features

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tripwire_features::*;
use tripwire_killswitch::{EnvKillswitch, MemoryKillswitch, Poller};

const POLL: Duration = Duration::from_millis(5);

async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met before deadline"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

fn write_atomic(path: &Path, content: &str) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

fn checkout(registry: &FeatureRegistry) -> Feature {
    Feature::builder("checkout-v2")
        .matcher(Matcher::and([
            Matcher::exact_match("region", "eu"),
            Matcher::percentage("customerId", 25),
        ]))
        .killswitch_override(2)
        .registry(registry)
        .build()
}

#[test]
fn test_rollout_in_region() {
    let registry = FeatureRegistry::new();
    let feature = checkout(&registry);
    let base = Context::new().with_value("region", "eu");

    // cust-13 lands in bucket 9, cust-3 in bucket 94
    assert!(feature.enabled(&base.clone().with_value("customerId", "cust-13")));
    assert!(!feature.enabled(&base.clone().with_value("customerId", "cust-3")));

    // Outside the region nobody gets it
    let us = Context::new().with_value("region", "us");
    assert!(!feature.enabled(&us.with_value("customerId", "cust-13")));
}

#[test]
fn test_rollout_share_is_stable() {
    let registry = FeatureRegistry::new();
    let feature = checkout(&registry);
    let base = Context::new().with_value("region", "eu");

    let first: Vec<bool> = (0..100)
        .map(|i| feature.enabled(&base.clone().with_value("customerId", format!("cust-{i}"))))
        .collect();
    let second: Vec<bool> = (0..100)
        .map(|i| feature.enabled(&base.clone().with_value("customerId", format!("cust-{i}"))))
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_file_killswitch_disables_and_restores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("killswitch");
    write_atomic(&path, "");

    let registry = FeatureRegistry::new();
    let feature = checkout(&registry);

    let poller = Poller::file(path.to_string_lossy(), POLL).unwrap();
    let handle = poller.start(CancellationToken::new()).await.unwrap();

    let ctx = Context::new()
        .with_killswitch(poller.clone())
        .with_value("region", "eu")
        .with_value("customerId", "cust-13");
    assert!(feature.enabled(&ctx));

    // Below the feature's override level: still enabled
    write_atomic(&path, "checkout-v2=1\n");
    eventually(|| poller.get("checkout-v2") == Some(1)).await;
    assert!(feature.enabled(&ctx));

    // Unlevelled records always win
    write_atomic(&path, "checkout-v2\n");
    eventually(|| !feature.enabled(&ctx)).await;

    // Even forced-on features are killed
    assert!(!feature.enabled(&ctx.clone().with_override(&feature, true)));

    write_atomic(&path, "something-else\n");
    eventually(|| feature.enabled(&ctx)).await;

    handle.shutdown().await;
}

#[test]
fn test_environment_list_killswitch() {
    let registry = FeatureRegistry::new();
    let feature = Feature::builder("env-listed")
        .matcher(Matcher::exact_match("test-key", "test-value"))
        .registry(&registry)
        .build();
    let bystander = Feature::builder("env-bystander")
        .matcher(Matcher::exact_match("test-key", "test-value"))
        .registry(&registry)
        .build();

    let ctx = Context::new()
        .with_value("test-key", "test-value")
        .with_killswitch(EnvKillswitch::from_list(
            "someotherfeature,Env-Listed,anotherfeature",
        ));

    assert!(!feature.enabled(&ctx));
    assert!(bystander.enabled(&ctx));
}

#[test]
fn test_observer_logs_decisions() {
    let registry = FeatureRegistry::new();
    let feature = checkout(&registry);
    let other = Feature::builder("search-rerank")
        .registry(&registry)
        .build();

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let base = Context::new()
        .with_value("region", "eu")
        .with_observer(move |ctx, name, enabled| {
            let customer = ctx.value("customerid").unwrap_or_default().to_string();
            sink.lock().push(format!("{name}:{customer}:{enabled}"));
        });

    feature.enabled(&base.clone().with_value("customerId", "cust-13"));
    other.enabled(&base.clone().with_global_override(true));

    assert_eq!(
        *log.lock(),
        vec!["checkout-v2:cust-13:true", "search-rerank::true"]
    );
}

#[test]
fn test_concurrent_evaluation() {
    let registry = FeatureRegistry::new();
    let feature = Arc::new(checkout(&registry));
    let killswitch = Arc::new(MemoryKillswitch::new());
    let base = Context::new()
        .with_value("region", "eu")
        .with_killswitch(killswitch.clone());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let feature = feature.clone();
            let base = base.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    let id = format!("cust-{}", (t * 500 + i) % 100);
                    let expected = bucket(&id) < 25;
                    let ctx = base.clone().with_value("customerId", id);
                    let enabled = feature.enabled(&ctx);
                    // A concurrent kill can only turn things off
                    assert!(!enabled || expected);
                }
            })
        })
        .collect();

    killswitch.kill("checkout-v2");
    for handle in handles {
        handle.join().unwrap();
    }

    let ctx = base.with_value("customerId", "cust-13");
    assert!(!feature.enabled(&ctx));
}

#[test]
fn test_matchers_from_json() {
    let json = r#"[
        {"type": "and", "matchers": [
            {"type": "exact_match", "key": "Region", "value": "eu"},
            {"type": "percentage", "key": "customerId", "percent": 25}
        ]}
    ]"#;
    let matchers: Vec<Matcher> = serde_json::from_str(json).unwrap();

    let registry = FeatureRegistry::new();
    let feature = Feature::builder("from-json")
        .matchers(matchers)
        .registry(&registry)
        .build();

    let ctx = Context::new()
        .with_value("region", "eu")
        .with_value("customerid", "cust-13");
    assert!(feature.enabled(&ctx));
}
