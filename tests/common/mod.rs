use catalog_operator::config::{ControllerConfig, OperatorConfig};
use std::future::Future;
use std::time::Duration;

/// Defaults with short backoff so failing reconciles retry quickly.
pub fn test_config() -> OperatorConfig {
    let controller = ControllerConfig {
        max_concurrent_reconciles: 4,
        backoff_base_ms: 10,
        backoff_max_ms: 200,
    };
    OperatorConfig {
        item_controller: controller.clone(),
        store_controller: controller,
        ..OperatorConfig::default()
    }
}

/// Polls `check` until it yields a value, panicking after five seconds.
pub async fn wait_for<T, F, Fut>(what: &str, mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(value) = check().await {
            return value;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("Timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
