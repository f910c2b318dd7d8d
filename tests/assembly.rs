mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{client, free_port, start_programmable_backend, start_service, test_config};
use reqwest::StatusCode;

#[tokio::test]
async fn test_registry_hooks_run_around_server_lifetime() {
    let registry_port = free_port();
    let registry_addr: SocketAddr = format!("127.0.0.1:{}", registry_port).parse().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    start_programmable_backend(registry_addr, move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, "{}".to_string())
        }
    })
    .await;

    let mut config = test_config(free_port());
    config.registry.disabled = false;
    config.registry.url = Some(format!("http://{}", registry_addr));

    let service = start_service(config).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "registration on startup");

    service.stop().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2, "deregistration on shutdown");
}

#[tokio::test]
async fn test_unreachable_registry_is_not_fatal() {
    let mut config = test_config(free_port());
    config.registry.disabled = false;
    config.registry.url = Some(format!("http://127.0.0.1:{}", free_port()));

    let service = start_service(config).await;
    let response = client().get(service.url("/example")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_prometheus_scrape_reflects_traffic() {
    let metrics_port = free_port();
    let mut config = test_config(free_port());
    config.metrics.prometheus_reporting_enabled = true;
    config.metrics.prometheus_address = format!("127.0.0.1:{}", metrics_port);

    let service = start_service(config).await;
    let client = client();
    client.get(service.url("/example")).send().await.unwrap();

    let scrape = client
        .get(format!("http://127.0.0.1:{}/metrics", metrics_port))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(scrape.contains("requests_total"));
    assert!(scrape.contains("example_get"));
    assert!(scrape.contains("server_routes"));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_fails_launch() {
    let mut config = test_config(free_port());
    config.app.app_id.clear();

    let shutdown = microservice_template::Shutdown::new();
    let err = microservice_template::lifecycle::launch(config, &shutdown)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("app.app_id"));
}
