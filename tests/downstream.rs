mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    client, free_port, start_programmable_backend, start_service, start_stalling_backend, test_config,
    test_tls_config, tls_client,
};
use microservice_template::components::ComponentAssembly;
use microservice_template::downstream::{DownstreamFirstChunk, DownstreamTarget};
use microservice_template::endpoint::{EndpointBinding, ExecutionContext, ProxyRouterEndpoint, RequestInfo};
use microservice_template::error::EndpointError;
use microservice_template::routing::{Matcher, RouteError};
use microservice_template::validation::NoContent;
use microservice_template::{HttpServer, Shutdown};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_async_downstream_call_marks_payload() {
    let service = start_service(test_config(free_port())).await;

    let response = client()
        .get(service.url("/exampleDownstreamHttpAsync"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["viaAsyncHttpClient"], "true");
    assert!(body["input_val_1"].as_str().unwrap().starts_with("some-val1-"));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_async_downstream_post_forwards_body() {
    let service = start_service(test_config(free_port())).await;

    let response = client()
        .post(service.url("/exampleDownstreamHttpAsync"))
        .json(&json!({ "input_val_1": "a", "input_val_2": "b" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["input_val_1"], "a");
    assert_eq!(body["viaAsyncHttpClient"], "true");

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_proxy_streams_example_response() {
    let service = start_service(test_config(free_port())).await;
    let client = client();

    let response = client.get(service.url("/exampleProxy")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["input_val_2"].as_str().unwrap().starts_with("some-val2-"));

    let response = client
        .post(service.url("/exampleProxy"))
        .json(&json!({ "input_val_1": "x", "input_val_2": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["input_val_2"], "y");

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_tls_mode_serves_and_calls_itself_over_https() {
    let config = test_tls_config(free_port());
    let ssl_port = config.endpoints.ssl_port;
    let service = start_service(config).await;
    assert_eq!(service.base_url, format!("https://127.0.0.1:{}", ssl_port));
    let client = tls_client();

    let response = client
        .get(service.url("/exampleDownstreamHttpAsync"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["viaAsyncHttpClient"], "true");
    assert!(body["input_val_1"].as_str().unwrap().starts_with("some-val1-"));

    let response = client.get(service.url("/exampleProxy")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["input_val_2"].as_str().unwrap().starts_with("some-val2-"));

    let response = client
        .post(service.url("/exampleProxy"))
        .json(&json!({ "input_val_1": "x", "input_val_2": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["input_val_1"], "x");

    service.stop().await.unwrap();
}

/// Proxies `path` to a fixed target.
struct FixedProxy {
    path: &'static str,
    target: DownstreamTarget,
}

#[async_trait]
impl ProxyRouterEndpoint for FixedProxy {
    fn name(&self) -> &'static str {
        self.path
    }

    fn matcher(&self) -> Result<Matcher, RouteError> {
        Matcher::match_all_methods(self.path)
    }

    async fn first_chunk(
        &self,
        request: &RequestInfo<NoContent>,
        _ctx: &ExecutionContext,
    ) -> Result<DownstreamFirstChunk, EndpointError> {
        Ok(DownstreamFirstChunk::from_inbound(request, self.target.clone()))
    }
}

fn target(port: u16) -> DownstreamTarget {
    DownstreamTarget {
        host: "127.0.0.1".into(),
        port,
        https: false,
        path: "/".into(),
    }
}

async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["errors"][0]["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_downstream_failures_map_to_error_contract() {
    let failing_port = free_port();
    let failing_addr: SocketAddr = format!("127.0.0.1:{}", failing_port).parse().unwrap();
    start_programmable_backend(failing_addr, || async { (502, "upstream broke".to_string()) }).await;
    let dead_port = free_port();

    let snapshot = ComponentAssembly::new(test_config(free_port()))
        .with_endpoint(
            EndpointBinding::proxy(FixedProxy {
                path: "/failingProxy",
                target: target(failing_port),
            })
            .unwrap(),
        )
        .with_endpoint(
            EndpointBinding::proxy(FixedProxy {
                path: "/deadProxy",
                target: target(dead_port),
            })
            .unwrap(),
        )
        .resolve()
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = tokio::spawn(HttpServer::new(Arc::new(snapshot)).run(listener, shutdown.subscribe()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = client();

    let response = client.get(format!("http://{}/failingProxy", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["code"], "20");
    assert_eq!(body["errors"][0]["metadata"]["downstream_status"], 502);
    assert!(!body.to_string().contains("upstream broke"));

    let response = client.get(format!("http://{}/deadProxy", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(response).await, "50");

    shutdown.trigger();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_client_disconnect_abandons_downstream_call() {
    let (backend_port, mut outcomes) = start_stalling_backend(Duration::from_secs(5)).await;

    let snapshot = ComponentAssembly::new(test_config(free_port()))
        .with_endpoint(
            EndpointBinding::proxy(FixedProxy {
                path: "/stallingProxy",
                target: target(backend_port),
            })
            .unwrap(),
        )
        .resolve()
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = tokio::spawn(HttpServer::new(Arc::new(snapshot)).run(listener, shutdown.subscribe()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = client()
        .get(format!("http://{}/stallingProxy", addr))
        .timeout(Duration::from_millis(300))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let outcome = tokio::time::timeout(Duration::from_secs(3), outcomes.recv())
        .await
        .expect("backend never saw the call end");
    assert_eq!(outcome, Some("abandoned"));

    shutdown.trigger();
    server.await.unwrap().unwrap();
}
