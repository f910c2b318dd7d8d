//! Shared utilities for component tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use microservice_template::config::{AppConfig, TlsConfig};
use microservice_template::lifecycle::{launch, Shutdown};

pub const USERNAME: &str = "user";
pub const PASSWORD: &str = "pass";

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Minimal valid configuration listening on `port`.
pub fn test_config(port: u16) -> AppConfig {
    let mut config = AppConfig::default();
    config.app.app_id = "microservice-template".into();
    config.app.environment = "test".into();
    config.endpoints.port = port;
    config.endpoints.ssl_port = free_port();
    config.example_basic_auth.username = USERNAME.into();
    config.example_basic_auth.password = PASSWORD.into();
    config
}

/// `test_config` serving HTTPS on `ssl_port` with the self-signed fixture pair.
pub fn test_tls_config(port: u16) -> AppConfig {
    let mut config = test_config(port);
    let fixtures = format!("{}/tests/fixtures/tls", env!("CARGO_MANIFEST_DIR"));
    config.endpoints.use_ssl = true;
    config.endpoints.tls = Some(TlsConfig {
        cert_path: format!("{}/cert.pem", fixtures),
        key_path: format!("{}/key.pem", fixtures),
    });
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Client that accepts the self-signed fixture certificate.
pub fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap()
}

/// A launched service.
pub struct RunningService {
    pub base_url: String,
    pub shutdown: Shutdown,
    pub task: JoinHandle<anyhow::Result<()>>,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Trigger shutdown and wait for `launch` to return.
    pub async fn stop(self) -> anyhow::Result<()> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("service did not stop in time")
            .expect("service task panicked")
    }
}

/// Launch the full service and wait until `/healthcheck` answers.
pub async fn start_service(config: AppConfig) -> RunningService {
    let (base_url, client) = if config.endpoints.use_ssl {
        (format!("https://127.0.0.1:{}", config.endpoints.ssl_port), tls_client())
    } else {
        (format!("http://127.0.0.1:{}", config.endpoints.port), client())
    };
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();
    let task = tokio::spawn(async move { launch(config, &handle).await });

    for _ in 0..100 {
        if let Ok(response) = client.get(format!("{}/healthcheck", base_url)).send().await {
            if response.status().is_success() {
                return RunningService {
                    base_url,
                    shutdown,
                    task,
                };
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("service on {} did not become healthy", base_url);
}

/// Start a simple mock backend that returns a fixed response.
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    start_programmable_backend(addr, move || async move { (200, response.to_string()) }).await;
}

/// Start a programmable mock backend. `f` runs once per connection and
/// decides the status and body.
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = std::sync::Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a backend that reads one request per connection and holds the
/// response for `delay`. Each connection reports `"completed"` if the response
/// was sent, or `"abandoned"` if the caller hung up first.
pub async fn start_stalling_backend(delay: Duration) -> (u16, mpsc::UnboundedReceiver<&'static str>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (outcomes, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let outcome = tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}";
                        let _ = socket.write_all(response.as_bytes()).await;
                        "completed"
                    }
                    read = socket.read(&mut buf) => match read {
                        Ok(0) | Err(_) => "abandoned",
                        Ok(_) => "unexpected data",
                    },
                };
                let _ = outcomes.send(outcome);
            });
        }
    });

    (port, rx)
}
