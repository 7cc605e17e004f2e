use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;
use crate::types::{PipelineStatus, StatsSnapshot, StatusValue};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SIMULATED_RUN: Duration = Duration::from_millis(2000);

/// Acknowledgement returned when a pipeline run is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAck {
    #[serde(default)]
    pub run_id: Option<String>,
}

/// The pipeline API the dashboard reads from and triggers runs on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_stats(&self) -> Result<StatsSnapshot, FetchError>;
    async fn get_pipeline_status(&self) -> Result<PipelineStatus, FetchError>;
    async fn run_pipeline(&self) -> Result<RunAck, FetchError>;
}

/// Builds the HTTP backend when an API URL is configured, the mock otherwise.
pub fn build_backend(api_url: Option<&str>) -> Result<Arc<dyn Backend>, FetchError> {
    match api_url {
        Some(url) => Ok(Arc::new(HttpBackend::new(url, REQUEST_TIMEOUT)?)),
        None => Ok(Arc::new(MockBackend::new())),
    }
}

/// Hard-coded numbers standing in for a live API.
pub struct MockBackend {
    run_delay: Duration,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_run_delay(SIMULATED_RUN)
    }

    pub fn with_run_delay(run_delay: Duration) -> Self {
        Self { run_delay }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn get_stats(&self) -> Result<StatsSnapshot, FetchError> {
        Ok(StatsSnapshot {
            total_runs: 156,
            total_messages: 12847,
            total_images: 3456,
            data_quality: 98.5,
        })
    }

    async fn get_pipeline_status(&self) -> Result<PipelineStatus, FetchError> {
        let steps = [
            ("scraper", StatusValue::Success),
            ("loader", StatusValue::Success),
            ("transform", StatusValue::Running),
            ("enrich", StatusValue::Pending),
        ];
        Ok(PipelineStatus {
            overall: StatusValue::Running,
            steps: steps
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        })
    }

    async fn run_pipeline(&self) -> Result<RunAck, FetchError> {
        tokio::time::sleep(self.run_delay).await;
        Ok(RunAck::default())
    }
}

/// REST client for the pipeline API.
pub struct HttpBackend {
    client: Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = base.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: base.clone(),
                source,
            })?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|source| FetchError::Decode { url, source })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_stats(&self) -> Result<StatsSnapshot, FetchError> {
        self.get_json("/stats").await
    }

    async fn get_pipeline_status(&self) -> Result<PipelineStatus, FetchError> {
        self.get_json("/pipeline/status").await
    }

    async fn run_pipeline(&self) -> Result<RunAck, FetchError> {
        let url = self.url("/pipeline/run");
        debug!(%url, "POST");
        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }
        // An empty or non-JSON body still counts as accepted.
        Ok(resp.json::<RunAck>().await.unwrap_or_default())
    }
}


#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Answers a single request with `response` and returns the base URL.
    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while let Ok(n) = stream.read(&mut buf) {
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/api", addr)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn backend_for(response: String) -> HttpBackend {
        HttpBackend::new(&serve_once(response), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn mock_backend_serves_fixed_numbers() {
        let backend = MockBackend::with_run_delay(Duration::ZERO);
        let stats = backend.get_stats().await.unwrap();
        assert_eq!(stats.total_runs, 156);
        assert_eq!(stats.total_messages, 12847);
        assert_eq!(stats.total_images, 3456);
        assert_eq!(stats.data_quality, 98.5);

        let status = backend.get_pipeline_status().await.unwrap();
        assert_eq!(status.overall, StatusValue::Running);
        assert_eq!(status.steps["transform"], StatusValue::Running);
        assert_eq!(status.steps["enrich"], StatusValue::Pending);

        assert_eq!(backend.run_pipeline().await.unwrap(), RunAck::default());
    }

    #[test]
    fn http_backend_joins_paths_onto_base() {
        let backend = HttpBackend::new("http://localhost:8000/api/", REQUEST_TIMEOUT).unwrap();
        assert_eq!(backend.url("/stats"), "http://localhost:8000/api/stats");
        assert_eq!(
            backend.url("/pipeline/status"),
            "http://localhost:8000/api/pipeline/status"
        );
    }

    #[tokio::test]
    async fn stats_decode_from_camel_case_json() {
        let body = r#"{"totalRuns":7,"totalMessages":1200,"totalImages":45,"dataQuality":91.25}"#;
        let backend = backend_for(http_response("200 OK", body));
        let stats = backend.get_stats().await.unwrap();
        assert_eq!(
            stats,
            StatsSnapshot {
                total_runs: 7,
                total_messages: 1200,
                total_images: 45,
                data_quality: 91.25,
            }
        );
    }

    #[tokio::test]
    async fn pipeline_status_decodes_with_unknown_values() {
        let body = r#"{"overall":"failed","steps":{"scraper":"success","loader":"queued"}}"#;
        let backend = backend_for(http_response("200 OK", body));
        let status = backend.get_pipeline_status().await.unwrap();
        assert_eq!(status.overall, StatusValue::Failed);
        assert_eq!(status.steps["scraper"], StatusValue::Success);
        assert_eq!(status.steps["loader"], StatusValue::Other("queued".into()));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let backend = backend_for(http_response("500 Internal Server Error", "{}"));
        let err = backend.get_stats().await.unwrap_err();
        match err {
            FetchError::Status { url, status } => {
                assert_eq!(status, 500);
                assert!(url.ends_with("/api/stats"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let backend = backend_for(http_response("200 OK", "not json"));
        let err = backend.get_pipeline_status().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn run_accepts_an_empty_body() {
        let backend = backend_for(http_response("202 Accepted", ""));
        assert_eq!(backend.run_pipeline().await.unwrap(), RunAck::default());
    }

    #[tokio::test]
    async fn run_reads_the_run_id() {
        let backend = backend_for(http_response("200 OK", r#"{"run_id":"run-42"}"#));
        let ack = backend.run_pipeline().await.unwrap();
        assert_eq!(ack.run_id.as_deref(), Some("run-42"));
    }

    #[tokio::test]
    async fn rejected_run_is_a_status_error() {
        let backend = backend_for(http_response("409 Conflict", ""));
        let err = backend.run_pipeline().await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 409, .. }));
    }

    #[tokio::test]
    async fn closed_port_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = HttpBackend::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = backend.get_stats().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
