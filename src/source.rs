use crate::disruption::Disruption;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("alert request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("alert endpoint answered with HTTP {0}")]
    Status(u16),
}

/// Provider of the current list of disruptions.
pub trait AlertSource: Send + Sync + 'static {
    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<Disruption>, SourceError>> + Send;
}

/// Simulated feed: random alerts after a fixed latency.
pub struct MockAlertSource {
    latency: Duration,
}

impl MockAlertSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn alerts_for_draw(r: f64) -> Vec<Disruption> {
        let mut alerts = Vec::new();
        if r > 0.7 {
            alerts.push(Disruption {
                kind: "Delay".to_string(),
                estimated_duration: 5,
                alternatives: vec!["Take a bus".to_string()],
                affected_lines: vec!["Metro A".to_string()],
            });
        }
        if r > 0.9 {
            alerts.push(Disruption {
                kind: "Closure".to_string(),
                estimated_duration: 60,
                alternatives: vec!["Use integrated bus route".to_string()],
                affected_lines: vec!["Metro B".to_string()],
            });
        }
        alerts
    }
}

impl AlertSource for MockAlertSource {
    async fn fetch_alerts(&self) -> Result<Vec<Disruption>, SourceError> {
        tokio::time::sleep(self.latency).await;
        let r: f64 = rand::random();
        Ok(Self::alerts_for_draw(r))
    }
}

/// Fetches a JSON array of disruptions from a remote endpoint.
pub struct HttpAlertSource {
    client: reqwest::Client,
    url: String,
}

impl HttpAlertSource {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

impl AlertSource for HttpAlertSource {
    async fn fetch_alerts(&self) -> Result<Vec<Disruption>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let alerts: Vec<Disruption> = response.json().await?;
        debug!(count = alerts.len(), url = %self.url, "fetched alerts");
        Ok(alerts)
    }
}

/// Source chosen at startup from configuration.
pub enum ConfiguredSource {
    Mock(MockAlertSource),
    Http(HttpAlertSource),
}

impl ConfiguredSource {
    pub fn from_url(url: Option<String>, mock_latency: Duration) -> Self {
        match url {
            Some(url) => ConfiguredSource::Http(HttpAlertSource::new(url)),
            None => ConfiguredSource::Mock(MockAlertSource::new(mock_latency)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConfiguredSource::Mock(_) => "mock".to_string(),
            ConfiguredSource::Http(s) => s.url.clone(),
        }
    }
}

impl AlertSource for ConfiguredSource {
    async fn fetch_alerts(&self) -> Result<Vec<Disruption>, SourceError> {
        match self {
            ConfiguredSource::Mock(s) => s.fetch_alerts().await,
            ConfiguredSource::Http(s) => s.fetch_alerts().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::Filter;
    use warp::http::StatusCode;

    /// Serves a fixed body and status on an ephemeral port.
    fn serve(status: StatusCode, body: &'static str) -> String {
        let route = warp::path!("alerts").map(move || {
            warp::reply::with_status(
                warp::reply::with_header(body, "content-type", "application/json"),
                status,
            )
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}/alerts", addr)
    }

    #[tokio::test]
    async fn test_http_source_decodes_feed() {
        let url = serve(
            StatusCode::OK,
            r#"[{"type":"Delay","estimatedDuration":5,"alternatives":["Take a bus"],"affectedLines":["Metro A"]}]"#,
        );
        let alerts = HttpAlertSource::new(url).fetch_alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].affected_lines, vec!["Metro A".to_string()]);
    }

    #[tokio::test]
    async fn test_http_source_reports_bad_status() {
        let url = serve(StatusCode::SERVICE_UNAVAILABLE, "[]");
        let err = HttpAlertSource::new(url).fetch_alerts().await.unwrap_err();
        assert!(matches!(err, SourceError::Status(503)));
    }

    #[tokio::test]
    async fn test_http_source_rejects_malformed_body() {
        let url = serve(StatusCode::OK, "{\"not\": \"a list\"}");
        let err = HttpAlertSource::new(url).fetch_alerts().await.unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)));
    }

    #[test]
    fn test_mock_thresholds() {
        assert!(MockAlertSource::alerts_for_draw(0.5).is_empty());
        assert!(MockAlertSource::alerts_for_draw(0.7).is_empty());

        let one = MockAlertSource::alerts_for_draw(0.8);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].kind, "Delay");

        let two = MockAlertSource::alerts_for_draw(0.95);
        assert_eq!(two.len(), 2);
        assert_eq!(two[1].kind, "Closure");
        assert_eq!(two[1].estimated_duration, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_waits_for_latency() {
        let source = MockAlertSource::new(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        let alerts = source.fetch_alerts().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(alerts.len() <= 2);
    }

    #[test]
    fn test_configured_source_selection() {
        let mock = ConfiguredSource::from_url(None, Duration::from_millis(1));
        assert_eq!(mock.describe(), "mock");
        let http = ConfiguredSource::from_url(
            Some("http://localhost:9/alerts".to_string()),
            Duration::from_millis(1),
        );
        assert_eq!(http.describe(), "http://localhost:9/alerts");
    }
}
