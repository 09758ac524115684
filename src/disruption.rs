use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const ERROR_KIND: &str = "Error";
pub const SYSTEM_WIDE: &str = "All";

/// A reported service-affecting event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disruption {
    #[serde(rename = "type")]
    pub kind: String,
    /// Minutes. 0 means unknown.
    pub estimated_duration: u32,
    #[serde(default)]
    pub alternatives: Vec<String>,
    pub affected_lines: Vec<String>,
}

impl Disruption {
    /// Placeholder stored in place of the alert list when a fetch fails.
    pub fn fetch_failed(operator: &str) -> Self {
        Self {
            kind: ERROR_KIND.to_string(),
            estimated_duration: 0,
            alternatives: vec![format!("Check the {} official channels.", operator)],
            affected_lines: vec![SYSTEM_WIDE.to_string()],
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ERROR_KIND
    }

    pub fn title(&self) -> String {
        format!("{} on {}", self.kind, self.affected_lines.join(", "))
    }

    pub fn description(&self) -> String {
        let mut text = String::new();
        if self.estimated_duration > 0 {
            text.push_str(&format!(
                "Estimated duration: {} minutes. ",
                self.estimated_duration
            ));
        }
        text.push_str("Alternatives: ");
        text.push_str(&self.alternatives.join(", "));
        text
    }
}

/// Latest result of the alert poller.
#[derive(Clone, Debug, PartialEq)]
pub enum AlertSnapshot {
    /// No poll cycle has completed yet.
    Loading,
    Ready {
        alerts: Vec<Disruption>,
        fetched_at: DateTime<Utc>,
        /// `alerts` holds the synthetic error record.
        failed: bool,
    },
}

impl AlertSnapshot {
    pub fn alerts(&self) -> &[Disruption] {
        match self {
            AlertSnapshot::Loading => &[],
            AlertSnapshot::Ready { alerts, .. } => alerts,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    Loading,
    Normal,
    Alerts,
    Error,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCard {
    pub title: String,
    pub description: String,
    pub is_error: bool,
    pub disruption: Disruption,
}

/// What the alert panel shows for one snapshot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPanel {
    pub status: PanelStatus,
    pub headline: Option<String>,
    pub message: Option<String>,
    pub alerts: Vec<AlertCard>,
    pub last_updated: Option<String>,
}

impl AlertPanel {
    pub fn render(snapshot: &AlertSnapshot, operator: &str, tz: Tz) -> Self {
        let (alerts, fetched_at, failed) = match snapshot {
            AlertSnapshot::Loading => {
                return Self {
                    status: PanelStatus::Loading,
                    headline: None,
                    message: None,
                    alerts: Vec::new(),
                    last_updated: None,
                };
            }
            AlertSnapshot::Ready {
                alerts,
                fetched_at,
                failed,
            } => (alerts, fetched_at, *failed),
        };

        let last_updated = Some(
            fetched_at
                .with_timezone(&tz)
                .format("%H:%M:%S")
                .to_string(),
        );

        if alerts.is_empty() {
            return Self {
                status: PanelStatus::Normal,
                headline: Some("No alerts at this time.".to_string()),
                message: Some(format!("The {} is operating normally.", operator)),
                alerts: Vec::new(),
                last_updated,
            };
        }

        let cards = alerts
            .iter()
            .map(|d| AlertCard {
                title: d.title(),
                description: d.description(),
                is_error: d.is_error(),
                disruption: d.clone(),
            })
            .collect();

        Self {
            status: if failed {
                PanelStatus::Error
            } else {
                PanelStatus::Alerts
            },
            headline: None,
            message: None,
            alerts: cards,
            last_updated,
        }
    }
}
