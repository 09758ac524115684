use crate::connectivity::SignalBus;
use crate::disruption::{AlertPanel, AlertSnapshot};
use crate::preferences::PreferenceStore;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the HTTP layer reads and writes.
pub struct AppState {
    pub preferences: PreferenceStore,

    // Read ends of the poller and connectivity monitor. The tasks behind
    // them are owned by main.
    pub alerts: watch::Receiver<AlertSnapshot>,
    pub online: watch::Receiver<bool>,

    pub signals: Arc<SignalBus>,

    pub operator_name: String,
    pub timezone: Tz,
}

impl AppState {
    pub fn alert_panel(&self) -> AlertPanel {
        AlertPanel::render(&self.alerts.borrow(), &self.operator_name, self.timezone)
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }
}
