use std::time::Duration;

/// Emission service settings.
///
/// Status polling only reads the provider's status after an asynchronous
/// answer (`processando_autorizacao`); it never resubmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionServiceConfig {
    /// Status lookups after a "still processing" answer. 0 disables polling.
    pub status_poll_attempts: u32,
    pub status_poll_interval: Duration,
}

impl Default for EmissionServiceConfig {
    fn default() -> Self {
        Self {
            status_poll_attempts: 3,
            status_poll_interval: Duration::from_secs(2),
        }
    }
}

impl EmissionServiceConfig {
    pub fn with_status_poll_attempts(mut self, attempts: u32) -> Self {
        self.status_poll_attempts = attempts;
        self
    }

    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self
    }
}
