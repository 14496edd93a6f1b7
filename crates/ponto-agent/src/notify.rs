//! Webhook delivery of invocation reports.
//!
//! The report is POSTed as JSON to a configured URL; whatever sits
//! behind it (chat bridge, mail gateway, dashboard) is the host's
//! business. Delivery failures are surfaced as errors but the
//! orchestrator only ever logs them.

use async_trait::async_trait;

use ponto_core::error::{PontoError, Result};
use ponto_core::traits::Notifier;
use ponto_core::types::InvocationReport;

/// Sends invocation reports to an HTTP webhook.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, report: &InvocationReport) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "date": report.date.to_string(),
                "state": report.state.to_string(),
                "attempted": report.attempted.map(|t| t.as_str()),
                "outcome": report.outcome.map(|o| o.as_str()),
                "reason": report.reason,
                "summary": report.to_string(),
                "schedule": report.schedule,
            }))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| PontoError::Action(format!("Webhook send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Report webhook delivered: {}", report.date);
            Ok(())
        } else {
            let status = resp.status();
            Err(PontoError::Action(format!("Webhook error {status}")))
        }
    }
}
