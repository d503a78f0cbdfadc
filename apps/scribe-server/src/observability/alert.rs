//! Critical error alerting layer for tracing.
//!
//! Severe events (store subscription failures, rejected configuration, internal
//! errors) are copied to an out-of-band channel such as a chat webhook.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert message containing error details.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub service: String,
    pub level: Level,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    /// One-paragraph text rendering shared by all senders.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "[{}] {} in {}: {}",
            self.service, self.level, self.target, self.message
        );
        for (name, value) in &self.fields {
            let _ = write!(text, "\n  {} = {}", name, value);
        }
        let _ = write!(text, "\n  at {}", self.timestamp.to_rfc3339());
        text
    }
}

/// Configuration for the alert layer.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub service_name: String,
    /// Least severe level that still raises an alert.
    pub min_level: Level,
    /// Alerts queued beyond this are dropped.
    pub buffer_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            service_name: "scribe-server".to_string(),
            min_level: Level::ERROR,
            buffer_size: 100,
        }
    }
}

/// Delivery backend for alerts.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr, for development.
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("\nALERT {}\n", alert.summary());
        Ok(())
    }
}

/// Posts alerts to a chat webhook (Slack, Discord, ...).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({ "text": alert.summary() });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AlertError::SendError(format!(
                "webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Tracing layer that queues an alert for every sufficiently severe event.
pub struct AlertLayer {
    config: AlertConfig,
    sender: mpsc::Sender<AlertMessage>,
}

impl AlertLayer {
    /// Create the layer and spawn its dispatcher task.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                // Not traced: an error event here would raise another alert
                if let Err(e) = alert_sender.send(alert).await {
                    eprintln!("{}", e);
                }
            }
        });

        Self { config, sender: tx }
    }

    pub fn console(config: AlertConfig) -> Self {
        Self::new(Arc::new(ConsoleAlertSender), config)
    }

    pub fn webhook(url: String, config: AlertConfig) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), config)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        // Lower levels are the more severe ones
        if level > self.config.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            service: self.config.service_name.clone(),
            level,
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Never block the logging call site
        let _ = self.sender.try_send(alert);
    }
}
