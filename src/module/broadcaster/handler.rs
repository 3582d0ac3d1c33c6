use super::webhook::{WebhookClient, WebhookMessage};
use crate::domain::{DeliveryMode, Task};
use crate::library::EmptyResult;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Shared handler instance chosen once at startup
pub type SharedEventHandler = Arc<dyn EventHandler + Send + Sync>;

/// Settings which are missing or invalid for the selected mode
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Forward mode requires a destination
    #[error("WEBHOOK_URL is required in forward mode")]
    MissingWebhookUrl,
}

/// Reacts to a single task event
#[async_trait]
pub trait EventHandler {
    /// Processes the event with the given label, e.g. `Task Created`
    async fn handle(&self, label: &str, task: &Task) -> EmptyResult;
}

/// Handler that only writes events to the log
pub struct LogOnlyHandler;

#[async_trait]
impl EventHandler for LogOnlyHandler {
    async fn handle(&self, label: &str, task: &Task) -> EmptyResult {
        info!(
            event = label,
            id = %task.id,
            description = %task.description,
            done = task.done,
            "Received task event"
        );

        Ok(())
    }
}

/// Handler that forwards every event to a webhook
pub struct ForwardHandler<W> {
    webhook: W,
}

impl<W: WebhookClient> ForwardHandler<W> {
    /// Creates a new handler delivering through the given client
    pub fn new(webhook: W) -> Self {
        Self { webhook }
    }
}

#[async_trait]
impl<W> EventHandler for ForwardHandler<W>
where
    W: WebhookClient + Send + Sync,
{
    async fn handle(&self, label: &str, task: &Task) -> EmptyResult {
        let message = WebhookMessage::for_task(label, task, Utc::now());
        self.webhook.deliver(&message).await?;

        info!(event = label, id = %task.id, "Forwarded task event");

        Ok(())
    }
}

/// Picks the handler matching a delivery mode
///
/// The webhook is only used in [`DeliveryMode::Forward`] where it is mandatory.
pub fn select_handler<W>(
    mode: DeliveryMode,
    webhook: Option<W>,
) -> Result<SharedEventHandler, ConfigurationError>
where
    W: WebhookClient + Send + Sync + 'static,
{
    match mode {
        DeliveryMode::LogOnly => Ok(Arc::new(LogOnlyHandler)),
        DeliveryMode::Forward => {
            let webhook = webhook.ok_or(ConfigurationError::MissingWebhookUrl)?;
            Ok(Arc::new(ForwardHandler::new(webhook)))
        }
    }
}
