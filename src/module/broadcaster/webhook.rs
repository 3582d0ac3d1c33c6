use crate::domain::Task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SENDER_NAME: &str = "Broadcaster Bot";
const EMBED_COLOR: u32 = 3066993;
const FOOTER: &str = "Task events → Webhook Broadcaster";

/// Reasons why a webhook message could not be delivered
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP client could not be constructed
    #[error("unable to build HTTP client")]
    Client(#[source] reqwest::Error),
    /// Request failed or was answered with a non-success status
    #[error("webhook request failed")]
    Request(#[from] reqwest::Error),
}

/// Single named value displayed in an [`Embed`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbedField {
    /// Label of the value
    pub name: String,
    /// Displayed value
    pub value: String,
    /// Whether the field is rendered next to its siblings
    pub inline: bool,
}

/// Footer line of an [`Embed`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbedFooter {
    /// Footer text
    pub text: String,
}

/// Titled panel attached to a [`WebhookMessage`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Embed {
    /// Headline
    pub title: String,
    /// Colour marker as a decimal RGB value
    pub color: u32,
    /// Point in time the panel refers to
    pub timestamp: DateTime<Utc>,
    /// Named values
    pub fields: Vec<EmbedField>,
    /// Footer line
    pub footer: EmbedFooter,
}

/// Payload of a chat webhook call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookMessage {
    /// Displayed sender name
    pub username: String,
    /// Plain text content
    pub content: String,
    /// Attached panels
    pub embeds: Vec<Embed>,
}

impl WebhookMessage {
    /// Message describing a task event
    pub fn for_task(label: &str, task: &Task, timestamp: DateTime<Utc>) -> Self {
        let field = |name: &str, value: String| EmbedField {
            name: name.to_owned(),
            value,
            inline: true,
        };

        Self {
            username: SENDER_NAME.to_owned(),
            content: String::new(),
            embeds: vec![Embed {
                title: label.to_owned(),
                color: EMBED_COLOR,
                timestamp,
                fields: vec![
                    field("ID", task.id.to_string()),
                    field("Task", task.description.clone()),
                    field("Done", task.done.to_string()),
                ],
                footer: EmbedFooter {
                    text: FOOTER.to_owned(),
                },
            }],
        }
    }
}

/// Outbound channel for [`WebhookMessages`](WebhookMessage)
#[async_trait]
pub trait WebhookClient {
    /// Delivers a message exactly once without retrying
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError>;
}

/// [`WebhookClient`] posting JSON to a fixed URL
pub struct HttpWebhookClient {
    client: Client,
    url: String,
}

impl HttpWebhookClient {
    /// Creates a new client for the given webhook URL
    pub fn new(url: String) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        self.client
            .post(&self.url)
            .json(message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
