use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.132 Safari/537.36";

/// Reasons why no article could be picked
#[derive(Debug, Error)]
pub enum ArticleError {
    /// No source URL has been configured
    #[error("RANDOM_ARTICLE_URL is not set")]
    NotConfigured,
    /// HTTP client could not be constructed
    #[error("unable to build HTTP client")]
    Client(#[source] reqwest::Error),
    /// Request did not complete
    #[error("request for random article failed")]
    Request(#[from] reqwest::Error),
    /// Source answered with something other than 200
    #[error("Failed to fetch random article")]
    Status(StatusCode),
    /// Source did not redirect to an article
    #[error("Cannot read the same article twice")]
    SameArticle,
}

/// Picks a random article to read
#[async_trait]
pub trait ArticleSource {
    /// URL of a randomly chosen article
    async fn random_article(&self) -> Result<String, ArticleError>;
}

/// [`ArticleSource`] following the redirect of a "random article" endpoint
pub struct HttpArticleSource {
    client: Client,
    url: Option<String>,
}

impl HttpArticleSource {
    /// Creates a new source for the given endpoint, `None` makes every pick fail
    pub fn new(url: Option<String>) -> Result<Self, ArticleError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ArticleError::Client)?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl ArticleSource for HttpArticleSource {
    #[instrument(skip(self))]
    async fn random_article(&self) -> Result<String, ArticleError> {
        let url = self.url.as_deref().ok_or(ArticleError::NotConfigured)?;
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), url, "Failed to fetch random article");
            return Err(ArticleError::Status(response.status()));
        }

        let article = response.url().to_string();

        if article == url {
            warn!(url, "Random article rejected, no redirect took place");
            return Err(ArticleError::SameArticle);
        }

        info!(%article, "Picked random article");

        Ok(article)
    }
}
