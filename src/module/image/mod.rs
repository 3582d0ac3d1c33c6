//! Serves a periodically refreshed image fetched from an external source

mod cache;
mod clock;
mod options;
mod server;
mod source;

use crate::harness::{Heart, Module};
use crate::library::scheduling::JobScheduler;
use crate::library::{BoxedError, EmptyResult};
use crate::schedule;
use async_trait::async_trait;
use cache::ArtifactCache;
use clock::SystemClock;
use server::ServerJob;
use source::HttpArtifactSource;
use tracing::info;

pub use options::Options;

/// Module implementation
pub struct Image {
    options: Options,
}

impl Image {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Image {
    async fn pre_startup(&mut self) -> EmptyResult {
        tokio::fs::create_dir_all(&self.options.image_dir).await?;
        info!(directory = %self.options.image_dir.display(), "Image directory ready");

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let source = HttpArtifactSource::new(self.options.image_url.clone())?;
        let ttl = self.options.cache_duration();

        info!(url = source.url(), %ttl, "Caching image");

        let cache = ArtifactCache::new(
            source,
            SystemClock,
            self.options.image_dir.clone(),
            self.options.cached_image_name.clone(),
            ttl,
        );

        let (heart, stone) = Heart::new();
        let server_job = ServerJob::new(
            self.options.server.port,
            self.options.server.cors(),
            cache,
            self.options.image_dir.clone(),
            stone,
        );

        info!(port = self.options.server.port, "Starting image service");
        schedule!(scheduler, { server_job });

        Ok(Some(heart))
    }
}
