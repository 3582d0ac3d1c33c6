use super::clock::Clock;
use super::source::{ArtifactSource, FetchError};
use crate::domain::ArtifactDescriptor;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Single-slot cache which keeps one externally fetched artifact on disk
///
/// The artifact is replaced once it is older than the configured TTL. Replacements are written
/// to a temporary file first and renamed over the slot, so readers never observe partial bytes
/// and a failed fetch leaves the previous artifact in place. Refreshes are serialized and callers
/// which waited for a refresh to finish are served the fresh artifact instead of fetching again.
pub struct ArtifactCache<S, C> {
    source: S,
    clock: C,
    directory: PathBuf,
    name: String,
    ttl: chrono::Duration,
    current: Mutex<Option<ArtifactDescriptor>>,
}

impl<S, C> ArtifactCache<S, C>
where
    S: ArtifactSource + Send + Sync,
    C: Clock + Send + Sync,
{
    /// Creates a new cache storing the artifact as `name` within `directory`
    pub fn new(
        source: S,
        clock: C,
        directory: PathBuf,
        name: String,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            source,
            clock,
            directory,
            name,
            ttl,
            current: Mutex::new(None),
        }
    }

    /// File name of the artifact within the cache directory
    pub fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self) -> PathBuf {
        self.directory.join(&self.name)
    }

    fn partial(&self) -> PathBuf {
        self.directory.join(format!(".{}.partial", self.name))
    }

    /// Returns the current artifact, fetching a new one if it is missing or expired
    #[instrument(skip(self), fields(name = %self.name))]
    pub async fn get_artifact(&self) -> Result<ArtifactDescriptor, FetchError> {
        let mut current = self.current.lock().await;
        let now = self.clock.now();

        let known = match current.as_ref() {
            Some(descriptor) => Some(descriptor.clone()),
            None => self.recover().await,
        };

        match known {
            Some(descriptor) if descriptor.is_fresh(now, self.ttl) => {
                let cache_age = now - descriptor.cached_at;
                info!(%cache_age, path = %descriptor.path.display(), "Serving cached artifact");

                *current = Some(descriptor.clone());
                return Ok(descriptor);
            }
            Some(descriptor) => {
                let cache_age = now - descriptor.cached_at;
                info!(
                    %cache_age,
                    path = %descriptor.path.display(),
                    "Cache expired, fetching new artifact"
                );
            }
            None => info!("No cached artifact found, fetching new artifact"),
        }

        let descriptor = self.refresh().await?;
        *current = Some(descriptor.clone());

        Ok(descriptor)
    }

    /// Descriptor of an artifact left behind by a previous process, stamped with its modification time
    async fn recover(&self) -> Option<ArtifactDescriptor> {
        let path = self.slot();
        let modified = fs::metadata(&path).await.ok()?.modified().ok()?;

        debug!(path = %path.display(), "Found artifact on disk");

        Some(ArtifactDescriptor::new(path, DateTime::<Utc>::from(modified)))
    }

    async fn refresh(&self) -> Result<ArtifactDescriptor, FetchError> {
        let slot = self.slot();
        let partial = self.partial();

        match self.download(&partial, &slot).await {
            Ok(size) => {
                let descriptor = ArtifactDescriptor::new(slot, self.clock.now());
                info!(
                    size,
                    path = %descriptor.path.display(),
                    saved_at = %descriptor.cached_at,
                    "Artifact downloaded and saved"
                );

                Ok(descriptor)
            }
            Err(error) => {
                warn!(%error, "Failed to refresh artifact, keeping the previous one");

                if let Err(error) = fs::remove_file(&partial).await {
                    debug!(%error, path = %partial.display(), "Unable to remove partial artifact");
                }

                Err(error)
            }
        }
    }

    async fn download(&self, partial: &Path, slot: &Path) -> Result<u64, FetchError> {
        let mut file = fs::File::create(partial).await?;
        let size = self.source.fetch_into(&mut file).await?;

        file.sync_all().await?;
        drop(file);

        fs::rename(partial, slot).await?;

        Ok(size)
    }
}

#[cfg(test)]
mod does {
    use super::super::clock::manual::ManualClock;
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as SyncMutex;
    use tempfile::TempDir;
    use tokio::io::{AsyncWrite, AsyncWriteExt};

    enum Reply {
        Body(&'static [u8]),
        Truncated(&'static [u8]),
        Unavailable,
    }

    #[derive(Default)]
    struct ScriptedSource {
        replies: SyncMutex<VecDeque<Reply>>,
        fetches: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: SyncMutex::new(replies.into()),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ArtifactSource for ScriptedSource {
        async fn fetch_into(
            &self,
            writer: &mut (dyn AsyncWrite + Unpin + Send),
        ) -> Result<u64, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);

            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Reply::Unavailable);

            match reply {
                Reply::Body(bytes) => {
                    writer.write_all(bytes).await?;
                    Ok(bytes.len() as u64)
                }
                Reply::Truncated(bytes) => {
                    writer.write_all(bytes).await?;
                    let error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "reset");
                    Err(error.into())
                }
                Reply::Unavailable => {
                    Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
                }
            }
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn cache(
        directory: &TempDir,
        replies: Vec<Reply>,
    ) -> (ArtifactCache<ScriptedSource, ManualClock>, ManualClock) {
        let clock = ManualClock::new(start());
        let cache = ArtifactCache::new(
            ScriptedSource::new(replies),
            clock.clone(),
            directory.path().to_path_buf(),
            "current.jpg".into(),
            Duration::minutes(10),
        );

        (cache, clock)
    }

    fn fetches(cache: &ArtifactCache<ScriptedSource, ManualClock>) -> usize {
        cache.source.fetches.load(Ordering::SeqCst)
    }

    async fn contents(directory: &TempDir) -> Vec<u8> {
        fs::read(directory.path().join("current.jpg")).await.unwrap()
    }

    #[tokio::test]
    async fn refresh_only_after_expiry() {
        let directory = TempDir::new().unwrap();
        let replies = vec![Reply::Body(b"first"), Reply::Body(b"second")];
        let (cache, clock) = cache(&directory, replies);

        let initial = cache.get_artifact().await.unwrap();
        assert_eq!(initial.cached_at, start());
        assert_eq!(initial.path, directory.path().join("current.jpg"));
        assert_eq!(fetches(&cache), 1);

        clock.advance(Duration::minutes(5));
        assert_eq!(cache.get_artifact().await.unwrap(), initial);
        assert_eq!(fetches(&cache), 1);
        assert_eq!(contents(&directory).await, b"first");

        clock.advance(Duration::minutes(15));
        let refreshed = cache.get_artifact().await.unwrap();
        assert_eq!(refreshed.cached_at, start() + Duration::minutes(20));
        assert_eq!(fetches(&cache), 2);
        assert_eq!(contents(&directory).await, b"second");
    }

    #[tokio::test]
    async fn keep_previous_artifact_on_failure() {
        let directory = TempDir::new().unwrap();
        let (cache, clock) = cache(
            &directory,
            vec![Reply::Body(b"intact"), Reply::Unavailable, Reply::Truncated(b"brok")],
        );

        let initial = cache.get_artifact().await.unwrap();
        clock.advance(Duration::minutes(30));

        assert!(matches!(cache.get_artifact().await, Err(FetchError::Status(_))));
        assert!(matches!(cache.get_artifact().await, Err(FetchError::Io(_))));

        assert_eq!(*cache.current.lock().await, Some(initial));
        assert_eq!(contents(&directory).await, b"intact");
        assert!(!directory.path().join(".current.jpg.partial").exists());
    }

    #[tokio::test]
    async fn fail_without_previous_artifact() {
        let directory = TempDir::new().unwrap();
        let (cache, _) = cache(&directory, vec![Reply::Unavailable]);

        let error = cache.get_artifact().await.unwrap_err();

        assert_eq!(error.to_string(), "failed to download image: HTTP 503");
        assert!(!directory.path().join("current.jpg").exists());
    }

    #[tokio::test]
    async fn fetch_once_for_concurrent_callers() {
        let directory = TempDir::new().unwrap();
        let (cache, _) = cache(&directory, vec![Reply::Body(b"shared")]);

        let (left, right) = futures::join!(cache.get_artifact(), cache.get_artifact());

        assert_eq!(left.unwrap(), right.unwrap());
        assert_eq!(fetches(&cache), 1);
    }

    #[tokio::test]
    async fn reuse_artifacts_left_on_disk() {
        let directory = TempDir::new().unwrap();
        fs::write(directory.path().join("current.jpg"), b"leftover")
            .await
            .unwrap();

        let clock = ManualClock::new(Utc::now());
        let cache = ArtifactCache::new(
            ScriptedSource::default(),
            clock,
            directory.path().to_path_buf(),
            "current.jpg".into(),
            Duration::minutes(10),
        );

        cache.get_artifact().await.unwrap();

        assert_eq!(fetches(&cache), 0);
        assert_eq!(contents(&directory).await, b"leftover");
    }
}
