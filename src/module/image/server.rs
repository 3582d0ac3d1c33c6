use super::cache::ArtifactCache;
use super::clock::Clock;
use super::source::ArtifactSource;
use crate::harness::HeartStone;
use crate::library::http::{error_response, json_response, recover_rejection};
use crate::library::scheduling::{Job, JobManager};
use crate::library::EmptyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use warp::cors::Builder as CorsBuilder;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

/// Time between answering a shutdown request and actually shutting down
const SHUTDOWN_DELAY: Duration = Duration::from_secs(1);

/// Publicly reachable location of the current image
#[derive(Debug, Serialize)]
struct ImageInfo {
    path: String,
    cached_at: DateTime<Utc>,
}

async fn welcome() -> Result<Response, Infallible> {
    Ok(json_response(
        &json!({
            "message": "Welcome to the image service.",
            "status_code": 200,
            "Endpoints": [
                "GET /api/image/current - Get cached image info",
                "GET /api/image/files/:name - Download cached images",
                "POST /api/image/shutdown - Shutdown the server",
            ],
        }),
        StatusCode::OK,
    ))
}

async fn current_image<S, C>(cache: Arc<ArtifactCache<S, C>>) -> Result<Response, Infallible>
where
    S: ArtifactSource + Send + Sync,
    C: Clock + Send + Sync,
{
    Ok(match cache.get_artifact().await {
        Ok(descriptor) => {
            let info = ImageInfo {
                path: format!("/files/{}", cache.name()),
                cached_at: descriptor.cached_at,
            };

            info!(path = %info.path, "Image info requested");
            json_response(&info, StatusCode::OK)
        }
        Err(error) => {
            error!(%error, "Failed to get image info");
            error_response(error, StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}

async fn shutdown(mut stone: HeartStone) -> Result<Response, Infallible> {
    info!("Shutdown requested");

    tokio::spawn(async move {
        sleep(SHUTDOWN_DELAY).await;
        stone.kill("Shutdown requested via API".into()).await;
    });

    Ok(json_response(
        &json!({ "message": "Shutting down server..." }),
        StatusCode::OK,
    ))
}

/// HTTP routes of the image service
pub fn routes<S, C>(
    cache: Arc<ArtifactCache<S, C>>,
    directory: PathBuf,
    stone: HeartStone,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone
where
    S: ArtifactSource + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    let with_cache = warp::any().map(move || cache.clone());
    let with_stone = warp::any().map(move || stone.clone());

    let welcome_route = warp::path::end().and(warp::get()).and_then(welcome);

    let current_route = warp::path!("api" / "image" / "current")
        .and(warp::get())
        .and(with_cache)
        .and_then(current_image);

    let files_route = warp::path!("api" / "image" / "files" / ..)
        .and(warp::get())
        .and(warp::fs::dir(directory));

    let shutdown_route = warp::path!("api" / "image" / "shutdown")
        .and(warp::post())
        .and(with_stone)
        .and_then(shutdown);

    welcome_route
        .or(current_route)
        .or(files_route)
        .or(shutdown_route)
        .recover(recover_rejection)
}

/// Job serving the image [`routes`]
pub struct ServerJob<S, C> {
    port: u16,
    cors: CorsBuilder,
    cache: Arc<ArtifactCache<S, C>>,
    directory: PathBuf,
    stone: HeartStone,
}

impl<S, C> ServerJob<S, C> {
    /// Creates a new job listening on all interfaces
    pub fn new(
        port: u16,
        cors: CorsBuilder,
        cache: ArtifactCache<S, C>,
        directory: PathBuf,
        stone: HeartStone,
    ) -> Self {
        Self {
            port,
            cors,
            cache: Arc::new(cache),
            directory,
            stone,
        }
    }
}

#[async_trait]
impl<S, C> Job for ServerJob<S, C>
where
    S: ArtifactSource + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let routes = routes(
            self.cache.clone(),
            self.directory.clone(),
            self.stone.clone(),
        )
        .with(self.cors.clone())
        .with(warp::trace::request());

        let source_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(source_addr, manager.termination_signal())?;

        info!(?addr, "Serving image API");
        manager.ready().await;
        server.await;

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::super::clock::SystemClock;
    use super::super::source::FetchError;
    use super::*;
    use crate::harness::{DeathReason, Heart};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio::io::{AsyncWrite, AsyncWriteExt};

    enum FixedImage {
        Available,
        Unavailable,
    }

    #[async_trait]
    impl ArtifactSource for FixedImage {
        async fn fetch_into(
            &self,
            writer: &mut (dyn AsyncWrite + Unpin + Send),
        ) -> Result<u64, FetchError> {
            match self {
                FixedImage::Available => {
                    writer.write_all(b"jpeg").await?;
                    Ok(4)
                }
                FixedImage::Unavailable => {
                    Err(FetchError::Status(reqwest::StatusCode::NOT_FOUND))
                }
            }
        }
    }

    fn cache(
        directory: &TempDir,
        image: FixedImage,
    ) -> Arc<ArtifactCache<FixedImage, SystemClock>> {
        Arc::new(ArtifactCache::new(
            image,
            SystemClock,
            directory.path().to_path_buf(),
            "current_image.jpg".into(),
            chrono::Duration::minutes(10),
        ))
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn describe_and_serve_the_current_image() {
        let directory = TempDir::new().unwrap();
        let (_heart, stone) = Heart::new();
        let filter = routes(
            cache(&directory, FixedImage::Available),
            directory.path().to_path_buf(),
            stone,
        );

        let info = warp::test::request()
            .path("/api/image/current")
            .reply(&filter)
            .await;

        assert_eq!(info.status(), StatusCode::OK);
        assert_eq!(body(&info)["path"], "/files/current_image.jpg");
        assert!(body(&info)["cached_at"].is_string());

        let file = warp::test::request()
            .path("/api/image/files/current_image.jpg")
            .reply(&filter)
            .await;

        assert_eq!(file.status(), StatusCode::OK);
        assert_eq!(file.body().as_ref(), b"jpeg");
    }

    #[tokio::test]
    async fn report_fetch_failures() {
        let directory = TempDir::new().unwrap();
        let (_heart, stone) = Heart::new();
        let filter = routes(
            cache(&directory, FixedImage::Unavailable),
            directory.path().to_path_buf(),
            stone,
        );

        let response = warp::test::request()
            .path("/api/image/current")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body(&response),
            json!({ "error": "failed to download image: HTTP 404" })
        );
    }

    #[tokio::test]
    async fn return_not_found_for_missing_files() {
        let directory = TempDir::new().unwrap();
        let (_heart, stone) = Heart::new();
        let filter = routes(
            cache(&directory, FixedImage::Available),
            directory.path().to_path_buf(),
            stone,
        );

        let response = warp::test::request()
            .path("/api/image/files/missing.jpg")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_the_heart_after_replying_to_shutdown() {
        let directory = TempDir::new().unwrap();
        let (mut heart, stone) = Heart::new();
        let filter = routes(
            cache(&directory, FixedImage::Available),
            directory.path().to_path_buf(),
            stone,
        );

        let response = warp::test::request()
            .method("POST")
            .path("/api/image/shutdown")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body(&response),
            json!({ "message": "Shutting down server..." })
        );
        assert_eq!(
            heart.death().await,
            DeathReason::Killed("Shutdown requested via API".into())
        );
    }
}
