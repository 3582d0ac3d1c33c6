use crate::module::options::ServerOptions;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::warn;

const DEFAULT_CACHE_MINUTES: i64 = 10;

/// Options for the image module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub server: ServerOptions,

    /// Directory holding the cached image, created at startup
    #[structopt(long, env = "IMAGE_DIR", default_value = "./image", parse(from_os_str))]
    pub image_dir: PathBuf,

    /// Location the image is downloaded from
    #[structopt(long, env = "IMAGE_URL", default_value = "https://picsum.photos/300")]
    pub image_url: String,

    /// File name of the cached image within the image directory
    #[structopt(long, env = "CACHED_IMAGE_NAME", default_value = "current_image.jpg")]
    pub cached_image_name: String,

    /// Minutes after which the cached image is replaced.
    /// Values which are not a positive integer fall back to the default.
    #[structopt(long, env = "CACHE_DURATION_MINUTES", default_value = "10")]
    pub cache_duration_minutes: String,
}

impl Options {
    /// Lifetime of a cached image
    pub fn cache_duration(&self) -> chrono::Duration {
        parse_cache_duration(&self.cache_duration_minutes)
    }
}

fn parse_cache_duration(value: &str) -> chrono::Duration {
    let parsed = value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|minutes| *minutes > 0)
        .and_then(chrono::Duration::try_minutes);

    match parsed {
        Some(duration) => duration,
        None => {
            warn!(
                value,
                default = DEFAULT_CACHE_MINUTES,
                "Invalid CACHE_DURATION_MINUTES, using default"
            );
            chrono::Duration::minutes(DEFAULT_CACHE_MINUTES)
        }
    }
}
