use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Location and fetch time of the artifact currently held by a cache slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// Path of the artifact on disk
    pub path: PathBuf,
    /// Point in time at which the bytes on disk have been fetched
    pub cached_at: DateTime<Utc>,
}

impl ArtifactDescriptor {
    /// Creates a new descriptor
    pub fn new(path: PathBuf, cached_at: DateTime<Utc>) -> Self {
        Self { path, cached_at }
    }

    /// Whether the artifact is younger than `ttl` at the given point in time
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.cached_at < ttl
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn expire_once_ttl_is_reached() {
        let fetched = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let descriptor = ArtifactDescriptor::new("slot.jpg".into(), fetched);
        let ttl = Duration::minutes(10);

        assert!(descriptor.is_fresh(fetched + Duration::minutes(5), ttl));
        assert!(!descriptor.is_fresh(fetched + ttl, ttl));
    }
}
