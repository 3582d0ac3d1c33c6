//! Various options usable by modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct. This allows for a unified yet non-cluttered
//! option set.

use sqlx::postgres::PgConnectOptions;
use structopt::StructOpt;
use tracing::warn;
use warp::cors::Builder as CorsBuilder;

/// Options for connecting to the message bus
#[derive(Debug, StructOpt)]
pub struct BusOptions {
    /// Message bus (Redis) server URL
    #[structopt(long = "bus-url", env = "BUS_URL", value_name = "url")]
    pub url: String,
}

/// Options relevant for message queueing
#[derive(Debug, StructOpt)]
pub struct QueueingOptions {
    /// Identifier of this consumer within its group.
    /// Pending notifications are resumed after a restart when it
    /// stays the same, a random one is generated when omitted.
    #[structopt(long, env = "ID")]
    pub id: Option<String>,
}

impl QueueingOptions {
    /// Configured identifier or a freshly generated one
    pub fn consumer_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// Options for connecting to the PostgreSQL database
#[derive(Debug, StructOpt)]
pub struct DatabaseOptions {
    /// Database server hostname
    #[structopt(long = "postgres-host", env = "POSTGRES_HOST")]
    pub host: String,

    /// Database server port
    #[structopt(long = "postgres-port", env = "POSTGRES_PORT", default_value = "5432")]
    pub port: u16,

    /// Database user
    #[structopt(long = "postgres-user", env = "POSTGRES_USER")]
    pub user: String,

    /// Password of the database user
    #[structopt(long = "postgres-password", env = "POSTGRES_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Name of the database
    #[structopt(long = "postgres-db", env = "POSTGRES_DB")]
    pub database: String,
}

impl DatabaseOptions {
    /// Connection parameters derived from the options
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Options for modules serving HTTP
#[derive(Debug, StructOpt)]
pub struct ServerOptions {
    /// Port on which the HTTP server listens
    #[structopt(short, long, env = "PORT")]
    pub port: u16,

    /// Comma separated list of origins permitted to make cross-origin requests, `*` allows any
    #[structopt(long, env = "ALLOWED_ORIGINS", default_value = "*")]
    pub allowed_origins: String,
}

impl ServerOptions {
    /// CORS configuration permitting the configured origins
    pub fn cors(&self) -> CorsBuilder {
        let cors = warp::cors()
            .allow_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allow_headers(vec!["content-type", "authorization"]);

        let origins: Vec<&str> = self
            .allowed_origins
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/'))
            .filter(|origin| !origin.is_empty())
            .collect();

        if origins.is_empty() || origins.contains(&"*") {
            return cors.allow_any_origin();
        }

        let (valid, invalid): (Vec<&str>, Vec<&str>) =
            origins.into_iter().partition(|origin| origin.contains("://"));

        for origin in invalid {
            warn!(origin, "Ignoring malformed allowed origin");
        }

        cors.allow_origins(valid)
    }
}
