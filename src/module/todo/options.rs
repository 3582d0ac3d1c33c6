use crate::module::options::{DatabaseOptions, ServerOptions};
use structopt::StructOpt;

/// Options for the todo module
#[derive(Debug, StructOpt)]
pub struct Options {
    /// Message bus (Redis) server URL, task events are not published when omitted
    #[structopt(long = "bus-url", env = "BUS_URL", value_name = "url")]
    pub bus_url: Option<String>,

    /// Endpoint redirecting to a random article, used to create reading tasks
    #[structopt(long, env = "RANDOM_ARTICLE_URL", value_name = "url")]
    pub random_article_url: Option<String>,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub server: ServerOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub database: DatabaseOptions,
}
