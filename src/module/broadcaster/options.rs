use crate::module::options::{BusOptions, QueueingOptions};
use structopt::StructOpt;

/// Options for the broadcaster module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub bus: BusOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub queueing: QueueingOptions,

    /// What to do with task events, either `log-only` or `forward`.
    /// Anything else falls back to `log-only`.
    #[structopt(long, env = "MODE")]
    pub mode: Option<String>,

    /// Webhook receiving forwarded task events, required in `forward` mode
    #[structopt(long, env = "WEBHOOK_URL", value_name = "url", hide_env_values = true)]
    pub webhook_url: Option<String>,
}
