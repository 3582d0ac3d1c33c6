use anyhow::{bail, Result};
use options::{Command, LogFormat};
use structopt::StructOpt;
use taskbus::harness::ModuleRunner;
use taskbus::module::broadcaster::Broadcaster;
use taskbus::module::image::Image;
use taskbus::module::todo::Todo;
use tracing::info;

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init();

    let reason = match command {
        Command::Todo(options) => runner.run(Todo::new(options)).await,
        Command::Broadcaster(options) => runner.run(Broadcaster::new(options)).await,
        Command::Image(options) => runner.run(Image::new(options)).await,
    };

    if reason.is_failure() {
        bail!(reason);
    }

    Ok(())
}

fn init() -> (Command, ModuleRunner) {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log);

    match options.log_format {
        LogFormat::Text => formatter.init(),
        LogFormat::Compact => formatter.compact().init(),
        LogFormat::Json => formatter.json().init(),
    };

    info!("taskbus {}", env!("CARGO_PKG_VERSION"));

    (options.command, ModuleRunner::default())
}
