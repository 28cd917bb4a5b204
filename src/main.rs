use std::env;
use std::io;

use philly_transit::app;
use philly_transit::config::Config;
use philly_transit::{PortalClient, Registry, TransitError};

fn other_error<E>(e: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::Other, e)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    dotenvy::from_filename(".env").ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::try_init().ok();

    let config = Config::from_env().map_err(other_error)?;
    log::debug!("{:?}", config);

    let registry = match &config.sources {
        Some(path) => Registry::from_path(path),
        None => Registry::seeded(),
    }
    .map_err(TransitError::from)?;

    let client = PortalClient::with_timeout(config.timeout).map_err(other_error)?;

    let report = app::run(&config, &registry, &client).await?;

    if !report.failures.is_empty() {
        for failure in &report.failures {
            log::warn!("{} was not downloaded: {}", failure.mode, failure.error);
        }
        return Err(other_error(format!(
            "{} of {} modes failed",
            report.failures.len(),
            report.failures.len() + report.modes.len()
        )));
    }

    Ok(())
}
