use crate::aggregate::Aggregator;
use crate::config::Config;
use crate::error::TransitResult;
use crate::output::{write_merged, Report};
use crate::portal::GeoJsonSource;
use crate::registry::Registry;

/// Download the configured modes (all of them when none are named), merge them
/// and write the results into the configured output directory.
pub async fn run<S: GeoJsonSource>(
    config: &Config,
    registry: &Registry,
    source: &S,
) -> TransitResult<Report> {
    let aggregator = Aggregator::new(registry, source)
        .policy(config.policy)
        .explode_stops(config.explode_stops)
        .concurrency(config.concurrency);

    let merged = match &config.modes {
        Some(modes) => {
            let modes = modes.iter().map(String::as_str).collect::<Vec<_>>();
            aggregator.fetch_modes(&modes).await?
        }
        None => aggregator.fetch_all().await?,
    };

    let report = write_merged(&config.output_dir, &merged)?;
    log::info!(
        "Wrote {} stops and {} lines to {}",
        report.stops,
        report.lines,
        config.output_dir.display()
    );

    Ok(report)
}
