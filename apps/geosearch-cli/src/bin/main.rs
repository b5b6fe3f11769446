use clap::Parser;

use geosearch_cli::cli::init_tracing;
use geosearch_cli::{run, Args};
use geosearch_core::config::Config;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let settings = Config::load()
        .and_then(|config| config.demo())
        .map_err(|e| {
            tracing::error!(error = %e, "loading config");
            e
        })?;
    let config = args.into_config(settings)?;
    tracing::info!(
        index = %config.index_path.display(),
        search = %config.search,
        distance = %config.distance_label,
        fresh = config.fresh,
        "starting demo"
    );

    let report = run(&config)?;
    if report.term.is_none() || report.nearby.is_none() {
        tracing::warn!("one or more searches failed; see errors above");
    }
    Ok(())
}
