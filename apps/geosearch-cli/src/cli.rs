use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geosearch_core::config::{expand_path, DemoSettings};
use geosearch_core::geo::{parse_distance, Distance, GeoPoint};

/// Index two sample places, reopen the index and search it by text and distance.
#[derive(Parser, Debug)]
#[command(name = "geosearch-demo")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Index directory [default: index.bleve]
    #[arg(long = "blevepath", value_name = "PATH")]
    pub index_path: Option<String>,

    /// Search radius, e.g. 1km, 500m, 2mi [default: 1km]
    #[arg(long)]
    pub distance: Option<String>,

    /// Free-text query used by both searches [default: cafe]
    #[arg(long)]
    pub search: Option<String>,

    /// Longitude of the distance query center
    #[arg(long, allow_negative_numbers = true)]
    pub center_lon: Option<f64>,

    /// Latitude of the distance query center
    #[arg(long, allow_negative_numbers = true)]
    pub center_lat: Option<f64>,

    /// Log the decoded location of the first sample place
    #[arg(long)]
    pub debug: bool,

    /// Delete any existing index at the path before writing
    #[arg(long)]
    pub fresh: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything the demo driver needs, resolved from flags over configured defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub index_path: PathBuf,
    /// The radius as given, for log output.
    pub distance_label: String,
    pub distance: Distance,
    pub search: String,
    pub center: GeoPoint,
    pub fresh: bool,
    pub debug: bool,
}

impl Args {
    pub fn into_config(self, settings: DemoSettings) -> anyhow::Result<DemoConfig> {
        let index_path = expand_path(self.index_path.unwrap_or(settings.index_path));
        let distance_label = self.distance.unwrap_or(settings.distance);
        let distance = parse_distance(&distance_label).context("invalid --distance")?;
        let center = GeoPoint::new(
            self.center_lon.unwrap_or(settings.center_lon),
            self.center_lat.unwrap_or(settings.center_lat),
        )
        .context("invalid distance query center")?;
        Ok(DemoConfig {
            index_path,
            distance_label,
            distance,
            search: self.search.unwrap_or(settings.search),
            center,
            fresh: self.fresh || settings.fresh,
            debug: self.debug || settings.debug,
        })
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins unless `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_file(true).with_line_number(true))
        .with(filter)
        .init();
}
