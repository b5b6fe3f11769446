use std::path::PathBuf;

use clap::Parser;

use geosearch_cli::cli::init_tracing;
use geosearch_core::geo::GeoPoint;
use geosearch_core::query::{SearchQuery, SearchRequest};
use geosearch_index::{DocumentIndex, GeoIndex};

/// Query an existing index without writing to it.
#[derive(Parser, Debug)]
#[command(name = "geosearch-search-only")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Query-parser syntax, e.g. 'school AND quebec'
    query: String,

    /// Index directory
    #[arg(long, default_value = "index.bleve")]
    index: PathBuf,

    /// Maximum number of hits
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Keep hits within this radius of --lon/--lat, e.g. 2km
    #[arg(long, requires_all = ["lon", "lat"])]
    distance: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(false);

    let mut query = SearchQuery::query_string(&args.query);
    if let (Some(distance), Some(lon), Some(lat)) = (&args.distance, args.lon, args.lat) {
        query = SearchQuery::and([query, SearchQuery::geo_distance(lon, lat, distance)?]);
    }
    let request = SearchRequest::new(query).all_fields().with_size(args.limit);

    println!("🔍 geosearch-search-only\n======================");
    println!("Query: {}", args.query);
    println!("Index directory: {}", args.index.display());
    let index = GeoIndex::open(&args.index)?;
    let result = index.search(&request)?;

    println!("\n🔍 Found {} results for: \"{}\"", result.total_hits, args.query);
    for (i, hit) in result.hits.iter().enumerate() {
        println!("\n  {}. score={:.4}  id={}", i + 1, hit.score, hit.id);
        for (name, value) in &hit.fields {
            println!("     {name}: {value}");
        }
        if let (Some(lon), Some(lat)) = (args.lon, args.lat) {
            let located = hit.fields.get("location").and_then(geosearch_core::geo::extract_geo_point);
            if let (Some(point), Ok(center)) = (located, GeoPoint::new(lon, lat)) {
                println!("     📍 {:.0} m from center", center.distance_to(&point));
            }
        }
    }
    Ok(())
}
