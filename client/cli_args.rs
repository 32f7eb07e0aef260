use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "geoknn-cli",
    about = "Find the streets nearest to a point",
    long_about = "geoknn-cli loads street geometries from a GeoJSON FeatureCollection, \
                  builds an R-tree or quadtree\nover their envelopes and prints the k streets \
                  closest to the query point."
)]
pub struct CliArgs {
    /// Configuration file
    #[arg(short = 'c', long = "config", default_value = "geoknn.toml")]
    pub config: String,

    /// Write the default configuration to this file and exit
    #[arg(long = "generate-config")]
    pub generate_config: Option<String>,

    /// Print the effective configuration
    #[arg(long = "show-config")]
    pub show_config: bool,

    /// GeoJSON FeatureCollection of streets
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Query point X (longitude)
    #[arg(long = "x", allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// Query point Y (latitude)
    #[arg(long = "y", allow_negative_numbers = true)]
    pub y: Option<f64>,

    /// Number of neighbors (defaults to query.default_k)
    #[arg(short = 'k')]
    pub k: Option<usize>,

    /// Index type: rtree or quadtree (overrides index.index_type)
    #[arg(long = "index-type")]
    pub index_type: Option<String>,

    /// Include streets that are not accessible by car
    #[arg(long = "include-unusable")]
    pub include_unusable: bool,

    /// Print the index structure as JSON
    #[arg(long = "dump-tree")]
    pub dump_tree: bool,

    /// Machine-readable JSON output
    #[arg(long = "json")]
    pub json: bool,
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.generate_config.is_some() {
            return Ok(());
        }

        if self.input.is_none() {
            return Err("No input specified. Use --input <file.geojson>.".to_string());
        }

        match (self.x, self.y) {
            (Some(x), Some(y)) if !x.is_finite() || !y.is_finite() => {
                return Err("Query point coordinates must be finite".to_string());
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err("Both --x and --y are required for a query".to_string());
            }
            (None, None) if !self.dump_tree => {
                return Err("No query point. Use --x and --y, or --dump-tree.".to_string());
            }
            _ => {}
        }

        if self.k == Some(0) {
            return Err("k must be greater than 0".to_string());
        }

        Ok(())
    }

    /// 查询点，两个坐标都给出时才有
    pub fn query_point(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }
}
