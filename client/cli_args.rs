use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "strtree-cli",
    version,
    about = "Build an STR-tree over a dataset and query it",
    long_about = "strtree-cli loads a dataset of bounding boxes (lines of `<id> Env[...]`) or a GeoJSON file,\nbulk-loads it into an STR-tree and runs range, nearest neighbour and distance queries against it."
)]
pub struct CliArgs {
    /// 配置文件路径
    #[arg(short, long, default_value = "strtree.toml")]
    pub config: String,

    /// 生成默认配置文件并退出
    #[arg(long)]
    pub generate_config: bool,

    /// Node capacity (overrides config file)
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Dataset dimensions, 2 or 3 (overrides config file; GeoJSON is always 2D)
    #[arg(short, long)]
    pub dimensions: Option<usize>,

    /// Log level (overrides config file)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the configuration summary before running
    #[arg(short, long)]
    pub verbose: bool,

    /// Dataset file: `<id> Env[...]` lines, or `.geojson` / `.json`
    pub dataset: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Items whose envelope intersects the search envelope
    Query {
        /// Search envelope, e.g. `Env[0:3,0:3]`
        envelope: String,
    },
    /// Items nearest to the given envelope
    Nearest {
        /// Query envelope, e.g. `Env[4:4,4:4]`
        envelope: String,

        /// Number of neighbours to report
        #[arg(short, default_value_t = 1)]
        k: usize,
    },
    /// Nearest pair between the dataset and another dataset, or within the dataset
    Pair {
        /// Second dataset; omit to search the closest pair inside the dataset
        other: Option<PathBuf>,
    },
    /// Whether any item of the two datasets lies within the given distance
    Within {
        /// Second dataset
        other: PathBuf,

        /// Maximum distance
        distance: f64,
    },
    /// Tree statistics
    Stats,
    /// Print the tree structure
    Dump {
        /// Export as JSON instead of the indented text form
        #[arg(long)]
        json: bool,
    },
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.generate_config {
            return Ok(());
        }

        if self.dataset.is_none() {
            return Err("No dataset specified. Provide a dataset file or use --generate-config.".to_string());
        }
        if self.command.is_none() {
            return Err("No command specified. Use one of: query, nearest, pair, within, stats, dump.".to_string());
        }

        if let Some(capacity) = self.capacity {
            if capacity < 2 {
                return Err("Node capacity must be at least 2".to_string());
            }
        }

        match &self.command {
            Some(Command::Nearest { k: 0, .. }) => {
                return Err("k must be greater than 0".to_string());
            }
            Some(Command::Within { distance, .. }) if distance.is_nan() || *distance < 0.0 => {
                return Err(format!("Distance must be a non-negative number, got {}", distance));
            }
            _ => {}
        }

        Ok(())
    }
}
