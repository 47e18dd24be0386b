use std::path::Path;

use strtree::client::loader::{self, LoadError};
use strtree::client::{CliArgs, Command, DatasetItem, OutputFormatter, TreeStats};
use strtree::config::{LoggingConfig, StrTreeConfig};
use strtree::strtree::{Envelope, EnvelopeDistance, GeometryDistance, ItemBoundable, ItemDistance, STRtree};
use strtree::Result;
use tracing::{info, Level};

fn main() -> Result<()> {
    let args = CliArgs::parse_args();

    // 验证参数
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // 生成默认配置文件
    if args.generate_config {
        let config = StrTreeConfig::default();
        config.save_to_file(&args.config)?;
        println!("✅ Generated default configuration: {}", args.config);
        return Ok(());
    }

    // 加载配置
    let mut config = StrTreeConfig::from_file(&args.config)?;

    // 命令行参数覆盖配置文件
    if let Some(capacity) = args.capacity {
        config.index.node_capacity = capacity;
    }
    if let Some(dimensions) = args.dimensions {
        config.index.dimensions = dimensions;
    }
    if let Some(log_level) = args.log_level.clone() {
        config.logging.level = log_level;
    }

    // 验证配置
    config.validate()?;

    // 初始化日志系统
    init_logging(&config.logging)?;

    if args.verbose {
        config.print_summary();
    }

    let (Some(dataset), Some(command)) = (args.dataset.as_deref(), args.command.as_ref()) else {
        return Ok(());
    };
    let capacity = config.index.node_capacity;

    if let Err(e) = run(dataset, command, capacity, config.index.dimensions) {
        eprintln!("{}", OutputFormatter::format_error(&e));
        std::process::exit(1);
    }
    Ok(())
}

/// 按数据集类型和维度选择树的具体类型
fn run(dataset: &Path, command: &Command, capacity: usize, dimensions: usize) -> Result<()> {
    if loader::is_geojson(dataset) {
        let mut tree = loader::build_geo_tree(loader::load_geojson(dataset)?, capacity)?;
        info!("📦 Loaded {} geometries from {}", tree.len(), dataset.display());
        let load_other = |path: &Path| loader::build_geo_tree(loader::load_geojson(path)?, capacity);
        return run_command(command, &mut tree, load_other, GeometryDistance);
    }

    match dimensions {
        2 => run_text::<2>(dataset, command, capacity),
        3 => run_text::<3>(dataset, command, capacity),
        other => Err(format!("Unsupported dimensions: {}", other).into()),
    }
}

fn run_text<const D: usize>(dataset: &Path, command: &Command, capacity: usize) -> Result<()> {
    let mut tree = loader::build_tree(loader::load_text::<D>(dataset)?, capacity)?;
    info!("📦 Loaded {} items from {}", tree.len(), dataset.display());
    let load_other = |path: &Path| loader::build_tree(loader::load_text::<D>(path)?, capacity);
    run_command(command, &mut tree, load_other, EnvelopeDistance)
}

/// 执行子命令并输出结果
fn run_command<T, const D: usize, M, L>(
    command: &Command,
    tree: &mut STRtree<T, D>,
    load_other: L,
    metric: M,
) -> Result<()>
where
    T: DatasetItem<D>,
    M: ItemDistance<T, D> + Copy,
    L: Fn(&Path) -> std::result::Result<STRtree<T, D>, LoadError>,
{
    match command {
        Command::Query { envelope } => {
            let search: Envelope<D> = envelope.parse()?;
            let labels: Vec<&str> = tree.query(&search).into_iter().map(|item| item.label()).collect();
            println!("{}", OutputFormatter::format_items(&labels));
        }
        Command::Nearest { envelope, k } => {
            let envelope: Envelope<D> = envelope.parse()?;
            let query = <T as DatasetItem<D>>::query(envelope);
            let neighbours: Vec<(&str, f64)> = tree
                .k_nearest_neighbours(&envelope, &query, *k, metric)
                .into_iter()
                .map(|(item, distance)| (item.label(), distance))
                .collect();
            println!("{}", OutputFormatter::format_neighbours(&neighbours));
        }
        Command::Pair { other: Some(path) } => {
            let mut other = load_other(path)?;
            let output = match tree.nearest_neighbour_tree(&mut other, metric) {
                Some((a, b)) => format_pair::<T, D, M>(a, b, metric),
                None => OutputFormatter::format_nil(),
            };
            println!("{}", output);
        }
        Command::Pair { other: None } => {
            let output = match tree.nearest_neighbour(metric) {
                Some((a, b)) => format_pair::<T, D, M>(a, b, metric),
                None => OutputFormatter::format_nil(),
            };
            println!("{}", output);
        }
        Command::Within { other, distance } => {
            let mut other = load_other(other)?;
            let within = tree.is_within_distance(&mut other, metric, *distance);
            println!("{}", OutputFormatter::format_bool(within));
        }
        Command::Stats => {
            let stats = TreeStats {
                items: tree.len(),
                dimensions: D,
                node_capacity: tree.node_capacity(),
                depth: tree.depth(),
                nodes: tree.num_nodes(),
                leaves: tree.num_leaf_nodes(),
                bounds: tree.root().map(|root| root.bounds().to_string()),
            };
            println!("{}", OutputFormatter::format_stats(&stats));
        }
        Command::Dump { json: true } => {
            println!("{}", tree.export_to_json()?);
        }
        Command::Dump { json: false } => {
            tree.build();
            print!("{}", tree);
        }
    }
    Ok(())
}

fn format_pair<T, const D: usize, M>(a: &T, b: &T, metric: M) -> String
where
    T: DatasetItem<D>,
    M: ItemDistance<T, D>,
{
    let (env_a, env_b) = (a.envelope(), b.envelope());
    let distance = metric.distance(&ItemBoundable::new(&env_a, a), &ItemBoundable::new(&env_b, b));
    OutputFormatter::format_pair(a.label(), b.label(), distance)
}

/// 初始化日志系统
fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    match (config.output.as_str(), &config.log_file) {
        ("file", Some(log_file)) => {
            // 确保日志目录存在
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| format!("Failed to open log file '{}': {}", log_file.display(), e))?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(LevelFilter::from_level(filter))
                .init();
        }
        ("stdout", _) => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .with(LevelFilter::from_level(filter))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .with(LevelFilter::from_level(filter))
                .init();
        }
    }
    Ok(())
}
