use geoknn::client::{CliArgs, OutputFormatter};
use geoknn::config::{GeoKnnConfig, LoggingConfig};
use geoknn::loader::load_streets_geojson;
use geoknn::storage::{GeometryList, Spatial};
use geoknn::Result;
use tracing::{info, Level};

fn main() -> Result<()> {
    let args = CliArgs::parse_args();

    // 生成默认配置文件
    if let Some(path) = &args.generate_config {
        GeoKnnConfig::default().save_to_file(path)?;
        println!("✅ Generated default configuration: {}", path);
        return Ok(());
    }

    if let Err(e) = args.validate() {
        eprintln!("{}", OutputFormatter::format_error(&e));
        std::process::exit(2);
    }

    // 加载配置，命令行参数覆盖配置文件
    let mut config = GeoKnnConfig::from_file(&args.config)?;
    if let Some(index_type) = &args.index_type {
        config.index.index_type = index_type.clone();
    }
    if args.include_unusable {
        config.query.usable_only = false;
    }
    config.validate()?;

    init_logging(&config.logging)?;

    if args.show_config {
        config.print_summary();
    }

    let options = config.index_options()?;
    let input = args.input.as_ref().ok_or("No input specified")?;

    info!("📖 Loading streets from {}", input.display());
    let load = load_streets_geojson(input)?;
    if !args.json {
        println!(
            "{}",
            OutputFormatter::format_load_summary(load.streets.len(), load.skipped)
        );
    }

    let streets = GeometryList::build(load.streets, options)?;
    info!(
        "🌲 Built {} index over {} streets (depth {}, {} nodes)",
        options.index_type,
        streets.len(),
        streets.index().depth(),
        streets.index().node_count()
    );

    if args.dump_tree {
        println!("{}", streets.index().export_to_json()?);
    }

    if let Some((x, y)) = args.query_point() {
        let k = args.k.unwrap_or(config.query.default_k);
        let usable_only = config.query.usable_only;

        let (neighbors, stats) =
            streets.knn_query_with_stats(x, y, k, |street| !usable_only || street.is_usable())?;

        if args.json {
            let value = OutputFormatter::neighbors_to_json(x, y, &neighbors);
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{}", OutputFormatter::format_neighbors(&neighbors));
            println!("{}", OutputFormatter::format_stats(&stats));
        }
    }

    Ok(())
}

/// 初始化日志系统
///
/// 控制台日志写到 stderr，stdout 只输出查询结果
fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
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
                        .with_writer(std::sync::Mutex::new(file))
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(tracing_subscriber::filter::LevelFilter::from_level(filter))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .with(tracing_subscriber::filter::LevelFilter::from_level(filter))
                .init();
        }
    }
    Ok(())
}
