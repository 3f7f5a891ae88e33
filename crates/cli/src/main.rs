use anyhow::Result;
use clap::{Parser, Subcommand};
use classify_core::config::{self, AppConfig};
use classify_core::pipeline;
use classify_core::report::BatchReport;
use classify_core::settings::{AppSettings, SqliteSettings, APP_NAMESPACE};
use cli::setting;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { model, json } => run_scan(cfg, &model, json).await,
        Commands::Classify {
            model,
            batch_size,
            all,
            json,
        } => run_classify(cfg, &model, batch_size, all, json).await,
        Commands::Mount { command } => run_mount(cfg, command).await,
        Commands::Setting { command } => run_setting(cfg, command).await,
        Commands::Status { json } => run_status(cfg, json).await,
        Commands::Tags { file } => run_tags(cfg, file).await,
    }
}

#[derive(Parser)]
#[command(name = "media-classify")]
#[command(about = "Classify queued media files and store tags and faces", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register files under the scan roots and queue them for a model
    Scan {
        /// Model to queue for (musicnn|faces)
        #[arg(long)]
        model: String,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Classify the next batch of queued files
    Classify {
        /// Model to run (musicnn|faces)
        #[arg(long)]
        model: String,
        /// Files per batch; defaults to [inference] batch_size
        #[arg(long)]
        batch_size: Option<usize>,
        /// Keep going until the queue is empty
        #[arg(long, default_value_t = false)]
        all: bool,
        /// Output JSON reports
        #[arg(long)]
        json: bool,
    },
    /// Manage which users can see a storage root
    Mount {
        #[command(subcommand)]
        command: MountCommand,
    },
    /// Read or write runtime settings (e.g. inference.portable)
    Setting {
        #[command(subcommand)]
        command: SettingCommand,
    },
    /// Show model status, queue sizes and pending clustering jobs
    Status {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List the tags assigned to a file
    Tags {
        #[arg(long)]
        file: i64,
    },
}

#[derive(Subcommand)]
enum MountCommand {
    /// Expose a storage root to a user
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        root: i64,
        /// Where the root appears in the user's tree
        #[arg(long, default_value = "/")]
        mount_point: String,
    },
    /// List mounts of a storage root
    List {
        #[arg(long)]
        root: i64,
    },
}

#[derive(Subcommand)]
enum SettingCommand {
    Get { key: String },
    Set { key: String, value: String },
    List,
}

async fn run_scan(cfg: AppConfig, model: &str, json: bool) -> Result<()> {
    let kind = pipeline::model_kind(model)?;
    let summary = pipeline::scan_roots(&cfg, kind).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "scan: discovered {}, queued {} for {}",
            summary.discovered, summary.enqueued, kind
        );
    }
    Ok(())
}

async fn run_classify(
    cfg: AppConfig,
    model: &str,
    batch_size: Option<usize>,
    all: bool,
    json: bool,
) -> Result<()> {
    let kind = pipeline::model_kind(model)?;
    let reports = pipeline::run_queue(&cfg, kind, batch_size, all).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    if reports.is_empty() {
        println!("{}: nothing queued", kind);
    }
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!(
        "{}: {} files ({} empty), {} tags, {} detections (-{} stale), {} clustering jobs",
        report.model,
        report.files,
        report.empty_results,
        report.tags_assigned,
        report.detections_inserted,
        report.detections_deleted,
        report.jobs_enqueued.len()
    );
    for err in &report.row_errors {
        println!("  skipped: {}", err);
    }
}

async fn run_mount(cfg: AppConfig, command: MountCommand) -> Result<()> {
    let pool = pipeline::open(&cfg).await?;
    match command {
        MountCommand::Add {
            user,
            root,
            mount_point,
        } => {
            storage::mounts::add(&pool, &user, root, &mount_point).await?;
            println!("mounted root {} for {} at {}", root, user, mount_point);
        }
        MountCommand::List { root } => {
            for mount in storage::mounts::for_root(&pool, root).await? {
                println!("{}\t{}", mount.user_id, mount.mount_point);
            }
        }
    }
    Ok(())
}

async fn run_setting(cfg: AppConfig, command: SettingCommand) -> Result<()> {
    let pool = pipeline::open(&cfg).await?;
    let settings = SqliteSettings::new(pool.clone());
    match command {
        SettingCommand::Get { key } => {
            println!("{}", settings.get_app_value(APP_NAMESPACE, &key, "").await?);
        }
        SettingCommand::Set { key, value } => setting::set(&settings, &key, &value).await?,
        SettingCommand::List => {
            for (key, value) in setting::list(&pool).await? {
                println!("{}\t{}", key, value);
            }
        }
    }
    Ok(())
}

async fn run_status(cfg: AppConfig, json: bool) -> Result<()> {
    let pool = pipeline::open(&cfg).await?;
    let view = cli::status::collect(&pool).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }
    println!("backend: {}", view.backend);
    for m in &view.models {
        println!(
            "{}: ready={} queued={} timeout={}s",
            m.model, m.ready, m.queued, m.timeout_secs
        );
    }
    println!("clustering jobs pending: {}", view.clustering_jobs);
    if !view.clustering_users.is_empty() {
        println!("  for: {}", view.clustering_users.join(", "));
    }
    Ok(())
}

async fn run_tags(cfg: AppConfig, file_id: i64) -> Result<()> {
    let pool = pipeline::open(&cfg).await?;
    for tag in storage::tags::for_file(&pool, file_id).await? {
        println!("{}\t{:.3}\t{}", tag.name, tag.confidence, tag.source);
    }
    Ok(())
}
