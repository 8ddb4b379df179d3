use anyhow::{Context, Result};
use babynames::config::{self, DatabaseConfig};
use babynames::crm::{self, CrmClient};
use babynames::import::{check_batch_size, make_progress_bar, make_spinner};
use babynames::pipeline::{run_ingest, IngestOptions};
use babynames::stats::{IngestStats, PushStats};
use babynames::store::{MemoryStore, MySqlStore, NameStore};
use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "babynames")]
#[command(about = "Ingest a baby-names CSV into MySQL and push a sample to the CRM")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, deduplicate and batch-insert the CSV into the names table
    Import(ImportArgs),
    /// Send stored names to the CRM as contacts
    Push(PushArgs),
    /// Import followed by push on the same connection
    Run(RunArgs),
    /// Print the first stored names
    Sample(SampleArgs),
}

#[derive(Args)]
struct DbArgs {
    /// MySQL host
    #[arg(long, env = "DB_HOST", default_value = config::DEFAULT_DB_HOST)]
    db_host: String,

    /// MySQL port
    #[arg(long, env = "DB_PORT", default_value_t = config::DEFAULT_DB_PORT)]
    db_port: u16,

    /// MySQL user
    #[arg(long, env = "DB_USER", default_value = config::DEFAULT_DB_USER)]
    db_user: String,

    /// MySQL password
    #[arg(long, env = "DB_PASS", default_value = "", hide_env_values = true)]
    db_pass: String,

    /// MySQL database name
    #[arg(long, env = "DB_NAME", default_value = config::DEFAULT_DB_NAME)]
    db_name: String,
}

impl DbArgs {
    fn config(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            username: self.db_user.clone(),
            password: self.db_pass.clone(),
            database: self.db_name.clone(),
        }
    }
}

#[derive(Args)]
struct IngestArgs {
    /// Path to the downloaded CSV
    #[arg(long, env = "CSV_DOWNLOAD_PATH", default_value = config::DEFAULT_CSV_PATH)]
    csv_path: PathBuf,

    /// Rows per insert round trip
    #[arg(long, default_value_t = config::BATCH_SIZE, value_parser = parse_batch_size)]
    batch_size: usize,
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|e| format!("{e}"))?;
    check_batch_size(size).map_err(|e| e.to_string())?;
    Ok(size)
}

impl IngestArgs {
    fn options(&self) -> IngestOptions {
        IngestOptions {
            csv_path: self.csv_path.clone(),
            batch_size: self.batch_size,
            show_progress: true,
        }
    }
}

#[derive(Args)]
struct CrmArgs {
    /// CRM private-app token
    #[arg(long, env = "HUBSPOT_API_KEY", default_value = "", hide_env_values = true)]
    crm_token: String,

    /// Max stored rows to send
    #[arg(long, default_value_t = config::CRM_PUSH_LIMIT)]
    limit: usize,
}

#[derive(Args)]
struct ImportArgs {
    #[command(flatten)]
    ingest: IngestArgs,

    #[command(flatten)]
    db: DbArgs,

    /// Parse and deduplicate into memory; don't connect to the database
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct PushArgs {
    #[command(flatten)]
    crm: CrmArgs,

    #[command(flatten)]
    db: DbArgs,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    ingest: IngestArgs,

    #[command(flatten)]
    crm: CrmArgs,

    #[command(flatten)]
    db: DbArgs,
}

#[derive(Args)]
struct SampleArgs {
    #[command(flatten)]
    db: DbArgs,

    /// Number of rows to print
    #[arg(long, default_value_t = config::SAMPLE_LIMIT)]
    limit: usize,
}

async fn connect(db: &DbArgs) -> Result<MySqlStore> {
    let cfg = db.config();
    println!("==> Connecting to MySQL at {} ...", cfg.display_target());
    let store = MySqlStore::connect(&cfg).await?;
    info!("DB connected");
    Ok(store)
}

async fn ingest(store: &mut MySqlStore, args: &IngestArgs) -> Result<IngestStats> {
    let pb = make_spinner("Ensuring names table exists ...");
    store.ensure_schema().await?;
    pb.finish_with_message("Names table ready.");

    println!("==> Importing {} ...", args.csv_path.display());
    run_ingest(store, &args.options()).await
}

async fn push<S: NameStore + ?Sized>(store: &mut S, client: &CrmClient, limit: usize) -> Result<PushStats> {
    println!("==> Sending up to {limit} names to the CRM ...");
    let pb = make_progress_bar(limit as u64, "Contacts", "calls");
    crm::push_contacts(store, client, limit, &pb).await
}

async fn run_import(args: ImportArgs) -> Result<()> {
    let start = Instant::now();
    let stats = if args.dry_run {
        println!("==> Dry run: importing {} into memory ...", args.ingest.csv_path.display());
        let mut store = MemoryStore::new();
        run_ingest(&mut store, &args.ingest.options()).await?
    } else {
        let mut store = connect(&args.db).await?;
        let result = ingest(&mut store, &args.ingest).await;
        store.close().await;
        result?
    };

    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.2}s", start.elapsed().as_secs_f64());
    stats.print_summary();
    Ok(())
}

async fn run_push(args: PushArgs) -> Result<()> {
    let client = CrmClient::new(&args.crm.crm_token)?;
    let mut store = connect(&args.db).await?;
    let result = push(&mut store, &client, args.crm.limit).await;
    store.close().await;
    let stats = result?;

    println!();
    println!("=== Summary ===");
    stats.print_summary();
    Ok(())
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    let start = Instant::now();
    let client = CrmClient::new(&args.crm.crm_token)?;
    let mut store = connect(&args.db).await?;

    let result = async {
        let ingested = ingest(&mut store, &args.ingest).await?;
        let pushed = push(&mut store, &client, args.crm.limit).await?;
        Ok::<_, anyhow::Error>((ingested, pushed))
    }
    .await;
    store.close().await;
    let (ingested, pushed) = result?;

    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.2}s", start.elapsed().as_secs_f64());
    ingested.print_summary();
    pushed.print_summary();
    Ok(())
}

async fn run_sample(args: SampleArgs) -> Result<()> {
    let mut store = connect(&args.db).await?;
    let result = async {
        let rows = store.sample(args.limit).await?;
        let total = store.count().await?;
        Ok::<_, anyhow::Error>((rows, total))
    }
    .await;
    store.close().await;
    let (rows, total) = result?;

    println!();
    println!("{:>8}  {:<24} {:<8} created", "id", "name", "sex");
    for row in &rows {
        println!(
            "{:>8}  {:<24} {:<8} {}",
            row.id,
            row.name,
            row.sex,
            row.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
    println!("Showing {} of {} rows", rows.len(), total);
    Ok(())
}

fn block_on<F: Future<Output = Result<()>>>(fut: F) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .thread_name("babynames")
        .enable_io()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;
    rt.block_on(fut)
}

fn main() -> ExitCode {
    // Existing environment variables win over .env
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    let result = match cli.command {
        Commands::Import(args) => block_on(run_import(args)),
        Commands::Push(args) => block_on(run_push(args)),
        Commands::Run(args) => block_on(run_pipeline(args)),
        Commands::Sample(args) => block_on(run_sample(args)),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
