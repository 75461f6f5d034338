//! Binary entrypoint for the gsadmin console server.
//!
//! Commands:
//! - `start` - run the console server (stdin lines are admin commands)
//! - `init` - create a starter `config.toml` and admin roster
//! - `status` - print record counts as JSON
//!
//! See the library crate docs for module-level details: `gsadmin::`.
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use gsadmin::catalog;
use gsadmin::config::Config;
use gsadmin::roster::AdminRoster;
use gsadmin::server::AdminServer;
use gsadmin::storage::SledStore;

#[derive(Parser)]
#[command(name = "gsadmin")]
#[command(about = "Admin command core for GoldSrc-style game servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console server
    Start,
    /// Write a default configuration and admin roster
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Show record counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            info!("Starting gsadmin v{}", env!("CARGO_PKG_VERSION"));
            let mut server = AdminServer::new(config).await?;
            server.run().await?;
        }
        Commands::Init { force } => {
            init_logging(None, cli.verbose);
            if Path::new(&cli.config).exists() && !force {
                warn!("{} already exists; pass --force to overwrite", cli.config);
                return Ok(());
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let config = Config::load(&cli.config).await?;
            let roster_path = Path::new(&config.admins.file);
            if roster_path.exists() && !force {
                info!("Keeping existing admin roster {}", roster_path.display());
            } else {
                AdminRoster::write_default(roster_path).await?;
                info!("Admin roster created at {}", roster_path.display());
            }
            tokio::fs::create_dir_all(&config.server.maps_dir).await?;
            tokio::fs::create_dir_all(&config.storage.data_dir).await?;
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let records_path = config.storage.records_path();
            let counts = tokio::task::spawn_blocking(move || {
                SledStore::open(records_path).map(|store| store.counts())
            })
            .await??;
            let admins = AdminRoster::load(&config.admins.file)?.len();
            let maps = catalog::for_server(&config.server)
                .list_maps()
                .map(|m| m.len())
                .unwrap_or(0);
            let payload = serde_json::json!({
                "name": config.server.name,
                "bans": counts.bans,
                "kicks": counts.kicks,
                "map_changes": counts.map_changes,
                "admins": admins,
                "maps": maps,
            });
            println!("{}", payload);
        }
    }

    Ok(())
}

fn log_line(record: &log::Record) -> String {
    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!("{} [{}] {}", ts, record.level(), record.args())
}

fn open_append(path: &str) -> Option<Arc<Mutex<std::fs::File>>> {
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => Some(Arc::new(Mutex::new(f))),
        Err(e) => {
            eprintln!("cannot open log file {}: {}", path, e);
            None
        }
    }
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let configured = config
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let file = config
        .and_then(|c| c.logging.file.as_deref())
        .and_then(open_append);
    let security = config
        .and_then(|c| c.logging.security_file.as_deref())
        .and_then(open_append);
    // With a log file, the terminal copy is only wanted when someone is watching.
    let echo = file.is_none() || atty::is(atty::Stream::Stderr);

    builder.format(move |fmt, record| {
        let line = log_line(record);
        if let Some(f) = &file {
            let mut guard = f.lock().unwrap_or_else(|p| p.into_inner());
            let _ = writeln!(guard, "{}", line);
        }
        if record.target() == "security" {
            if let Some(sf) = &security {
                let mut guard = sf.lock().unwrap_or_else(|p| p.into_inner());
                let _ = writeln!(guard, "{}", line);
            }
        }
        if echo {
            writeln!(fmt, "{}", line)
        } else {
            Ok(())
        }
    });
    let _ = builder.try_init();
}
