//! geckolog - Splatoon match logger
//!
//! Reads match state from a Wii U over TCPGecko and writes match logs.

use clap::Parser;
use colored::Colorize;
use geckolog_match::{
    console_footer, console_line, AutoMode, Config, DriverOptions, LogLevel, MatchError, MatchLogger,
    MatchSnapshot, NameTable, Session, Shutdown, TcpConnector, VariantSetting,
};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geckolog")]
#[command(about = "Log Splatoon matches from a Wii U running TCPGecko")]
#[command(version)]
struct Args {
    /// Console IP address
    ip: Option<IpAddr>,

    /// Port (defaults to 7331 for classic, 7332 for the Aroma plugin)
    #[arg(short, long)]
    port: Option<u16>,

    /// Wire variant: classic (tcpgecko) or text (aroma)
    #[arg(long)]
    variant: Option<VariantSetting>,

    /// Shorthand for --variant text
    #[arg(long)]
    aroma: bool,

    /// Watch for matches and log each one: all (one file) or latest (file per match)
    #[arg(short, long)]
    auto: Option<AutoMode>,

    /// What to write: none, basic, full or stats
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    /// Do not print players to the console
    #[arg(short, long)]
    silent: bool,

    /// JSON file with display names for ids
    #[arg(long)]
    names: Option<PathBuf>,

    /// Root directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(ip) = self.ip {
            config.connection.ip = Some(ip);
        }
        if let Some(port) = self.port {
            config.connection.port = Some(port);
        }
        if let Some(variant) = self.variant {
            config.connection.variant = variant;
        }
        if self.aroma {
            config.connection.variant = VariantSetting::Text;
        }
        if let Some(auto) = self.auto {
            config.logging.auto = Some(auto);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.silent {
            config.logging.silent = true;
        }
        if let Some(names) = self.names {
            config.logging.names_file = Some(names);
        }
        if let Some(dir) = self.log_dir {
            config.logging.dir = dir;
        }
    }
}

fn print_match(snapshot: &MatchSnapshot, number: Option<u32>) {
    match number {
        Some(n) => println!(
            "\n{} {}",
            format!("[Match {}]", n).bold(),
            snapshot.captured_at.format("%H:%M:%S").to_string().dimmed()
        ),
        None => println!(),
    }
    if !snapshot.in_match {
        println!("{}", "Not in a match; showing the previous one".yellow());
    }
    for player in &snapshot.players {
        println!("{}", console_line(player));
    }
    println!("{}", console_footer(snapshot).dimmed());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration (from file if GECKOLOG_CONFIG is set, then env overrides)
    let mut config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("GECKOLOG_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            // If a config file was explicitly specified, fail on error
            if std::env::var("GECKOLOG_CONFIG").is_ok() {
                tracing::error!("Failed to load config: {}", e);
                return Err(e.into());
            }
            tracing::info!("Using default configuration");
            Config::default()
        }
    };
    args.apply(&mut config);

    let connection = match config.connection_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            eprintln!("Pass the console address as the first argument or set GECKOLOG_IP");
            std::process::exit(1);
        }
    };

    let names = match &config.logging.names_file {
        Some(path) => {
            let table = NameTable::from_file(path)?;
            tracing::info!("Loaded {} name categories from {}", table.len(), path.display());
            table
        }
        None => NameTable::empty(),
    };

    tracing::info!("Starting geckolog");
    tracing::info!("  Console: {} ({:?})", connection.addr(), connection.variant);
    tracing::info!("  Log level: {}", config.logging.level);
    if config.logging.level.writes_file() {
        tracing::info!("  Log directory: {}", config.logging.dir.display());
    }

    let shutdown = Shutdown::new();
    let session = Session::new(TcpConnector::new(connection), config.retry_policy());
    let mut logger = MatchLogger::new(
        session,
        config.layout.clone(),
        names,
        DriverOptions::from_config(&config),
        shutdown.clone(),
    );

    // Spawn shutdown signal handler
    let signal = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping...");
        signal.trigger();
    });

    let silent = config.logging.silent;
    let on_match = |snapshot: &MatchSnapshot, number: Option<u32>| {
        if !silent {
            print_match(snapshot, number);
        }
    };

    let result = match config.logging.auto {
        Some(_) => logger.run_auto(&shutdown, on_match).await.map(|_| ()),
        None => logger.log_once(&shutdown, on_match).await.map(|_| ()),
    };

    match result {
        Ok(()) | Err(MatchError::Cancelled) => {}
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    if let Some(path) = logger.log_path() {
        tracing::info!("Log written to {}", path.display());
    }
    Ok(())
}
