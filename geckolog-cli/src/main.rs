//! geckolog-cli - Peek and dump console memory over TCPGecko
//!
//! Runs one command per invocation against either wire variant.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use geckolog_client::{connect, ConnectionConfig, Variant};
use std::net::IpAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geckolog-cli")]
#[command(about = "Read console memory through a TCPGecko stub or the Aroma plugin")]
#[command(version)]
struct Cli {
    /// Console IP address
    #[arg(short, long, env = "GECKOLOG_IP")]
    ip: Option<IpAddr>,

    /// Port (defaults to 7331 for classic, 7332 for text)
    #[arg(short, long, env = "GECKOLOG_PORT")]
    port: Option<u16>,

    /// Wire variant spoken by the stub
    #[arg(long, value_enum, default_value = "classic", env = "GECKOLOG_VARIANT")]
    variant: VariantArg,

    /// Shorthand for --variant text
    #[arg(long)]
    aroma: bool,

    /// Connect and request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Classic,
    Text,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Classic => Variant::Classic,
            VariantArg::Text => Variant::Text,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the 8-bit value in the last byte of a slot
    Peek8 {
        /// Slot address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,

        /// Interpret as signed
        #[arg(short, long)]
        signed: bool,
    },

    /// Read the 16-bit value in the last two bytes of a slot
    Peek16 {
        /// Slot address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,

        /// Interpret as signed
        #[arg(short, long)]
        signed: bool,
    },

    /// Read a 32-bit word
    Peek32 {
        /// Address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,

        /// Interpret as signed
        #[arg(short, long)]
        signed: bool,
    },

    /// Read a 32-bit float
    Float {
        /// Address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,
    },

    /// Dump a byte range
    Read {
        /// Start address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,

        /// Number of bytes (decimal, or hex with 0x)
        #[arg(value_parser = commands::parse_length)]
        length: u32,
    },

    /// Read a NUL-terminated string
    String {
        /// Start address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,

        /// Maximum length in bytes
        #[arg(default_value = "32", value_parser = commands::parse_length)]
        length: u32,
    },

    /// Check a range against the address table without connecting
    Check {
        /// Start address (hex)
        #[arg(value_parser = commands::parse_address)]
        address: u32,

        /// Number of bytes
        #[arg(default_value = "4", value_parser = commands::parse_length)]
        length: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Policy checks need no console
    if let Commands::Check { address, length } = cli.command {
        println!("{}", commands::check(address, length));
        return Ok(());
    }

    let Some(ip) = cli.ip else {
        eprintln!("{}: no IP address given (use --ip or GECKOLOG_IP)", "Error".red());
        std::process::exit(1);
    };

    let variant = if cli.aroma {
        Variant::Text
    } else {
        cli.variant.into()
    };
    let timeout = Duration::from_secs(cli.timeout);
    let mut config = ConnectionConfig::new(ip, variant)
        .with_connect_timeout(timeout)
        .with_request_timeout(timeout);
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }

    let mut link = connect(&config).await.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;
    tracing::debug!("Connected to {} ({} link)", config.addr(), variant);

    match commands::execute(&mut link, cli.command).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
