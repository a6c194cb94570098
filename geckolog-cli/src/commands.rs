//! Command execution.

use crate::Commands;
use colored::Colorize;
use geckolog_client::MemoryLink;
use geckolog_protocol::{address, value, Access};
use std::fmt::Write;

const DUMP_WIDTH: usize = 16;

/// Executes a command against the link and returns the formatted output.
pub async fn execute<L: MemoryLink>(link: &mut L, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Check { address, length } => Ok(check(address, length)),

        Commands::Peek8 { address, signed } => {
            let text = if signed {
                link.peek8_signed(address).await?.to_string()
            } else {
                let v = link.peek8(address).await?;
                format!("{} (0x{:02X})", v, v)
            };
            Ok(format_value(address, &text))
        }

        Commands::Peek16 { address, signed } => {
            let text = if signed {
                link.peek16_signed(address).await?.to_string()
            } else {
                let v = link.peek16(address).await?;
                format!("{} (0x{:04X})", v, v)
            };
            Ok(format_value(address, &text))
        }

        Commands::Peek32 { address, signed } => {
            let text = if signed {
                link.peek32_signed(address).await?.to_string()
            } else {
                let v = link.peek32(address).await?;
                format!("{} (0x{:08X})", v, v)
            };
            Ok(format_value(address, &text))
        }

        Commands::Float { address } => {
            let v = link.peek_float(address).await?;
            Ok(format_value(address, &v.to_string()))
        }

        Commands::Read { address, length } => {
            let bytes = link.read_bytes(address, length).await?;
            Ok(hexdump(address, &bytes))
        }

        Commands::String { address, length } => {
            let text = link.read_string(address, length).await?;
            Ok(format_value(address, &format!("{:?}", value::until_nul(&text))))
        }
    }
}

/// Parses a hex address, with or without `0x`.
pub fn parse_address(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
        .replace('_', "");
    u32::from_str_radix(&digits, 16).map_err(|e| format!("invalid address '{}': {}", s, e))
}

/// Parses a length: decimal, or hex with `0x`.
pub fn parse_length(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid length '{}': {}", s, e))
}

/// Describes how the address table treats a range.
pub fn check(address: u32, length: u32) -> String {
    let range = format!("[{:#010X}, +{:#X})", address, length);
    match address::find_range(address, length) {
        Some(entry) if length > 0 => format!(
            "{} {} in {:#010X}..{:#010X} ({}{})",
            range.cyan(),
            "valid".green(),
            entry.start,
            entry.end,
            if entry.permits(Access::Read) { "r" } else { "-" },
            if entry.permits(Access::Write) { "w" } else { "-" },
        ),
        _ => match address::check(address, length, Access::Read) {
            Ok(()) => format!("{} {}", range.cyan(), "valid".green()),
            Err(e) => format!("{} {}: {}", range.cyan(), "rejected".red(), e),
        },
    }
}

fn format_value(address: u32, text: &str) -> String {
    format!("{} {}", format!("{:08X}:", address).dimmed(), text)
}

/// Classic hexdump: offset, 16 hex bytes, printable ASCII.
pub fn hexdump(address: u32, bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, row) in bytes.chunks(DUMP_WIDTH).enumerate() {
        let row_address = address.wrapping_add((i * DUMP_WIDTH) as u32);
        let _ = write!(out, "{:08X}  ", row_address);
        for col in 0..DUMP_WIDTH {
            match row.get(col) {
                Some(b) => {
                    let _ = write!(out, "{:02X} ", b);
                }
                None => out.push_str("   "),
            }
            if col == 7 {
                out.push(' ');
            }
        }
        out.push(' ');
        out.extend(row.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push('\n');
    }
    out.pop();
    out
}
