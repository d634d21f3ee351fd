//! Decode a file holding serialized triggers and print them.
//!
//! The input is a sequence of triggers stored back to back, as produced by
//! `Trigger::serialize`. Decoding stops at the first malformed trigger.
//!
//! # Usage
//!
//! ```bash
//! # Print every trigger in debug form
//! trigger_dump triggers.bin
//!
//! # Read stdin, print JSON and check each trigger for well-formedness
//! cat triggers.bin | trigger_dump --json --validate -
//! ```

use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use trigger_model::{Trigger, Validate};

#[derive(Debug, Parser)]
#[command(version, about = "Decode and print serialized tracing triggers")]
struct Opt {
    /// File to read, or `-` for stdin
    file: PathBuf,

    /// Print triggers as JSON
    #[arg(long)]
    json: bool,

    /// Check every trigger for well-formedness and fail if one is not
    #[arg(long)]
    validate: bool,

    /// Dump the raw bytes of each trigger
    #[arg(long)]
    hexdump: bool,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Opt {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
    } else {
        buf = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    }
    Ok(buf)
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    env_logger::Builder::new()
        .filter_level(opt.log_level())
        .parse_default_env()
        .init();

    let buf = read_input(&opt.file)?;
    log::info!("read {} bytes from {}", buf.len(), opt.file.display());

    let mut scanner = Trigger::scan(&buf);
    let mut count = 0usize;
    let mut invalid = 0usize;
    while let Some(item) = scanner.next() {
        let offset = scanner.offset();
        let (raw, trigger) = item.with_context(|| {
            format!("failed to decode trigger #{count} at offset {offset}")
        })?;

        println!("# trigger {count} ({} bytes)", raw.len());
        if opt.hexdump {
            hexdump::hexdump(raw);
        }

        if opt.json {
            let json = serde_json::to_string_pretty(&trigger)
                .with_context(|| format!("failed to format trigger #{count} as JSON"))?;
            println!("{json}");
        } else {
            println!("{trigger:#?}");
        }

        if opt.validate {
            if trigger.validate() {
                println!("valid");
            } else {
                println!("INVALID");
                invalid += 1;
            }
        }

        count += 1;
    }

    log::info!("decoded {count} triggers");
    if invalid > 0 {
        anyhow::bail!("{invalid} of {count} triggers failed validation");
    }

    Ok(())
}
