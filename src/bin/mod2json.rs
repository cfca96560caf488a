//! MOD to JSON converter

use clap::Parser;
use flate2::read::GzDecoder;
use sjs2mod::protracker::{ModJson, ModReader};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mod2json")]
#[command(version = "0.1.0")]
#[command(about = "Dump MOD files as JSON", long_about = None)]
struct Args {
    /// Input MOD file (optionally gzip-compressed)
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let data = read_mod_file(&args.input)?;
    let module = ModReader::new(&data).parse()?;
    tracing::debug!("{:?}: {} patterns", args.input, module.patterns.len());

    let mod_json = ModJson::new(&module);

    let json_string = if args.compact {
        serde_json::to_string(&mod_json)?
    } else {
        serde_json::to_string_pretty(&mod_json)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}

/// Read a MOD file, decompressing if it is gzipped
fn read_mod_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;

    let gz_extension = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    let gz_magic = data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b;

    if gz_extension || gz_magic {
        let mut decompressed = Vec::new();
        GzDecoder::new(data.as_slice()).read_to_end(&mut decompressed)?;
        Ok(decompressed)
    } else {
        Ok(data)
    }
}
