use clap::Parser;
use log::{debug, error, info, warn};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs::File;
use uecombo::{
    importer::{b826, mtk_lte},
    model::Capabilities,
    qmdl,
    util::{HexError, decode_hex},
};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(short = 'p', long, help = "A capability log or a directory of them")]
    path: PathBuf,

    #[arg(short, long, value_enum, default_value = "auto", help = "Input format")]
    format: InputFormat,

    #[arg(short, long, help = "Merge every input into a single result")]
    merge: bool,

    #[arg(long, help = "Pretty-print JSON output")]
    pretty: bool,

    #[arg(short, long, help = "Only print warnings/errors to stderr")]
    quiet: bool,

    #[arg(short, long, help = "Show debug messages")]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum InputFormat {
    /// Pick by file extension
    Auto,
    /// Raw 0xB826 log
    B826,
    /// 0xB826 log as a hex dump
    B826Hex,
    /// QMDL capture containing 0xB826 logs
    Qmdl,
    /// MTK ELT text dump
    Mtk,
}

impl InputFormat {
    fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "bin" => Some(InputFormat::B826),
            "hex" => Some(InputFormat::B826Hex),
            "qmdl" => Some(InputFormat::Qmdl),
            "txt" => Some(InputFormat::Mtk),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Hex(#[from] HexError),
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Can't tell the format of {0:?}, pass --format")]
    UnknownFormat(PathBuf),
}

/// What one input file holds. 0xB826 logs are kept raw so that a series
/// split across files can be decoded as one.
#[derive(Debug)]
enum Input {
    B826Logs(Vec<Vec<u8>>),
    Mtk(Capabilities),
}

impl Input {
    fn decode(self) -> Capabilities {
        match self {
            Input::B826Logs(logs) => b826::parse_multiple(logs.iter().map(Vec::as_slice)),
            Input::Mtk(capabilities) => capabilities,
        }
    }
}

async fn read_input(path: &Path, format: InputFormat) -> Result<Input, CliError> {
    let format = match format {
        InputFormat::Auto => InputFormat::from_extension(path)
            .ok_or_else(|| CliError::UnknownFormat(path.to_path_buf()))?,
        format => format,
    };
    let input = match format {
        InputFormat::B826 => Input::B826Logs(vec![tokio::fs::read(path).await?]),
        InputFormat::B826Hex => {
            let text = tokio::fs::read_to_string(path).await?;
            Input::B826Logs(vec![decode_hex(&text)?])
        }
        InputFormat::Qmdl => {
            let qmdl_file = File::open(path).await?;
            let file_size = qmdl_file.metadata().await?.len();
            let logs = qmdl::read_b826_logs(qmdl_file, Some(file_size as usize)).await?;
            if logs.is_empty() {
                warn!("no 0xB826 logs in {path:?}");
            }
            Input::B826Logs(logs)
        }
        InputFormat::Mtk => Input::Mtk(mtk_lte::parse(&tokio::fs::read(path).await?)),
        InputFormat::Auto => return Err(CliError::UnknownFormat(path.to_path_buf())),
    };
    Ok(input)
}

fn print_json(capabilities: &Capabilities, pretty: bool) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, capabilities)?;
    } else {
        serde_json::to_writer(&mut stdout, capabilities)?;
    }
    writeln!(stdout)?;
    Ok(())
}

async fn run(args: &Args) -> Result<(), CliError> {
    let mut merged_logs = Vec::new();
    let mut merged = Capabilities::new();

    for maybe_entry in WalkDir::new(&args.path).sort_by_file_name() {
        let entry = match maybe_entry {
            Ok(entry) => entry,
            Err(err) => {
                error!("failed to open dir entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if args.format == InputFormat::Auto && InputFormat::from_extension(path).is_none() {
            debug!("skipping {path:?}");
            continue;
        }

        info!("**** Decoding {path:?}");
        let input = match read_input(path, args.format).await {
            Ok(input) => input,
            Err(err) => {
                error!("failed to read {path:?}: {err}");
                continue;
            }
        };

        if args.merge {
            match input {
                Input::B826Logs(logs) => merged_logs.extend(logs),
                Input::Mtk(capabilities) => merged.merge(capabilities),
            }
        } else {
            let capabilities = input.decode();
            info!("{path:?}: {} combos", capabilities.num_combos());
            print_json(&capabilities, args.pretty)?;
        }
    }

    if args.merge {
        let mut capabilities = b826::parse_multiple(merged_logs.iter().map(Vec::as_slice));
        capabilities.merge(merged);
        capabilities.set_metadata("numCombos", capabilities.num_combos());
        info!("merged: {} combos", capabilities.num_combos());
        print_json(&capabilities, args.pretty)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let level = if args.debug {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    simple_logger::SimpleLogger::new()
        .with_colors(true)
        .without_timestamps()
        .with_level(level)
        .init()
        .unwrap();

    if let Err(err) = run(&args).await {
        error!("{err}");
        std::process::exit(1);
    }
}
