//! xmpdump CLI tool
//!
//! Prints the XMP packet embedded in an InDesign, PDF, PNG or Photoshop file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use xmpdump::{ByteSource, FileHandler, Handler, HandlerRegistry, XmpOptions};

/// xmpdump - Print the XMP packet embedded in a file
#[derive(Parser)]
#[command(name = "xmpdump")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Format taken from the file extension
    xmpdump brochure.indd

    # Force a format and check the packet parses as XML
    xmpdump --format pdf --check scan.bin

    # Show decoder progress
    RUST_LOG=xmpdump=trace xmpdump photo.png")]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Format key (indd, pdf, png, psd, psb). Defaults to the file
    /// extension, then to content detection
    #[arg(short, long)]
    format: Option<String>,

    /// Cut InDesign output down to the xpacket markers
    #[arg(long)]
    trim: bool,

    /// Bytes read from each PDF object when looking for the packet
    #[arg(long, value_name = "BYTES")]
    scan_len: Option<usize>,

    /// Fail unless the packet is well-formed XML
    #[arg(long)]
    check: bool,

    /// Log decoder progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut options = XmpOptions::default();
    if cli.trim {
        options = options.trim_packet();
    }
    if let Some(len) = cli.scan_len {
        options = options.scan_len(len);
    }

    let file = File::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let mut reader = BufReader::new(file);

    let registry = HandlerRegistry::new();
    let handler = select_handler(&registry, &cli, &mut reader)?;
    tracing::debug!(format = handler.format_name(), "selected handler");

    let packet = handler
        .read_xmp(&mut ByteSource::seekable(&mut reader), &options)
        .with_context(|| {
            format!(
                "Failed to extract XMP from {} as {}",
                cli.input.display(),
                handler.format_name()
            )
        })?;

    if cli.check {
        packet
            .check_well_formed()
            .context("Extracted packet is not well-formed XML")?;
    }

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", packet)?;
    Ok(())
}

/// Handler named by `--format`, else by the file extension, else by magic bytes
fn select_handler<'r>(
    registry: &'r HandlerRegistry,
    cli: &Cli,
    reader: &mut BufReader<File>,
) -> Result<&'r Handler> {
    if let Some(key) = &cli.format {
        return match registry.find_by_extension(key) {
            Some(handler) => Ok(handler),
            None => bail!("Unsupported format '{}'", key),
        };
    }

    let by_extension = cli
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| registry.find_by_extension(ext));
    if let Some(handler) = by_extension {
        return Ok(handler);
    }

    match registry.find_by_detection(reader)? {
        Some(handler) => Ok(handler),
        None => bail!("Could not determine the format of {}", cli.input.display()),
    }
}
