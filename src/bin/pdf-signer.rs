//! PDF Signer CLI tool
//!
//! A command-line tool for stamping a signature image onto PDF pages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use pdf_signer::layout::{ImageFit, Rect};
use pdf_signer::pdf::{extract_metadata, inspect_pages, stamp, StampRequest};
use pdf_signer::PageSelector;

/// PDF Signer - Place a signature image on selected PDF pages
#[derive(Parser)]
#[command(name = "pdf-signer")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Sign every page, 100pt from the left and top edges
    pdf-signer sign contract.pdf --image signature.png --x 100 --y 100 --width 150 --height 50

    # Sign pages 2 to 3 and choose the output file
    pdf-signer sign contract.pdf --image signature.png --x 100 --y 650 --width 150 --height 50 --pages 2-3 -o signed.pdf

    # Sign specific pages, keeping the signature's proportions
    pdf-signer sign contract.pdf --image signature.jpg --x 400 --y 700 --width 150 --height 80 --pages 1,3,5 --keep-aspect

    # Show page sizes to help choose coordinates
    pdf-signer info contract.pdf")]
struct Cli {
    /// Show debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp a signature image onto a PDF
    Sign {
        /// Input PDF file
        input: PathBuf,

        /// Signature image (PNG or JPEG)
        #[arg(short, long)]
        image: PathBuf,

        /// Distance from the left edge of the page, in points
        #[arg(long, allow_negative_numbers = true)]
        x: f32,

        /// Distance from the top edge of the page, in points
        #[arg(long, allow_negative_numbers = true)]
        y: f32,

        /// Signature width in points
        #[arg(long, allow_negative_numbers = true)]
        width: f32,

        /// Signature height in points
        #[arg(long, allow_negative_numbers = true)]
        height: f32,

        /// Pages to sign: "all", a range like "1-5", or a list like "1,3,5"
        #[arg(short, long, default_value = "all")]
        pages: String,

        /// Output PDF file path (default: <input>_signed.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the image's aspect ratio, centered in the rectangle,
        /// instead of stretching it to fill the rectangle exactly
        #[arg(long)]
        keep_aspect: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Sign {
            input, image, x, y, width, height, pages, output, keep_aspect,
        } => {
            cmd_sign(input, image, Rect::new(x, y, width, height), &pages, output, keep_aspect)
                .context("Failed to sign PDF")
        }
        Commands::Info { input } => {
            cmd_info(input)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Stamp the signature onto the selected pages
fn cmd_sign(
    input: PathBuf,
    image: PathBuf,
    rect: Rect,
    pages: &str,
    output: Option<PathBuf>,
    keep_aspect: bool,
) -> Result<()> {
    // Parse the selection before touching any file
    let selector: PageSelector = pages.parse()?;

    let request = StampRequest {
        source: input,
        image,
        rect,
        selector,
        output,
        fit: if keep_aspect { ImageFit::Contain } else { ImageFit::Stretch },
    };

    log::debug!("{:?}", request);

    let report = stamp(&request)?;

    if report.stamped_pages.is_empty() {
        log::warn!(
            "Selection \"{}\" matched none of the {} pages; document saved unchanged",
            request.selector,
            report.page_count
        );
    }

    println!("Signed PDF saved as {}", report.output.display());

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    for page in inspect_pages(&input)? {
        let (width, height) = page.visible_size();
        if page.geometry.rotation == 0 {
            println!("  Page {}: {} x {} pt", page.number, width, height);
        } else {
            println!(
                "  Page {}: {} x {} pt (rotated {}°)",
                page.number, width, height, page.geometry.rotation
            );
        }
    }

    Ok(())
}
