//! PDF image export CLI tool
//!
//! A command-line tool for writing every image a PDF paints out as PNG.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pdf_image_export::export::{
    export_images_with, scan, ExportOptions, ExportRecord, FailurePolicy, FileNaming,
};
use pdf_image_export::pdf::{extract_metadata, LopdfDocument};

/// PDF Images - Export the raster images of PDF files as PNG
#[derive(Parser)]
#[command(name = "pdf-images")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Export every image of a paper into figures/
    pdf-images export paper.pdf -o figures

    # Export several documents, one subdirectory each, skipping bad images
    pdf-images export -o out --keep-going \"papers/*.pdf\"

    # Show which images a document paints and where they resolve
    pdf-images scan paper.pdf")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every image as <name>.png
    Export {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Destination directory (created if missing)
        #[arg(short, long)]
        output: PathBuf,

        /// Skip images that cannot be exported instead of stopping
        #[arg(long)]
        keep_going: bool,

        /// Skip pages that cannot be read instead of stopping
        #[arg(long)]
        skip_bad_pages: bool,

        /// Fail instead of replacing files that already exist
        #[arg(long)]
        no_overwrite: bool,

        /// Name files p<page>_<name>.png
        #[arg(long)]
        page_prefix: bool,

        /// Encode each page's images in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the export records as JSON
        #[arg(long)]
        json: bool,
    },

    /// List image-painting operations without exporting
    Scan {
        /// PDF file to inspect
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Export {
            inputs,
            output,
            keep_going,
            skip_bad_pages,
            no_overwrite,
            page_prefix,
            parallel,
            json,
        } => {
            let options = ExportOptions {
                on_image_error: policy(keep_going),
                on_page_error: policy(skip_bad_pages),
                overwrite: !no_overwrite,
                file_naming: if page_prefix {
                    FileNaming::PagePrefixed
                } else {
                    FileNaming::ImageName
                },
                parallel,
                cancel: None,
            };
            cmd_export(inputs, output, &options, json)
        }
        Commands::Scan { input, json } => cmd_scan(input, json),
        Commands::Info { input } => cmd_info(input),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("pdf_image_export=info"),
        2 => EnvFilter::new("pdf_image_export=debug"),
        _ => EnvFilter::new("pdf_image_export=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn policy(skip: bool) -> FailurePolicy {
    if skip {
        FailurePolicy::SkipAndContinue
    } else {
        FailurePolicy::Abort
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();
    paths.dedup();

    Ok(paths)
}

/// Where each input's images go: `output` itself for a single input,
/// otherwise `output/<stem>`, with `-<n>` added to stems that repeat
fn destinations(inputs: &[PathBuf], output: &Path) -> Vec<PathBuf> {
    if inputs.len() <= 1 {
        return vec![output.to_path_buf(); inputs.len()];
    }

    let stems: Vec<String> = inputs
        .iter()
        .map(|input| {
            input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "document".to_string())
        })
        .collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }

    let mut taken = HashSet::new();
    stems
        .iter()
        .map(|stem| {
            let mut n = 1;
            let mut dir = if counts[stem.as_str()] > 1 {
                format!("{}-{}", stem, n)
            } else {
                stem.clone()
            };
            while !taken.insert(dir.clone()) {
                n += 1;
                dir = format!("{}-{}", stem, n);
            }
            output.join(dir)
        })
        .collect()
}

/// Export the images of every input; Ok(false) when anything was skipped
fn cmd_export(inputs: Vec<String>, output: PathBuf, options: &ExportOptions, json: bool) -> Result<bool> {
    let inputs = expand_globs(inputs)?;

    // Validate inputs exist
    for path in &inputs {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }

    let dests = destinations(&inputs, &output);
    let mut records: Vec<ExportRecord> = Vec::new();
    let mut complete = true;

    for (input, dest) in inputs.iter().zip(&dests) {
        let report = export_images_with(input, dest, options)
            .with_context(|| format!("Failed to export images from {}", input.display()))?;

        for failure in &report.failures {
            complete = false;
            match &failure.name {
                Some(name) => eprintln!(
                    "Skipped {} page {} image {}: {}",
                    input.display(),
                    failure.page,
                    name,
                    failure.error
                ),
                None => eprintln!("Skipped {} page {}: {}", input.display(), failure.page, failure.error),
            }
        }

        if !json {
            eprintln!(
                "{}: {} images from {} pages -> {}",
                input.display(),
                report.records.len(),
                report.pages,
                dest.display()
            );
        }
        records.extend(report.records);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            println!(
                "{}\t{}x{}\t{} ch\t{}\t{}",
                record.name,
                record.width,
                record.height,
                record.channels,
                record.kind,
                record.file.display()
            );
        }
    }

    Ok(complete)
}

/// List the image-painting operations of a PDF
fn cmd_scan(input: PathBuf, json: bool) -> Result<bool> {
    let document = LopdfDocument::load(&input)?;
    let refs = scan(&document)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&refs)?);
        return Ok(true);
    }

    for image in &refs {
        let scope = image
            .scope
            .map_or_else(|| "unresolved".to_string(), |scope| scope.to_string());
        let kind = if image.inline { "inline" } else { "xobject" };
        println!("page {}\t{}\t{}\t{}", image.page, image.name, kind, scope);
    }
    Ok(true)
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<bool> {
    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    println!("Images: {}", metadata.image_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(true)
}
