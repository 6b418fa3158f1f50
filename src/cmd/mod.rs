//! Command-line entry point: scan a dump, build the key graph, render it.

use crate::grammar::classify;
use crate::input::Compression;
use crate::progress::ProgressReader;
use crate::render::{to_dot, to_json, HeaderInfo, Layout, OutputFormat};
use crate::scanner::{determine_buffer_size, Scanner, SMALL_BUFFER_SIZE};
use crate::schema::{GraphWarning, Item, SchemaGraph};
use crate::select::Selection;
use ahash::AHashSet;
use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "schemadot")]
#[command(version)]
#[command(about = "Render the foreign-key graph of a SQL schema dump as a Graphviz diagram", long_about = None)]
pub struct Cli {
    /// Input SQL schema dump; reads stdin when omitted.
    /// Supports .gz, .bz2, .xz, .zst compression
    pub file: Option<PathBuf>,

    /// Highlight these tables and keep only their connected components
    #[arg(
        short,
        long,
        value_name = "TABLE",
        value_delimiter = ',',
        conflicts_with = "filter_path"
    )]
    pub filter: Vec<String>,

    /// Keep only tables and keys on paths between the given tables (at least two)
    #[arg(short = 'p', long, value_name = "TABLE", value_delimiter = ',')]
    pub filter_path: Vec<String>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: dot or json (detected from the output extension when omitted)
    #[arg(long)]
    pub format: Option<String>,

    /// Diagram direction: lr or tb
    #[arg(long, default_value = "lr")]
    pub layout: String,

    /// Skip the generated-at comment header
    #[arg(long)]
    pub no_header: bool,

    /// Render the output to PNG/SVG/PDF with the Graphviz `dot` command
    #[arg(long)]
    pub render: bool,

    /// Show progress while scanning the input
    #[arg(long)]
    pub progress: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let format = resolve_format(&cli)?;
    let layout = cli
        .layout
        .parse::<Layout>()
        .map_err(|e| anyhow::anyhow!(e))?;

    if !cli.filter_path.is_empty() {
        let distinct: AHashSet<&str> = cli.filter_path.iter().map(String::as_str).collect();
        if distinct.len() < 2 {
            bail!("--filter-path needs at least two distinct table names");
        }
    }

    let (graph, mut warnings) = scan_input(&cli)?;

    let (selection, selection_warnings) = if !cli.filter.is_empty() {
        Selection::neighborhood(&graph, &cli.filter)
    } else if !cli.filter_path.is_empty() {
        Selection::paths(&graph, &cli.filter_path)
    } else {
        (Selection::unfiltered(&graph), Vec::new())
    };
    warnings.extend(selection_warnings);

    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    let header = if cli.no_header || format != OutputFormat::Dot {
        None
    } else {
        Some(HeaderInfo {
            source: cli
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<stdin>".to_string()),
            created: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    };

    let output_content = match format {
        OutputFormat::Dot => to_dot(&graph, &selection, layout, header.as_ref()),
        OutputFormat::Json => to_json(&graph, &selection),
    };

    let should_render = cli.render
        || cli
            .output
            .as_ref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "png" | "svg" | "pdf"))
            .unwrap_or(false);

    if should_render {
        if format != OutputFormat::Dot {
            bail!("only dot output can be rendered with Graphviz");
        }
        return match cli.output {
            Some(ref out_path) => render_with_graphviz(&output_content, out_path),
            None => bail!("--render requires --output"),
        };
    }

    if let Some(ref out_path) = cli.output {
        let mut file = File::create(out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        file.write_all(output_content.as_bytes())?;
        eprintln!("Diagram written to: {}", out_path.display());
    } else {
        print!("{output_content}");
        if !output_content.ends_with('\n') {
            println!();
        }
    }

    if format != OutputFormat::Json {
        let table_count = selection
            .items
            .iter()
            .filter(|item| matches!(item, Item::Table(_)))
            .count();
        let key_count = selection.items.len() - table_count;
        eprintln!("\nSchema graph: {table_count} tables, {key_count} foreign keys");
    }

    Ok(())
}

/// Pick the output format from --format, falling back to the output
/// file extension, then to dot.
fn resolve_format(cli: &Cli) -> Result<OutputFormat> {
    if let Some(ref name) = cli.format {
        return name.parse().map_err(|e: String| anyhow::anyhow!(e));
    }

    if let Some(format) = cli
        .output
        .as_ref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
    {
        return Ok(format);
    }

    Ok(OutputFormat::Dot)
}

/// Scan the whole input and build the schema graph from it.
fn scan_input(cli: &Cli) -> Result<(SchemaGraph, Vec<GraphWarning>)> {
    let (reader, buffer_size, pb) = open_input(cli)?;
    let mut scanner = Scanner::new(reader, buffer_size);

    let mut statements = Vec::new();
    while let Some(span) = scanner.read_span()? {
        let text = String::from_utf8_lossy(&span);
        statements.push(classify(&text)?);
    }

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    Ok(SchemaGraph::from_statements(statements))
}

/// Open the input stream, wiring up decompression and the optional
/// progress bar. Progress wraps the raw file handle so positions track
/// the on-disk size even for compressed dumps.
fn open_input(cli: &Cli) -> Result<(Box<dyn Read>, usize, Option<ProgressBar>)> {
    let path = match cli.file {
        Some(ref path) => path,
        None => return Ok((Box::new(std::io::stdin()), SMALL_BUFFER_SIZE, None)),
    };

    if !path.exists() {
        bail!("input file does not exist: {}", path.display());
    }

    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let file_size = file.metadata()?.len();
    let buffer_size = determine_buffer_size(file_size);
    let compression = Compression::from_path(path);

    let pb = if cli.progress {
        Some(make_progress_bar(file_size))
    } else {
        None
    };

    let raw: Box<dyn Read> = if let Some(ref pb) = pb {
        let pb_clone = pb.clone();
        Box::new(ProgressReader::new(file, move |bytes| {
            pb_clone.set_position(bytes)
        }))
    } else {
        Box::new(file)
    };

    Ok((compression.wrap_reader(raw)?, buffer_size, pb))
}

fn make_progress_bar(file_size: u64) -> ProgressBar {
    let pb = ProgressBar::new(file_size);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
        )
        .unwrap()
        .progress_chars("█▓▒░  ")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Render DOT to PNG/SVG/PDF using Graphviz
fn render_with_graphviz(dot_source: &str, output_path: &Path) -> Result<()> {
    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");

    let format_arg = format!("-T{}", ext);

    let mut child = Command::new("dot")
        .arg(&format_arg)
        .arg("-o")
        .arg(output_path)
        .stdin(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!(
                    "Graphviz 'dot' command not found. Install Graphviz or write .dot output instead."
                )
            } else {
                anyhow::anyhow!("Failed to run dot: {}", e)
            }
        })?;

    if let Some(ref mut stdin) = child.stdin {
        stdin.write_all(dot_source.as_bytes())?;
    }

    let status = child.wait()?;
    if !status.success() {
        bail!("Graphviz dot command failed with status: {}", status);
    }

    eprintln!("Rendered to: {}", output_path.display());
    Ok(())
}
