use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use khmer_normalizer::input::InputText;
use khmer_normalizer::{Normalizer, NormalizerConfig, PatternLibrary, Report, Validator, Variant};

#[derive(Parser, Debug)]
#[command(name = "khnormal")]
#[command(about = "Normalize Khmer text and check it against the syllable grammar", long_about = None)]
struct Cli {
    /// Text to process when no input files are given
    text: Vec<String>,

    /// Input files, processed line by line
    #[arg(long = "input", visible_alias = "file", num_args = 1..)]
    input: Vec<PathBuf>,

    /// Write results here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Spelling convention: km (modern Khmer) or xhm (Middle Khmer)
    #[arg(long, env = "KHNORMAL_LANG", default_value = "km")]
    lang: Variant,

    /// Check the normalized text against the syllable grammar
    #[arg(long)]
    check: bool,

    /// Emit one JSON object per line
    #[arg(long)]
    json: bool,

    /// Only sort syllables, skip the rewrite rules
    #[arg(long)]
    no_rewrite: bool,

    /// Stop after this many lines
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, default_value_t = 4)]
    threads: usize,
}

#[derive(Serialize)]
struct LineResult<'a> {
    line: usize,
    input: &'a str,
    normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<Report>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(?cli, "parsed arguments");

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads.max(1))
        .build_global()
        .context("failed to configure thread pool")?;

    let library = PatternLibrary::build().context("failed to build Khmer grammar")?;
    let config = NormalizerConfig {
        variant: cli.lang,
        enable_rewrite_rules: !cli.no_rewrite,
    };
    let normalizer = Normalizer::with_library(&library, config)?;
    let validator = if cli.check {
        Some(Validator::with_library(&library)?)
    } else {
        None
    };

    let sources = cli
        .input
        .iter()
        .map(|path| {
            InputText::load(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let joined = cli.text.join(" ");
    let mut lines: Vec<&str> = Vec::new();
    if sources.is_empty() {
        if joined.is_empty() {
            anyhow::bail!("nothing to do: pass some text or --input <files>");
        }
        lines.push(&joined);
    } else {
        for (source, path) in sources.iter().zip(&cli.input) {
            let text = source
                .lines()
                .with_context(|| format!("failed to decode {}", path.display()))?;
            lines.extend(text);
        }
    }
    if let Some(limit) = cli.limit {
        lines.truncate(limit);
    }

    let start = Instant::now();
    let results: Vec<LineResult> = lines
        .par_iter()
        .enumerate()
        .map(|(i, &line)| {
            let normalized = normalizer.normalize(line);
            let report = validator.as_ref().map(|v| v.segments(&normalized));
            LineResult {
                line: i + 1,
                input: line,
                normalized,
                passed: report.as_ref().map(Report::passed),
                report,
            }
        })
        .collect();
    info!(
        lines = results.len(),
        elapsed = ?start.elapsed(),
        "processed input"
    );

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut failed = 0usize;
    for result in &results {
        if result.passed == Some(false) {
            failed += 1;
        }
        if cli.json {
            serde_json::to_writer(&mut out, result)?;
            writeln!(out)?;
            continue;
        }
        match &result.report {
            Some(report) => match report.diagnostic() {
                Some(diagnostic) => writeln!(out, "{}\t{}", result.normalized, diagnostic)?,
                None => writeln!(out, "{}\tok", result.normalized)?,
            },
            None => writeln!(out, "{}", result.normalized)?,
        }
    }
    out.flush()?;

    if failed > 0 {
        info!(failed, "lines did not conform");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
