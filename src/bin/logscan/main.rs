//! logscan: filter and summarize Android logcat output.
//!
//! Reads `threadtime` formatted logcat from files, directories or glob
//! patterns (stdin when none are given) and prints the lines that pass the
//! level and tag filters, or per-level counts with `--count`.
//!
//! All flags are declared as optbind option sources, so every flag is also
//! reachable as `--scan:<name>` / `--out:<name>`.

mod logcat;

use anyhow::{Context, Result};
use optbind::{ArgsOptionParser, ConfigError, OptionClass, OptionField, OptionSource};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use logcat::{Filter, Level, LevelCounts};

/// File extensions picked up when a directory is given.
const SUPPORTED_EXTENSIONS: &[&str] = &["log", "txt"];

const USAGE: &str = "usage: logscan [options] [FILE|DIR|GLOB]...\n\n\
                     Reads logcat threadtime output from the given inputs, or stdin.\n\noptions:\n";

// -- Options ------------------------------------------------------------------

#[derive(Debug, Default)]
struct ScanOptions {
    min_level: Level,
    tags: Vec<String>,
    tag_levels: HashMap<String, Level>,
    count: bool,
    limit: Option<i64>,
    help: bool,
}

impl OptionSource for ScanOptions {
    fn class_name(&self) -> String {
        "logscan.ScanOptions".to_string()
    }

    fn option_class(&self) -> OptionClass {
        OptionClass::alias("scan")
    }

    fn options(&mut self) -> Vec<OptionField<'_>> {
        vec![
            OptionField::new("min-level", &mut self.min_level)
                .short('l')
                .description("Lowest level to print."),
            OptionField::new("tag", &mut self.tags)
                .short('t')
                .description("Only print lines with this tag. May be repeated."),
            OptionField::new("tag-level", &mut self.tag_levels)
                .description("Minimum level for one tag, as TAG LEVEL or TAG=LEVEL."),
            OptionField::new("count", &mut self.count)
                .short('c')
                .description("Print the number of matching lines per level."),
            OptionField::new("limit", &mut self.limit)
                .short('n')
                .description("Stop after this many matching lines."),
            OptionField::new("help", &mut self.help)
                .short('h')
                .description("Show this help."),
        ]
    }
}

#[derive(Debug, Default)]
struct OutputOptions {
    output: Option<PathBuf>,
    header: Option<String>,
}

impl OptionSource for OutputOptions {
    fn class_name(&self) -> String {
        "logscan.OutputOptions".to_string()
    }

    fn option_class(&self) -> OptionClass {
        OptionClass::alias("out")
    }

    fn options(&mut self) -> Vec<OptionField<'_>> {
        vec![
            OptionField::new("output", &mut self.output)
                .short('o')
                .description("Write to this file instead of stdout."),
            OptionField::new("header", &mut self.header)
                .description("Line printed before any output."),
        ]
    }
}

// -- Entry point --------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<ConfigError>().is_some() => {
            eprintln!("Error: {}", err);
            eprintln!("Run 'logscan --help' for usage.");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let mut scan = ScanOptions::default();
    let mut out = OutputOptions::default();

    let inputs = {
        let mut parser = ArgsOptionParser::builder()
            .source(&mut scan)
            .source(&mut out)
            .build()?;
        parser.parse(args)?
    };
    log::debug!("options: {:?} {:?}", scan, out);

    if scan.help {
        print!("{}", usage(&mut scan, &mut out));
        return Ok(());
    }

    let filter = Filter {
        min_level: scan.min_level,
        tags: scan.tags.iter().cloned().collect(),
        tag_levels: scan.tag_levels.clone(),
    };
    let limit = match scan.limit {
        Some(n) if n < 0 => anyhow::bail!("--limit must not be negative, got {}", n),
        Some(n) => Some(usize::try_from(n).context("--limit is too large")?),
        None => None,
    };

    let mut writer: Box<dyn Write> = match &out.output {
        Some(path) => Box::new(BufWriter::new(
            fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    if let Some(header) = &out.header {
        writeln!(writer, "{}", header)?;
    }

    let texts = read_inputs(&inputs)?;
    let mut counts = LevelCounts::default();
    let mut printed = 0usize;
    let mut skipped = 0usize;
    'inputs: for text in &texts {
        for raw in text.lines() {
            let Some(line) = logcat::parse_line(raw) else {
                skipped += 1;
                continue;
            };
            if !filter.keeps(&line) {
                continue;
            }
            if scan.count {
                counts.record(line.level);
                continue;
            }
            if limit.is_some_and(|limit| printed >= limit) {
                break 'inputs;
            }
            writeln!(writer, "{}", raw)?;
            printed += 1;
        }
    }
    log::debug!("printed {} lines, skipped {} unparseable", printed, skipped);

    if scan.count {
        write!(writer, "{}", counts)?;
    }
    writer.flush().context("failed to write output")?;
    Ok(())
}

fn usage(scan: &mut ScanOptions, out: &mut OutputOptions) -> String {
    let mut text = String::from(USAGE);
    text.push_str(&optbind::option_help(false, scan));
    text.push_str(&optbind::option_help(false, out));
    text
}

/// Contents of every input, or of stdin when there are none.
fn read_inputs(patterns: &[String]) -> Result<Vec<String>> {
    if patterns.is_empty() {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(vec![input]);
    }
    let files = resolve_inputs(patterns)?;
    if files.is_empty() {
        anyhow::bail!("no input files found");
    }
    files
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

/// Resolve inputs to files, in argument order. A directory contributes its
/// log files sorted by name; a path seen twice is read once.
fn resolve_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        let found = if path.is_file() {
            vec![path.to_path_buf()]
        } else if path.is_dir() {
            let logs = log_files_in(path)?;
            if logs.is_empty() {
                eprintln!("warning: no log files in directory: {}", pattern);
            }
            logs
        } else {
            let matches: Vec<PathBuf> = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {}", pattern))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();
            if matches.is_empty() {
                eprintln!("warning: no files matched: {}", pattern);
            }
            matches
        };
        files.extend(found.into_iter().filter(|p| seen.insert(p.clone())));
    }
    Ok(files)
}

fn log_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    let mut logs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        })
        .collect();
    logs.sort();
    Ok(logs)
}
