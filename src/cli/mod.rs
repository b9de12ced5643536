//! CLI module - Command line interface definitions and handlers

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::detect::{find_by_extension, CfbfDetector, ClsidRecord};
use crate::guid::Guid;
use crate::scan::{self, ScanOptions, SniffReport};

/// cfbf-sniff - Identify documents inside OLE2 compound files
///
/// Reads only the header and the root directory entry's CLSID, never the
/// whole file. All operations are READ-ONLY.
#[derive(Parser, Debug)]
#[command(name = "cfbf-sniff")]
#[command(author = "Ryan Cashmoney <tunclon@proton.me>")]
#[command(version)]
#[command(about = "Identify Word/Excel/PowerPoint/Visio/Publisher/MSI compound files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the document type of files
    Sniff(SniffArgs),

    /// List known CLSIDs
    List(ListArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct SniffArgs {
    /// Files or directories to sniff
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Descend into directories
    #[arg(long, short)]
    pub recursive: bool,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Number of files sniffed at once (default: from config, else CPU count)
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
    /// Only entries reporting this extension (e.g. doc, .xls)
    #[arg(long, short)]
    pub ext: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Human,
    /// JSON for machine parsing
    Json,
}

impl SniffArgs {
    /// Merge command-line flags over the config file's scan section
    pub fn scan_options(&self, config: &Config) -> ScanOptions {
        ScanOptions {
            recursive: self.recursive || config.scan.recursive,
            follow_symlinks: config.scan.follow_symlinks,
            skip_hidden: !self.hidden && config.scan.skip_hidden,
            concurrency: self
                .concurrency
                .filter(|&n| n > 0)
                .unwrap_or_else(|| config.scan.concurrency()),
        }
    }
}

/// Run `sniff`. Returns false when any file could not be read.
pub async fn run_sniff(args: &SniffArgs, config: &Config) -> Result<bool> {
    let detector = Arc::new(CfbfDetector::with_options(config.detector.options()));
    let options = args.scan_options(config);

    let reports = scan::sniff_paths(detector, &args.paths, &options).await?;

    match args.output {
        OutputFormat::Human => {
            for report in &reports {
                println!("{}", format_report(report));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(reports.iter().all(|r| !r.is_error()))
}

/// One human-readable line per file
pub fn format_report(report: &SniffReport) -> String {
    let path = report.path.display().to_string();
    match (&report.detection, &report.error) {
        (_, Some(error)) => format!("{}: {}", path, format!("error: {}", error).red()),
        (Some(found), None) => format!(
            "{}: {} {} ({})",
            path,
            found.extension.green().bold(),
            found.mime,
            found.name.dimmed()
        ),
        (None, None) => format!("{}: {}", path, "-".dimmed()),
    }
}

/// Registry row for `list`
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub name: &'static str,
    pub clsid: &'static str,
    pub ext: &'static str,
    pub mime: &'static str,
    /// CLSID bytes as stored in the file, hex
    pub on_disk: String,
}

/// Registry rows, filtered by extension when given
pub fn list_entries(records: &'static [ClsidRecord], ext: Option<&str>) -> Result<Vec<ListEntry>> {
    let selected: Vec<&ClsidRecord> = match ext {
        Some(ext) => find_by_extension(records, ext).collect(),
        None => records.iter().collect(),
    };

    selected
        .into_iter()
        .map(|record| {
            let guid = Guid::parse(record.clsid)?;
            Ok(ListEntry {
                name: record.name,
                clsid: record.clsid,
                ext: record.extension,
                mime: record.mime,
                on_disk: hex::encode(guid.as_bytes()),
            })
        })
        .collect()
}

/// Run `list`
pub fn run_list(args: &ListArgs) -> Result<()> {
    let entries = list_entries(CfbfDetector::new().records(), args.ext.as_deref())?;

    match args.output {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("{}", "No matching CLSIDs".yellow());
            }
            for entry in &entries {
                println!(
                    "{:<4} {}  {}  {}",
                    entry.ext.green().bold(),
                    entry.clsid,
                    entry.on_disk.dimmed(),
                    entry.name
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, CFBF_CLSIDS};

    #[test]
    fn test_parse_sniff_command() {
        let cli = Cli::try_parse_from([
            "cfbf-sniff", "sniff", "-r", "-j", "4", "--output", "json", "a.doc", "dir",
        ])
        .unwrap();
        match cli.command {
            Commands::Sniff(args) => {
                assert!(args.recursive);
                assert_eq!(args.concurrency, Some(4));
                assert_eq!(args.output, OutputFormat::Json);
                assert_eq!(args.paths, vec![PathBuf::from("a.doc"), PathBuf::from("dir")]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_sniff_requires_paths() {
        assert!(Cli::try_parse_from(["cfbf-sniff", "sniff"]).is_err());
    }

    #[test]
    fn test_scan_options_merge() {
        let cli = Cli::try_parse_from(["cfbf-sniff", "sniff", "--hidden", "x"]).unwrap();
        let Commands::Sniff(args) = cli.command else {
            panic!("expected sniff");
        };

        let mut config = Config::default();
        config.scan.concurrency = 5;
        config.scan.recursive = true;

        let options = args.scan_options(&config);
        assert!(options.recursive);
        assert!(!options.skip_hidden);
        assert_eq!(options.concurrency, 5);
    }

    #[test]
    fn test_list_entries() {
        let all = list_entries(CFBF_CLSIDS, None).unwrap();
        assert_eq!(all.len(), CFBF_CLSIDS.len());

        let docs = list_entries(CFBF_CLSIDS, Some("doc")).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].on_disk, "0609020000000000c000000000000046");
    }

    #[test]
    fn test_format_report() {
        let found = SniffReport {
            path: PathBuf::from("report.doc"),
            detection: Some(Detection::from(&CFBF_CLSIDS[1])),
            error: None,
        };
        let line = format_report(&found);
        assert!(line.starts_with("report.doc: "));
        assert!(line.contains("application/msword"));

        let failed = SniffReport {
            path: PathBuf::from("gone.doc"),
            detection: None,
            error: Some("No such file".to_string()),
        };
        assert!(format_report(&failed).contains("No such file"));
    }
}
