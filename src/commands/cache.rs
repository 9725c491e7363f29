//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which provides functionality
//! for managing the local download cache. The cache is never evicted
//! automatically; this command is the only way to shrink it.
//!
//! ## Subcommands
//!
//! - **`list`**: Display all cache entries with their size and source
//! - **`clean`**: Remove cache entries based on filters (--all, --key, --older-than)

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use furyctl::cache::{CacheEntryInfo, CacheKey, DownloadCache};

/// Manage the download cache
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List all cache entries
    List(ListArgs),
    /// Remove cache entries
    Clean(CleanArgs),
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show detailed information including last modified time and file count
    #[arg(long)]
    pub detailed: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Delete all cache entries
    #[arg(long, conflicts_with = "key")]
    pub all: bool,

    /// Delete the entry with this key, as printed by `cache list`
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,

    /// Delete entries older than the specified duration
    ///
    /// Duration format: number followed by unit (s, m, h, d, w)
    /// Examples: "30d", "7d", "1h", "30m", "2w"
    #[arg(long, value_name = "DURATION")]
    pub older_than: Option<String>,

    /// Skip confirmation prompt and delete immediately
    #[arg(long)]
    pub yes: bool,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    key: &'a str,
    source: Option<&'a str>,
    size: u64,
    file_count: usize,
    last_modified: Option<u64>,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs, cache_root: &Path) -> Result<()> {
    let cache = DownloadCache::new(cache_root);
    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&cache, list_args),
        CacheSubcommand::Clean(clean_args) => execute_clean(&cache, clean_args),
    }
}

fn execute_list(cache: &DownloadCache, args: ListArgs) -> Result<()> {
    let entries = cache
        .entries()
        .with_context(|| format!("Failed to read cache at {}", cache.root().display()))?;

    if entries.is_empty() {
        if args.json {
            println!("[]");
        } else {
            println!("No cache entries found in: {}", cache.root().display());
        }
        return Ok(());
    }

    if args.json {
        display_json(&entries)?;
    } else if args.detailed {
        display_detailed(&entries);
    } else {
        display_table(&entries);
    }

    Ok(())
}

fn execute_clean(cache: &DownloadCache, args: CleanArgs) -> Result<()> {
    if !args.all && args.key.is_none() && args.older_than.is_none() {
        anyhow::bail!(
            "No filter specified.\n\nUse one of:\n  furyctl cache clean --all\n  furyctl cache clean --key <KEY>\n  furyctl cache clean --older-than <DURATION>"
        );
    }

    let key = args
        .key
        .as_deref()
        .map(|raw| {
            CacheKey::parse(raw)
                .with_context(|| format!("Invalid cache key '{}': expected 64 hex characters", raw))
        })
        .transpose()?;
    let older_than = args.older_than.as_deref().map(parse_duration).transpose()?;

    let entries = cache.entries()?;
    let to_delete = filter_entries(&entries, args.all, key.as_ref(), older_than, SystemTime::now());
    if to_delete.is_empty() {
        println!("No cache entries match the specified criteria.");
        return Ok(());
    }

    let total_size: u64 = to_delete.iter().map(|e| e.size).sum();
    println!("Cache entries to be deleted:\n");
    for entry in &to_delete {
        println!(
            "  {} {} ({})",
            &entry.key.as_str()[..16],
            entry.source.as_deref().unwrap_or("(unknown source)"),
            format_size(entry.size)
        );
    }
    println!("\nTotal: {} entries ({})", to_delete.len(), format_size(total_size));

    if args.dry_run {
        println!("\nDry run mode - no changes were made.");
        return Ok(());
    }
    if !args.yes && !confirm("Delete these cache entries?")? {
        println!("Clean cancelled.");
        return Ok(());
    }

    let deleted = if args.all {
        cache.clear()?
    } else {
        to_delete
            .iter()
            .filter(|entry| match cache.remove(&entry.key) {
                Ok(existed) => existed,
                Err(e) => {
                    eprintln!("  Failed to delete {}: {}", entry.path.display(), e);
                    false
                }
            })
            .count()
    };
    println!("\nDeleted {} cache entries.", deleted);

    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("\n{} (y/N): ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Selects the entries a clean removes.
fn filter_entries<'a>(
    entries: &'a [CacheEntryInfo],
    all: bool,
    key: Option<&CacheKey>,
    older_than: Option<Duration>,
    now: SystemTime,
) -> Vec<&'a CacheEntryInfo> {
    entries
        .iter()
        .filter(|entry| {
            if all {
                return true;
            }
            if key.is_some_and(|k| *k == entry.key) {
                return true;
            }
            match (older_than, entry.modified) {
                (Some(threshold), Some(modified)) => now
                    .duration_since(modified)
                    .map(|age| age >= threshold)
                    .unwrap_or(true),
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
        .collect()
}

/// Parses `<number><unit>` where unit is one of s, m, h, d, w (long forms
/// such as `days` are accepted), e.g. `30d` or `1.5h`.
fn parse_duration(raw: &str) -> Result<Duration> {
    const UNITS: &[(&[&str], u64)] = &[
        (&["s", "sec", "secs", "second", "seconds"], 1),
        (&["m", "min", "mins", "minute", "minutes"], 60),
        (&["h", "hr", "hrs", "hour", "hours"], 3_600),
        (&["d", "day", "days"], 86_400),
        (&["w", "week", "weeks"], 604_800),
    ];

    let raw = raw.trim().to_ascii_lowercase();
    let unit_start = raw
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(raw.len());
    let (amount, unit) = raw.split_at(unit_start);

    if amount.is_empty() {
        anyhow::bail!("Duration must start with a number");
    }
    let amount: f64 = amount
        .parse()
        .with_context(|| format!("Invalid number in duration: '{}'", amount))?;
    let (_, factor) = UNITS
        .iter()
        .find(|(names, _)| names.contains(&unit))
        .ok_or_else(|| anyhow::anyhow!("Invalid duration unit: '{}'. Valid units: s, m, h, d, w", unit))?;

    Duration::try_from_secs_f64(amount * *factor as f64)
        .with_context(|| format!("Duration '{}' is out of range", raw))
}

fn display_table(entries: &[CacheEntryInfo]) {
    println!("Cache entries:\n");
    println!("{:<16} {:<50} {:>12}", "KEY", "SOURCE", "SIZE");
    println!("{}", "-".repeat(80));

    for entry in entries {
        let source = entry.source.as_deref().unwrap_or("(unknown)");
        println!(
            "{:<16} {:<50} {:>12}",
            &entry.key.as_str()[..16],
            truncate(source, 50),
            format_size(entry.size)
        );
    }

    println!("\nTotal: {} cache entries", entries.len());
}

fn display_detailed(entries: &[CacheEntryInfo]) {
    println!("Cache entries:\n");

    for (i, entry) in entries.iter().enumerate() {
        println!("Entry {}:", i + 1);
        println!("  Key: {}", entry.key);
        println!("  Source: {}", entry.source.as_deref().unwrap_or("(unknown)"));
        println!("  Path: {}", entry.path.display());
        println!("  Size: {}", format_size(entry.size));
        println!("  Files: {}", entry.file_count);
        match entry.modified.and_then(|m| SystemTime::now().duration_since(m).ok()) {
            Some(age) => println!("  Last Modified: {} seconds ago", age.as_secs()),
            None => println!("  Last Modified: (unknown)"),
        }
        if i < entries.len() - 1 {
            println!();
        }
    }

    println!("\nTotal: {} cache entries", entries.len());
}

fn display_json(entries: &[CacheEntryInfo]) -> Result<()> {
    let json_entries: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|e| JsonEntry {
            key: e.key.as_str(),
            source: e.source.as_deref(),
            size: e.size,
            file_count: e.file_count,
            last_modified: e
                .modified
                .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_entries)?);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Human-readable size with binary units, e.g. `2.00 KB`.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    format!("{:.2} {}", size, unit)
}
