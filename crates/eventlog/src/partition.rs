//! Canonical filesystem layout for event-log files.
//!
//! One file per symbol per UTC calendar day:
//! `{base}/{SYMBOL}/{YYYY}/{MM}/{DD}.parquet`, zero-padded so that
//! lexicographic order equals chronological order. In-progress writes live
//! at `{canonical}.partial` and are never part of this namespace.

use chrono::{DateTime, Datelike, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub const FILE_EXTENSION: &str = "parquet";

fn utc_date(ts_ns: i64) -> (i32, u32, u32) {
    let dt = DateTime::<Utc>::from_timestamp(
        ts_ns.div_euclid(1_000_000_000),
        ts_ns.rem_euclid(1_000_000_000) as u32,
    )
    .unwrap_or(DateTime::UNIX_EPOCH);
    (dt.year(), dt.month(), dt.day())
}

/// Canonical path for a symbol at a timestamp (UTC calendar day).
pub fn partition_path(base: &Path, symbol: &str, ts_ns: i64) -> PathBuf {
    let (year, month, day) = utc_date(ts_ns);
    partition_path_for_date(base, symbol, year, month, day)
}

/// Canonical path for a symbol on a specific date.
pub fn partition_path_for_date(
    base: &Path,
    symbol: &str,
    year: i32,
    month: u32,
    day: u32,
) -> PathBuf {
    base.join(symbol)
        .join(format!("{year:04}"))
        .join(format!("{month:02}"))
        .join(format!("{day:02}.{FILE_EXTENSION}"))
}

fn digits(segment: &str, len: usize) -> bool {
    segment.len() == len && segment.bytes().all(|b| b.is_ascii_digit())
}

fn date_parts(path: &Path) -> Option<(i32, u32, u32)> {
    if path.extension()?.to_str()? != FILE_EXTENSION {
        return None;
    }
    let day = path.file_stem()?.to_str()?;
    let month_dir = path.parent()?;
    let month = month_dir.file_name()?.to_str()?;
    let year_dir = month_dir.parent()?;
    let year = year_dir.file_name()?.to_str()?;

    if !digits(day, 2) || !digits(month, 2) || !digits(year, 4) {
        return None;
    }
    Some((year.parse().ok()?, month.parse().ok()?, day.parse().ok()?))
}

fn symbol_part(path: &Path) -> Option<String> {
    date_parts(path)?;
    let symbol = path
        .parent()?
        .parent()?
        .parent()?
        .file_name()?
        .to_str()?;
    let valid = !symbol.is_empty()
        && symbol
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    valid.then(|| symbol.to_string())
}

/// Symbol segment of a canonical path; empty string when the path does not
/// match the layout.
pub fn extract_symbol(path: &Path) -> String {
    symbol_part(path).unwrap_or_default()
}

/// Date components of a canonical path; `(0, 0, 0)` when the path does not
/// match the layout.
pub fn extract_date(path: &Path) -> (i32, u32, u32) {
    date_parts(path).unwrap_or((0, 0, 0))
}

/// All event-log files for a symbol, sorted (and therefore chronological).
pub fn list_files(base: &Path, symbol: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files(&base.join(symbol), &mut files);
    files.sort();
    files
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION) {
            out.push(path);
        }
    }
}

/// All symbols under a base directory, sorted.
pub fn list_symbols(base: &Path) -> Vec<String> {
    let mut symbols = Vec::new();
    if let Ok(entries) = fs::read_dir(base) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    symbols.push(name.to_string());
                }
            }
        }
    }
    symbols.sort();
    symbols
}
