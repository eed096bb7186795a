//! Weave command: discover units, weave them, keep the cache warm

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use dbc_weave::{WeaveCache, Weaver};

use crate::cli::output::{report, OutputFormat, UnitOutcome, UnitReport};

/// Weave every discovered unit, serving unchanged ones from the cache.
/// Returns the process exit code.
pub fn handle_weave(
    paths: Vec<PathBuf>,
    cache_dir: &Path,
    force: bool,
    format: OutputFormat,
) -> i32 {
    let units = match discover_units(&paths) {
        Ok(units) => units,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };
    if units.is_empty() {
        eprintln!("No source units found under the given paths");
        return 1;
    }

    let cache = WeaveCache::new(cache_dir);
    let weaver = Weaver::new();
    let mut reports = Vec::with_capacity(units.len());

    for unit in units {
        let identity = unit.to_string_lossy().to_string();
        let outcome = weave_unit(&weaver, &cache, &unit, &identity, force);
        reports.push(UnitReport { identity, outcome });
    }

    report(&reports, format)
}

fn weave_unit(
    weaver: &Weaver,
    cache: &WeaveCache,
    path: &Path,
    identity: &str,
    force: bool,
) -> UnitOutcome {
    let mtime = match modification_time(path) {
        Ok(mtime) => mtime,
        Err(e) => return UnitOutcome::Failed { error: format!("{:#}", e) },
    };

    if !force && cache.is_fresh(identity, mtime) {
        log::debug!("cache entry for `{}` is fresh", identity);
        return UnitOutcome::Cached;
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return UnitOutcome::Failed {
                error: format!("could not read unit: {}", e),
            }
        }
    };

    match weaver.weave(&source, identity, mtime) {
        Ok(woven) => {
            if let Err(e) = cache.store(identity, &woven) {
                return UnitOutcome::Failed {
                    error: format!("weave succeeded but cache store failed: {}", e),
                };
            }
            let functions = weaver
                .parse(&source)
                .map(|d| d.functions.len())
                .unwrap_or(0);
            UnitOutcome::Woven { functions }
        }
        Err(e) => UnitOutcome::Failed { error: e.to_string() },
    }
}

/// Expand the given paths into the list of `.php` units: files pass
/// through, directories are walked recursively.
pub fn discover_units(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut units = Vec::new();
    for path in paths {
        if path.is_file() {
            units.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            anyhow::bail!("no such file or directory: {}", path.display());
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", path.display()))?;
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == "php")
            {
                units.push(entry.into_path());
            }
        }
    }
    Ok(units)
}

fn modification_time(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("modification time of {}", path.display()))?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}
