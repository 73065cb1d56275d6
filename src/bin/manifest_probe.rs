use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

#[path = "../manifest.rs"]
mod manifest;

const RETENTION_ENV: &str = "CHARTBOARD_RETENTION_DAYS";

fn parse_today(raw: Option<String>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("today must be YYYY-MM-DD, got {}", s)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn retention_days() -> i64 {
    std::env::var(RETENTION_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|d| *d >= 0)
        .unwrap_or(manifest::DEFAULT_RETENTION_DAYS)
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = PathBuf::from(args.next().unwrap_or_else(|| "list.json".to_string()));
    let today = parse_today(args.next())?;
    let retention = retention_days();

    let bytes = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let parsed = manifest::Manifest::from_json(&bytes)
        .with_context(|| format!("parse {}", path.display()))?;
    let root = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folders = manifest::build_folders(&parsed, &root, today, retention);

    println!(
        "manifest={} today={} retention_days={} folders={} hidden={}",
        path.display(),
        today,
        retention,
        folders.len(),
        parsed.len() - folders.len()
    );
    for (name, _) in &parsed.folders {
        if manifest::is_stale(name, today, retention) {
            let end = manifest::month_end(name)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("  - {} hidden (month ended {})", name, end);
        }
    }
    for folder in &folders {
        println!(
            "  + {} tiles={} last_update={}",
            folder.name,
            folder.children.len(),
            folder.last_update
        );
        for file in &folder.children {
            let date = file.short_date();
            println!(
                "      {:<5} {:<13} {}",
                if date.is_empty() { "--/--" } else { date.as_str() },
                file.category.label(),
                file.path
            );
        }
    }
    Ok(())
}
