use anyhow::Context;
use chrono::{Months, NaiveDate};
use serde::Deserialize;

/// Folders whose month ended longer ago than this are left out of the gallery.
pub const DEFAULT_RETENTION_DAYS: i64 = 15;

const CONTRACTS_DIR: &str = "contracts";
const NIGHT_MARKER: &str = "night";
const DATE_DIGITS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
/// One contract-month entry of `list.json`.
pub struct FolderRecord {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub last_update: String,
}

#[derive(Deserialize)]
struct NamedFolder {
    name: String,
    #[serde(flatten)]
    record: FolderRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Parsed manifest, folders kept in the order the source listed them.
pub struct Manifest {
    pub folders: Vec<(String, FolderRecord)>,
}

impl Manifest {
    /// Parses either the canonical map form (`{"202601": {...}}`) or the
    /// array-of-dirs form (`[{"name": "202601", ...}]`).
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).context("manifest is not valid JSON")?;
        let folders = match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(name, entry)| -> anyhow::Result<(String, FolderRecord)> {
                    let record: FolderRecord = serde_json::from_value(entry)
                        .with_context(|| format!("folder {} has an invalid record", name))?;
                    Ok((name, record))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            serde_json::Value::Array(_) => {
                let list: Vec<NamedFolder> =
                    serde_json::from_value(value).context("invalid folder list")?;
                list.into_iter().map(|f| (f.name, f.record)).collect()
            }
            other => anyhow::bail!("manifest must be an object or array, got {}", kind(&other)),
        };
        Ok(Self { folders })
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Regular,
    Night,
}

impl Category {
    pub fn from_file_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains(NIGHT_MARKER) {
            Category::Night
        } else {
            Category::Regular
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Regular => "Open interest",
            Category::Night => "Night session",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Regular => "📊",
            Category::Night => "🌙",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The `YYYYMMDD` digits found in a chart file name. Fields are sliced, not
/// validated, so the displayed date always mirrors the file name.
pub struct ChartDate(String);

impl ChartDate {
    /// Finds the first run of eight consecutive ASCII digits.
    pub fn extract(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        let mut run_start = 0;
        for (i, b) in bytes.iter().enumerate() {
            if !b.is_ascii_digit() {
                run_start = i + 1;
                continue;
            }
            if i + 1 - run_start == DATE_DIGITS {
                return Some(Self(name[run_start..=i].to_string()));
            }
        }
        None
    }

    pub fn year(&self) -> &str {
        &self.0[0..4]
    }

    pub fn month(&self) -> &str {
        &self.0[4..6]
    }

    pub fn day(&self) -> &str {
        &self.0[6..8]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileView {
    pub file_name: String,
    /// Resolved location without any cache parameter.
    pub path: String,
    pub date: Option<ChartDate>,
    pub category: Category,
}

impl FileView {
    pub fn new(root: &str, folder: &str, file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            path: resolve_path(root, folder, file_name),
            date: ChartDate::extract(file_name),
            category: Category::from_file_name(file_name),
        }
    }

    /// `MM/DD`, or empty when the name carries no date.
    pub fn short_date(&self) -> String {
        self.date
            .as_ref()
            .map(|d| format!("{}/{}", d.month(), d.day()))
            .unwrap_or_default()
    }

    /// `YYYY/MM/DD`, or empty when the name carries no date.
    pub fn full_date(&self) -> String {
        self.date
            .as_ref()
            .map(|d| format!("{}/{}/{}", d.year(), d.month(), d.day()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderView {
    pub name: String,
    pub last_update: String,
    /// Newest first: the reverse of the manifest's file order.
    pub children: Vec<FileView>,
}

impl FolderView {
    pub fn new(root: &str, name: &str, record: &FolderRecord) -> Self {
        Self {
            name: name.to_string(),
            last_update: record.last_update.clone(),
            children: record
                .files
                .iter()
                .rev()
                .map(|file| FileView::new(root, name, file))
                .collect(),
        }
    }
}

/// Joins `root/contracts/<folder>/<file>`; absolute URLs pass through as-is.
pub fn resolve_path(root: &str, folder: &str, file_name: &str) -> String {
    if is_absolute_url(file_name) {
        return file_name.to_string();
    }
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        format!("{}/{}/{}", CONTRACTS_DIR, folder, file_name)
    } else {
        format!("{}/{}/{}/{}", root, CONTRACTS_DIR, folder, file_name)
    }
}

pub fn is_absolute_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Last calendar day of the month named by the first six characters.
pub fn month_end(folder_name: &str) -> Option<NaiveDate> {
    let prefix = folder_name.get(..6)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = prefix[..4].parse().ok()?;
    let month: u32 = prefix[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// A folder is stale once its month ended more than `retention_days` ago.
/// Names without a parseable month are never considered stale.
pub fn is_stale(folder_name: &str, today: NaiveDate, retention_days: i64) -> bool {
    month_end(folder_name)
        .map(|end| (today - end).num_days() > retention_days)
        .unwrap_or(false)
}

/// Builds the views for every folder still inside the retention window.
pub fn build_folders(
    manifest: &Manifest,
    root: &str,
    today: NaiveDate,
    retention_days: i64,
) -> Vec<FolderView> {
    manifest
        .folders
        .iter()
        .filter(|(name, _)| !is_stale(name, today, retention_days))
        .map(|(name, record)| FolderView::new(root, name, record))
        .collect()
}
