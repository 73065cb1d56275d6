use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;

const MANIFEST_FILE: &str = "list.json";
const CACHE_PARAM: &str = "t";
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Hands out strictly increasing cache-defeating stamps based on wall-clock
/// milliseconds.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: u64,
}

impl CacheBuster {
    pub fn next_stamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last = now.max(self.last + 1);
        self.last
    }

    pub fn bust(&mut self, location: &str) -> String {
        with_cache_param(location, self.next_stamp())
    }
}

pub fn with_cache_param(location: &str, stamp: u64) -> String {
    let sep = if location.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", location, sep, CACHE_PARAM, stamp)
}

pub fn manifest_location(root: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        MANIFEST_FILE.to_string()
    } else {
        format!("{}/{}", root, MANIFEST_FILE)
    }
}

/// Reads a location that is either an `http(s)://` URL or a filesystem path.
/// The query string only matters for HTTP and is dropped for local reads.
pub fn fetch_bytes(location: &str) -> anyhow::Result<Vec<u8>> {
    if crate::manifest::is_absolute_url(location) {
        fetch_http(location)
    } else {
        let path = local_path(location);
        std::fs::read(&path).with_context(|| format!("read {}", path.display()))
    }
}

/// Process-wide client; every fetch shares its connection pool.
fn http_client() -> anyhow::Result<&'static reqwest::blocking::Client> {
    static CLIENT: OnceLock<reqwest::blocking::Client> = OnceLock::new();
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("chartboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")?;
    // another thread may have initialised it first
    Ok(CLIENT.get_or_init(|| client))
}

fn fetch_http(url: &str) -> anyhow::Result<Vec<u8>> {
    let resp = http_client()?
        .get(url)
        .send()
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("GET {}", url))?;
    let body = resp.bytes().with_context(|| format!("read body of {}", url))?;
    Ok(body.to_vec())
}

fn local_path(location: &str) -> PathBuf {
    let without_query = location.split_once('?').map_or(location, |(p, _)| p);
    PathBuf::from(without_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_strictly_increase_within_the_same_millisecond() {
        let mut buster = CacheBuster::default();
        let a = buster.next_stamp();
        let b = buster.next_stamp();
        let c = buster.next_stamp();
        assert!(a < b && b < c);
    }

    #[test]
    fn cache_param_respects_existing_query() {
        assert_eq!(with_cache_param("list.json", 7), "list.json?t=7");
        assert_eq!(
            with_cache_param("https://x.net/a.png?v=2", 7),
            "https://x.net/a.png?v=2&t=7"
        );
    }

    #[test]
    fn manifest_location_joins_root() {
        assert_eq!(manifest_location(""), "list.json");
        assert_eq!(manifest_location("https://x.net/board/"), "https://x.net/board/list.json");
        assert_eq!(manifest_location("/srv/board"), "/srv/board/list.json");
    }

    #[test]
    fn local_reads_ignore_cache_param() {
        let dir = std::env::temp_dir().join(format!("chartboard-src-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("list.json");
        std::fs::write(&file, b"{}").unwrap();

        let location = with_cache_param(&file.to_string_lossy(), 42);
        assert_eq!(fetch_bytes(&location).unwrap(), b"{}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn http_client_is_built_once() {
        let first = http_client().unwrap();
        let second = http_client().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn missing_local_file_reports_path() {
        let err = fetch_bytes("/definitely/not/here/list.json?t=1").unwrap_err();
        assert!(format!("{:#}", err).contains("/definitely/not/here/list.json"));
    }
}
