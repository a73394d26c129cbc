use anyhow::Context;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use crate::{Result, TranscriptsError};

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

/// Fixed set of proxy endpoints handed out round-robin.
///
/// The list never changes after construction; only the cursor moves, so a pool can
/// be shared between tasks by reference.
#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<String>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    /// Build a pool from proxy URIs; an empty list is rejected
    pub fn new<I, S>(proxies: I) -> std::result::Result<Self, TranscriptsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let proxies = proxies
            .into_iter()
            .enumerate()
            .map(|(index, uri)| validate_proxy(index + 1, uri.into()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if proxies.is_empty() {
            return Err(TranscriptsError::EmptyProxyPool);
        }

        Ok(Self {
            proxies,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Parse a proxy list: one URI per line, blank lines and `#` comments ignored
    pub fn from_lines(content: &str) -> std::result::Result<Self, TranscriptsError> {
        let mut proxies = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            proxies.push(validate_proxy(index + 1, line.to_string())?);
        }

        if proxies.is_empty() {
            return Err(TranscriptsError::EmptyProxyPool);
        }

        Ok(Self {
            proxies,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Load a proxy list file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read proxy list")?;
        let pool = Self::from_lines(&content)?;
        tracing::info!("Loaded {} proxies from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Next proxy in rotation, wrapping to the first after the last
    pub fn next(&self) -> &str {
        let len = self.proxies.len();
        let index = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        &self.proxies[index]
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Always false; an empty pool cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

fn validate_proxy(line: usize, uri: String) -> std::result::Result<String, TranscriptsError> {
    let uri = uri.trim().to_string();
    let valid = Url::parse(&uri)
        .map(|url| SUPPORTED_SCHEMES.contains(&url.scheme()) && url.host_str().is_some())
        .unwrap_or(false);

    if valid {
        Ok(uri)
    } else {
        Err(TranscriptsError::InvalidProxy { line, uri })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_visits_each_proxy_once_then_wraps() {
        let pool = ProxyPool::new([
            "http://10.0.0.1:8080",
            "http://10.0.0.2:8080",
            "socks5://10.0.0.3:1080",
        ])
        .unwrap();

        let first_cycle: Vec<String> = (0..pool.len()).map(|_| pool.next().to_string()).collect();
        assert_eq!(
            first_cycle,
            vec!["http://10.0.0.1:8080", "http://10.0.0.2:8080", "socks5://10.0.0.3:1080"]
        );
        assert_eq!(pool.next(), first_cycle[0]);
        assert_eq!(pool.next(), first_cycle[1]);
    }

    #[test]
    fn test_single_proxy_always_returned() {
        let pool = ProxyPool::new(["http://proxy.local:3128"]).unwrap();
        for _ in 0..5 {
            assert_eq!(pool.next(), "http://proxy.local:3128");
        }
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(matches!(
            ProxyPool::new(Vec::<String>::new()),
            Err(TranscriptsError::EmptyProxyPool)
        ));
        assert!(matches!(
            ProxyPool::from_lines("\n# only comments\n   \n"),
            Err(TranscriptsError::EmptyProxyPool)
        ));
    }

    #[test]
    fn test_from_lines_skips_comments_and_reports_bad_lines() {
        let pool = ProxyPool::from_lines("# pool\nhttp://a:1\n\n  http://user:pw@b:2  \n").unwrap();
        assert_eq!(pool.len(), 2);
        assert!(!pool.is_empty());
        assert_eq!(pool.next(), "http://a:1");
        assert_eq!(pool.next(), "http://user:pw@b:2");

        match ProxyPool::from_lines("http://a:1\nftp://b:2\n") {
            Err(TranscriptsError::InvalidProxy { line, uri }) => {
                assert_eq!(line, 2);
                assert_eq!(uri, "ftp://b:2");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(ProxyPool::from_lines("not a uri").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        fs_err::write(&path, "http://a:1\nhttp://b:2\n").unwrap();

        let pool = ProxyPool::load(&path).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(ProxyPool::load(&dir.path().join("missing.txt")).is_err());
    }
}
