//! Rotating proxy pool
//!
//! Proxies are loaded once at process start from a line-oriented file
//! (`host:port` or `host:port:user:password`) and never change afterwards.
//! Selection is a bare round-robin over an atomic cursor: no health checks,
//! no ejection; a bad proxy shows up as a fetch failure and is handled by
//! the per-item retry policy, not here.

use crate::ProxyError;
use rand::Rng;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One credentialed proxy endpoint, immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ProxyEndpoint {
    /// Parses a single proxy line. Any field count other than 2 or 4 is an
    /// error; the caller treats that as fatal for the whole file.
    fn parse(line: &str, line_number: usize) -> Result<Self, ProxyError> {
        let fields: Vec<&str> = line.split(':').collect();
        match fields.as_slice() {
            [host, port] => Ok(Self {
                host: host.to_string(),
                port: port.to_string(),
                user: None,
                password: None,
            }),
            [host, port, user, password] => Ok(Self {
                host: host.to_string(),
                port: port.to_string(),
                user: Some(user.to_string()),
                password: Some(password.to_string()),
            }),
            other => Err(ProxyError::Malformed {
                line: line_number,
                fields: other.len(),
            }),
        }
    }

    /// Builds the `reqwest` proxy for this endpoint
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, ProxyError> {
        let uri = format!("http://{}:{}", self.host, self.port);
        let mut proxy =
            reqwest::Proxy::all(&uri).map_err(|source| ProxyError::InvalidEndpoint {
                endpoint: uri.clone(),
                source,
            })?;
        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            proxy = proxy.basic_auth(user, password);
        }
        Ok(proxy)
    }
}

/// Round-robin pool over a fixed proxy list
///
/// The cursor is atomic, so one pool instance may be shared by concurrent
/// stage instances without further locking.
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    /// Loads a pool from proxy lines.
    ///
    /// Each endpoint is inserted at a uniformly random position so the live
    /// rotation order carries no positional bias from the source file. A
    /// single malformed line fails the whole load; an empty input is also an
    /// error; a pool must have at least one endpoint.
    pub fn load<S: AsRef<str>>(lines: &[S]) -> Result<Self, ProxyError> {
        let mut rng = rand::thread_rng();
        let mut endpoints: Vec<ProxyEndpoint> = Vec::with_capacity(lines.len());

        for (number, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let endpoint = ProxyEndpoint::parse(line, number + 1)?;
            if endpoints.is_empty() {
                endpoints.push(endpoint);
            } else {
                let position = rng.gen_range(0..endpoints.len());
                endpoints.insert(position, endpoint);
            }
        }

        if endpoints.is_empty() {
            return Err(ProxyError::Empty);
        }

        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Loads a pool from a file, one proxy per line (UTF-8)
    pub fn load_file(path: &Path) -> Result<Self, ProxyError> {
        let content = std::fs::read_to_string(path)?;
        let lines: Vec<&str> = content.lines().collect();
        Self::load(&lines)
    }

    /// Index of the next endpoint in rotation
    pub fn next_index(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % self.endpoints.len()
    }

    /// Next endpoint in strict round-robin order.
    ///
    /// The pool is never empty by construction; `load` rejects empty input.
    pub fn next(&self) -> &ProxyEndpoint {
        &self.endpoints[self.next_index()]
    }

    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_endpoint() {
        let pool = ProxyPool::load(&["5.6.7.8:8080"]).unwrap();
        let endpoint = pool.next();
        assert_eq!(endpoint.host, "5.6.7.8");
        assert_eq!(endpoint.port, "8080");
        assert!(endpoint.user.is_none());
        assert!(endpoint.password.is_none());
    }

    #[test]
    fn test_parse_credentialed_endpoint() {
        let pool = ProxyPool::load(&["1.2.3.4:80:alice:pw"]).unwrap();
        let endpoint = pool.next();
        assert_eq!(endpoint.host, "1.2.3.4");
        assert_eq!(endpoint.port, "80");
        assert_eq!(endpoint.user.as_deref(), Some("alice"));
        assert_eq!(endpoint.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_three_field_line_fails_whole_load() {
        let result = ProxyPool::load(&["1.2.3.4:80", "1.2.3.4:80:alice"]);
        assert!(matches!(
            result,
            Err(ProxyError::Malformed { line: 2, fields: 3 })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let lines: [&str; 0] = [];
        assert!(matches!(ProxyPool::load(&lines), Err(ProxyError::Empty)));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let pool = ProxyPool::load(&["", "5.6.7.8:8080", "  "]).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_round_robin_covers_all_endpoints() {
        let pool = ProxyPool::load(&["1.2.3.4:80:alice:pw", "5.6.7.8:8080"]).unwrap();

        let picks: Vec<ProxyEndpoint> = (0..4).map(|_| pool.next().clone()).collect();

        // Strict rotation over a size-2 list: period two, both entries seen
        // in any two consecutive calls
        assert_eq!(picks[0], picks[2]);
        assert_eq!(picks[1], picks[3]);
        assert_ne!(picks[0], picks[1]);
    }

    #[test]
    fn test_cursor_wraps_without_overflow_panics() {
        let pool = ProxyPool::load(&["5.6.7.8:8080"]).unwrap();
        for _ in 0..1000 {
            pool.next();
        }
    }

    #[test]
    fn test_to_reqwest_proxy_builds() {
        let pool = ProxyPool::load(&["1.2.3.4:80:alice:pw"]).unwrap();
        assert!(pool.next().to_reqwest_proxy().is_ok());
    }
}
