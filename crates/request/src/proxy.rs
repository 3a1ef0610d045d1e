use std::{fmt, io, path::Path, sync::Arc};

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Opaque proxy address, `host:port` with an optional scheme and credentials.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyEndpoint(String);

impl ProxyEndpoint {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Proxy url usable by the transport, defaulting to `http://` when no scheme is given
    pub fn url(&self) -> String {
        if self.0.contains("://") {
            self.0.clone()
        } else {
            format!("http://{}", self.0)
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print credentials
        let (scheme, rest) = match self.0.split_once("://") {
            Some((scheme, rest)) => (Some(scheme), rest),
            None => (None, self.0.as_str()),
        };
        let host = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
        match scheme {
            Some(scheme) => write!(f, "{scheme}://{host}"),
            None => f.write_str(host),
        }
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyEndpoint")
            .field(&self.to_string())
            .finish()
    }
}

/// Immutable list of proxies, sampled uniformly with no memory of prior picks.
#[derive(Clone, Debug, Default)]
pub struct ProxyPool {
    proxies: Arc<[ProxyEndpoint]>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<ProxyEndpoint>) -> Self {
        Self {
            proxies: proxies.into(),
        }
    }

    /// Parse newline delimited proxies, ignoring blank lines
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ProxyEndpoint::new)
                .collect(),
        )
    }

    /// Load proxies from a file. A missing file yields an empty pool.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let pool = Self::from_lines(&text);
                info!("Loaded {} proxies from {}", pool.len(), path.display());
                Ok(pool)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "{} not found, requests will be sent without a proxy",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Select a random proxy, or none if the pool is empty
    pub fn pick_random(&self) -> Option<ProxyEndpoint> {
        self.proxies.choose(&mut rand::rng()).cloned()
    }
}
