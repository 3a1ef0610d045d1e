use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method, Proxy, Url,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    classify::{classify, EndpointKind, Failure, Outcome, Reply},
    config::RequestConfig,
    proxy::{ProxyEndpoint, ProxyPool},
    RequestError, RetryBudget,
};

/// Everything needed to issue one logical request
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub kind: EndpointKind,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: Method, url: Url, kind: EndpointKind) -> Self {
        Self {
            method,
            url,
            kind,
            headers: HeaderMap::new(),
            query: Vec::new(),
            json: None,
            timeout: None,
        }
    }

    pub fn post(url: Url, kind: EndpointKind) -> Self {
        Self::new(Method::POST, url, kind)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the transport level proxy applies. The captcha solver gets its
    /// proxy through the request payload instead.
    fn uses_transport_proxy(&self) -> bool {
        self.kind != EndpointKind::CaptchaSolver
    }
}

/// Result of a retried request
#[derive(Debug)]
pub struct Execution {
    pub outcome: Outcome,
    /// Attempts used, including the final one
    pub attempts: u32,
    /// Proxy in effect when the loop ended
    pub proxy: Option<ProxyEndpoint>,
}

/// Sequential HTTP client with proxy rotation, classification and jittered retries.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    config: RequestConfig,
    proxies: ProxyPool,
    direct: Client,
}

impl RequestExecutor {
    pub fn new(config: RequestConfig, proxies: ProxyPool) -> Result<Self, RequestError> {
        Ok(Self {
            config,
            proxies,
            direct: build_client(None)?,
        })
    }

    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }

    /// Faucet claims wait on captcha checks and chain confirmation, so they get the long timeout
    pub fn timeout_for(&self, spec: &RequestSpec) -> Duration {
        match spec.kind {
            EndpointKind::FaucetClaim => self.config.faucet_timeout,
            _ => spec.timeout.unwrap_or(self.config.default_timeout),
        }
    }

    /// Issue a request until it is classified as a (soft) success or the budget runs out.
    /// A budget of zero attempts still sends once.
    #[instrument(skip_all, fields(kind = ?spec.kind, url = %spec.url))]
    pub async fn execute(
        &self,
        spec: &RequestSpec,
        budget: &RetryBudget,
        proxy: Option<ProxyEndpoint>,
    ) -> Execution {
        let max_attempts = budget.max_attempts.max(1);
        let timeout = self.timeout_for(spec);
        let mut proxy = proxy;
        let mut last_status = None;
        let mut last_error = String::from("no attempt made");

        let mut attempt = 0;
        loop {
            let transport_proxy = proxy.as_ref().filter(|_| spec.uses_transport_proxy());
            match self.send(spec, transport_proxy, timeout).await {
                Ok(reply) => {
                    debug!(status = reply.status, body = %reply.body, "server response");
                    match classify(spec.kind, reply) {
                        Outcome::RetryableFailure(failure) => {
                            warn!(attempt = attempt + 1, "{failure}");
                            last_status = Some(failure);
                        }
                        outcome => {
                            return Execution {
                                outcome,
                                attempts: attempt + 1,
                                proxy,
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, "Request error: {e}");
                    last_error = e.to_string();
                }
            }

            if attempt + 1 >= max_attempts {
                break;
            }

            let wait = budget.wait(attempt);
            info!("Retrying in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;

            if spec.uses_transport_proxy() {
                if let Some(next) = self.proxies.pick_random() {
                    debug!(proxy = %next, "rotating proxy");
                    proxy = Some(next);
                }
            }
            attempt += 1;
        }

        warn!("Giving up after {max_attempts} attempts");
        let failure = last_status.unwrap_or(Failure::NoResponse(last_error));
        Execution {
            outcome: Outcome::RetryableFailure(failure),
            attempts: max_attempts,
            proxy,
        }
    }

    /// Single attempt. Every status code is returned as a reply, only transport
    /// problems are errors.
    async fn send(
        &self,
        spec: &RequestSpec,
        proxy: Option<&ProxyEndpoint>,
        timeout: Duration,
    ) -> Result<Reply, RequestError> {
        let client = match proxy {
            Some(proxy) => build_client(Some(proxy))?,
            None => self.direct.clone(),
        };

        let mut req = client
            .request(spec.method.clone(), spec.url.clone())
            .headers(spec.headers.clone())
            .timeout(timeout);
        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }
        if let Some(body) = &spec.json {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(Reply::new(status, body))
    }
}

/// Client without environment proxies, optionally routed through `proxy`
fn build_client(proxy: Option<&ProxyEndpoint>) -> Result<Client, RequestError> {
    let mut builder = Client::builder().no_proxy();
    if let Some(proxy) = proxy {
        let transport =
            Proxy::all(proxy.url()).map_err(|e| RequestError::Proxy(proxy.clone(), e))?;
        builder = builder.proxy(transport);
    }
    Ok(builder.build()?)
}
