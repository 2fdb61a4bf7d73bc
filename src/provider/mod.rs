//! Endpoint discovery providers.
//!
//! The measurement core treats discovery as a pluggable data source: a
//! provider hands back a ranked list of candidate endpoints plus whatever it
//! knows about the client. The production provider talks to the speedtest.net
//! configuration endpoints; the static provider backs `--server-url` and
//! lets tests run against fixed, synthetic endpoints.

use crate::{
    defaults,
    error::{AppError, Result},
    models::{ClientInfo, Endpoint},
};
use async_trait::async_trait;
use regex::Regex;

/// Supplies ranked candidate test servers and client metadata.
#[async_trait]
pub trait EndpointProvider: Send + Sync {
    /// Client identity (external IP, ISP, country), when the provider
    /// knows it. `None` is not an error; the run proceeds without it.
    async fn client_info(&self) -> Result<Option<ClientInfo>>;

    /// Ranked candidate endpoints, best first.
    async fn endpoints(&self) -> Result<Vec<Endpoint>>;
}

/// Discovery against the speedtest.net configuration and server-list
/// endpoints.
pub struct SpeedtestNetProvider {
    client: reqwest::Client,
    secure: bool,
    /// Override for the discovery host, used by tests
    base: Option<String>,
}

impl SpeedtestNetProvider {
    pub fn new(secure: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(defaults::DISCOVERY_TIMEOUT)
            .user_agent(concat!("netspeed-tester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            secure,
            base: None,
        })
    }

    /// Same provider pointed at a different discovery host, for tests.
    pub fn with_base(secure: bool, base: String) -> Result<Self> {
        let mut provider = Self::new(secure)?;
        provider.base = Some(base);
        Ok(provider)
    }

    fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    fn config_url(&self) -> String {
        match &self.base {
            Some(base) => format!("{}/speedtest-config.php", base),
            None => format!("{}://www.speedtest.net/speedtest-config.php", self.scheme()),
        }
    }

    fn servers_url(&self) -> String {
        match &self.base {
            Some(base) => format!("{}/speedtest-servers-static.php", base),
            None => format!("{}://www.speedtest.net/speedtest-servers-static.php", self.scheme()),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::network(format!("GET {} failed: {}", url, e)))?
            .text()
            .await
            .map_err(|e| AppError::network(format!("reading {} failed: {}", url, e)))
    }
}

#[async_trait]
impl EndpointProvider for SpeedtestNetProvider {
    async fn client_info(&self) -> Result<Option<ClientInfo>> {
        let body = self.fetch(&self.config_url()).await?;
        Ok(parse_client_info(&body))
    }

    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        let body = self.fetch(&self.servers_url()).await?;
        let endpoints = parse_server_list(&body, self.secure)?;
        if endpoints.is_empty() {
            return Err(AppError::parse(
                "server list contained no usable endpoints".to_string(),
            ));
        }
        Ok(endpoints)
    }
}

/// Extract one attribute value from an XML-ish tag body.
fn attr(tag: &str, name: &str) -> Option<String> {
    // Attribute grammar is simple enough that a per-attribute pattern beats
    // pulling in a full XML parser for two fixed documents.
    let pattern = format!(r#"{}="([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag).map(|c| c[1].to_string())
}

/// Parse the `<client .../>` element of the speedtest configuration document.
fn parse_client_info(body: &str) -> Option<ClientInfo> {
    let re = Regex::new(r"<client [^>]*>").ok()?;
    let tag = re.find(body)?.as_str();
    Some(ClientInfo {
        ip: attr(tag, "ip")?,
        isp: attr(tag, "isp")?,
        country: attr(tag, "country")?,
    })
}

/// Parse the `<server .../>` elements of the server-list document, keeping
/// the provider's ranking and capping the candidate count.
fn parse_server_list(body: &str, secure: bool) -> Result<Vec<Endpoint>> {
    let re = Regex::new(r"<server [^>]*/>")
        .map_err(|e| AppError::internal(format!("server pattern: {}", e)))?;

    let mut endpoints = Vec::new();
    for tag in re.find_iter(body).map(|m| m.as_str()) {
        let (Some(url), Some(id)) = (attr(tag, "url"), attr(tag, "id")) else {
            continue;
        };
        let sponsor = attr(tag, "sponsor").unwrap_or_else(|| "-".to_string());
        let location = attr(tag, "name").unwrap_or_else(|| "-".to_string());
        let country = attr(tag, "country").unwrap_or_else(|| "-".to_string());

        match Endpoint::from_upload_url(id, sponsor, location, country, &url, secure) {
            Ok(endpoint) => endpoints.push(endpoint),
            Err(_) => continue, // skip malformed entries, keep the rest
        }

        if endpoints.len() >= defaults::MAX_CANDIDATE_ENDPOINTS {
            break;
        }
    }

    Ok(endpoints)
}

/// Fixed endpoints and client info, for `--server-url` and tests.
pub struct StaticProvider {
    endpoints: Vec<Endpoint>,
    client: Option<ClientInfo>,
}

impl StaticProvider {
    pub fn new(endpoints: Vec<Endpoint>, client: Option<ClientInfo>) -> Self {
        Self { endpoints, client }
    }

    /// Build a single-endpoint provider from a user-supplied upload URL.
    pub fn from_url(url: &str, secure: bool) -> Result<Self> {
        let endpoint = Endpoint::from_upload_url("custom", "custom server", "-", "-", url, secure)?;
        Ok(Self {
            endpoints: vec![endpoint],
            client: None,
        })
    }
}

#[async_trait]
impl EndpointProvider for StaticProvider {
    async fn client_info(&self) -> Result<Option<ClientInfo>> {
        Ok(self.client.clone())
    }

    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        Ok(self.endpoints.clone())
    }
}
