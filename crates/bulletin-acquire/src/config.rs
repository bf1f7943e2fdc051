use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Root of the Moutamadris application on the Massar service host.
pub const DEFAULT_PORTAL_URL: &str = "https://massarservice.men.gov.ma/moutamadris";

/// Per-call timeout applied to every portal request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

pub const DEFAULT_PROXY_HOST: &str = "196.115.252.173";
pub const DEFAULT_PROXY_PORT: u16 = 3000;

/// Environment variable set by the hosting platform; its presence selects proxied mode.
pub const HOSTING_ENV_FLAG: &str = "VERCEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid portal URL '{url}': {reason}")]
    InvalidPortalUrl { url: String, reason: String },
}

/// Where the portal lives. Endpoint paths are fixed relative to `base_url`.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    base_url: String,
    origin: String,
}

impl PortalConfig {
    /// Build a portal configuration from the application root, e.g.
    /// `https://massarservice.men.gov.ma/moutamadris`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidPortalUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(ConfigError::InvalidPortalUrl {
                url: base_url.to_string(),
                reason: "URL has no scheme/host origin".to_string(),
            });
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            origin: origin.ascii_serialization(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scheme, host and port of the portal, as sent in `Origin` headers.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Login page: fetched for the anti-forgery token, then posted to.
    pub fn login_url(&self) -> String {
        self.endpoint("Account")
    }

    pub fn culture_url(&self) -> String {
        self.endpoint("General/SetCulture")
    }

    pub fn bulletins_url(&self) -> String {
        self.endpoint("TuteurEleves/GetBulletins")
    }

    /// Page a browser would be on when it requests the bulletins fragment.
    pub fn grades_referer(&self) -> String {
        self.endpoint("TuteurEleves/GetNotesEleve")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_URL.to_string(),
            origin: "https://massarservice.men.gov.ma".to_string(),
        }
    }
}

/// Settings for the HTTP client built for each portal session.
///
/// Every session gets a fresh cookie store; nothing here is shared state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
}

impl ClientConfig {
    pub fn for_mode(mode: &DeploymentMode) -> Self {
        Self {
            proxy: mode.proxy().cloned(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

/// Outbound HTTP proxy used in proxied deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<ProxyCredentials>,
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        // IPv6 literals need brackets to be a valid URL authority.
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROXY_HOST.to_string(),
            port: DEFAULT_PROXY_PORT,
            credentials: None,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How outbound traffic leaves the process. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    Direct,
    Proxied(ProxyConfig),
}

impl DeploymentMode {
    /// Proxied when the hosting flag is set to a non-empty value, direct otherwise.
    pub fn detect(hosting_flag: Option<&str>, proxy: ProxyConfig) -> Self {
        match hosting_flag {
            Some(v) if !v.is_empty() => Self::Proxied(proxy),
            _ => Self::Direct,
        }
    }

    /// Read [`HOSTING_ENV_FLAG`] from the process environment.
    pub fn from_env(proxy: ProxyConfig) -> Self {
        let flag = std::env::var(HOSTING_ENV_FLAG).ok();
        Self::detect(flag.as_deref(), proxy)
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        match self {
            Self::Direct => None,
            Self::Proxied(proxy) => Some(proxy),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Proxied(proxy) => write!(f, "proxied via {}:{}", proxy.host, proxy.port),
        }
    }
}
