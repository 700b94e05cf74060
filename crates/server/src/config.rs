/// Default bind address.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
const DEFAULT_PORT: u16 = 8190;

/// Configuration errors detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Log output format, selected with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything other than `json` means text.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Relay sidecar configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Endpoint that receives completion events.
    pub webhook_url: String,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8190`).
    pub port: u16,
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default   |
    /// |---------------------|-----------|
    /// | `EVENT_WEBHOOK_URL` | required  |
    /// | `HOST`              | `0.0.0.0` |
    /// | `PORT`              | `8190`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup("EVENT_WEBHOOK_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("EVENT_WEBHOOK_URL"))?;
        validate_webhook_url(&webhook_url)?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.into());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            webhook_url,
            host,
            port,
        })
    }
}

fn validate_webhook_url(raw: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var: "EVENT_WEBHOOK_URL",
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            var: "EVENT_WEBHOOK_URL",
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
