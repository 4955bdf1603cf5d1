use anyhow::{Context, Result};
use scoring::dispatcher::{DispatchConfig, DropPolicy};
use scoring::registry::RegistryConfig;
use std::net::{IpAddr, SocketAddr};

/// Keys accepted when `API_KEYS` is not set. Never meant for production.
pub const DEFAULT_API_KEYS: &str = "sk_dev_default_key,sk_prod_default_key";

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allow-list for `X-API-Key` / `Authorization: Bearer`.
    pub api_keys: Vec<String>,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    /// Deployment environment, e.g. `development` or `production`.
    pub environment: String,
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("HOST must be an IP address")?;
        let port = lookup("PORT")
            .map(|p| p.parse::<u16>().context("PORT must be a port number"))
            .transpose()?
            .unwrap_or(3000);

        let api_keys = parse_list(&lookup("API_KEYS").unwrap_or_else(|| DEFAULT_API_KEYS.to_string()));
        if api_keys.is_empty() {
            anyhow::bail!("API_KEYS must contain at least one key");
        }

        let cors_origins = match lookup("CORS_ORIGIN") {
            None => None,
            Some(origin) if origin.trim() == "*" => None,
            Some(origin) => Some(parse_list(&origin)),
        };

        let defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            queue_capacity: lookup("WS_QUEUE_CAPACITY")
                .map(|v| v.parse::<usize>().context("WS_QUEUE_CAPACITY must be a number"))
                .transpose()?
                .unwrap_or(defaults.queue_capacity),
            drop_policy: lookup("WS_DROP_POLICY")
                .map(|v| v.parse::<DropPolicy>().map_err(anyhow::Error::msg))
                .transpose()?
                .unwrap_or(defaults.drop_policy),
            registry: RegistryConfig {
                max_topics_per_client: lookup("MAX_TOPICS_PER_CLIENT")
                    .map(|v| v.parse::<usize>().context("MAX_TOPICS_PER_CLIENT must be a number"))
                    .transpose()?
                    .unwrap_or(defaults.registry.max_topics_per_client),
            },
        };

        Ok(Self {
            host,
            port,
            api_keys,
            cors_origins,
            environment: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            dispatch,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Whether any of the built-in development keys is still accepted.
    pub fn uses_default_keys(&self) -> bool {
        let defaults = parse_list(DEFAULT_API_KEYS);
        self.api_keys.iter().any(|k| defaults.contains(k))
    }

    pub fn is_valid_key(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            api_keys: parse_list(DEFAULT_API_KEYS),
            cors_origins: None,
            environment: "development".to_string(),
            dispatch: DispatchConfig::default(),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:3000");
        assert!(cfg.uses_default_keys());
        assert!(cfg.cors_origins.is_none());
        assert_eq!(cfg.dispatch.drop_policy, DropPolicy::DropMessage);
        assert!(!cfg.is_production());
    }

    #[test]
    fn test_api_keys_trimmed() {
        let cfg = config(&[("API_KEYS", " sk_a , ,sk_b ")]).unwrap();
        assert_eq!(cfg.api_keys, vec!["sk_a", "sk_b"]);
        assert!(cfg.is_valid_key("sk_b"));
        assert!(!cfg.is_valid_key("sk_dev_default_key"));
        assert!(!cfg.uses_default_keys());
    }

    #[test]
    fn test_empty_key_list_rejected() {
        assert!(config(&[("API_KEYS", " , ")]).is_err());
    }

    #[test]
    fn test_cors_and_dispatch_overrides() {
        let cfg = config(&[
            ("CORS_ORIGIN", "https://a.example,https://b.example"),
            ("WS_QUEUE_CAPACITY", "8"),
            ("WS_DROP_POLICY", "disconnect"),
            ("MAX_TOPICS_PER_CLIENT", "4"),
            ("PORT", "8081"),
            ("APP_ENV", "production"),
        ])
        .unwrap();
        assert_eq!(cfg.cors_origins.as_ref().unwrap().len(), 2);
        assert_eq!(cfg.dispatch.queue_capacity, 8);
        assert_eq!(cfg.dispatch.drop_policy, DropPolicy::Disconnect);
        assert_eq!(cfg.dispatch.registry.max_topics_per_client, 4);
        assert_eq!(cfg.port, 8081);
        assert!(cfg.is_production());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("PORT", "http")]).is_err());
        assert!(config(&[("WS_DROP_POLICY", "retry")]).is_err());
        assert!(config(&[("HOST", "localhost")]).is_err());
    }
}
