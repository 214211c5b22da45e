use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Runtime configuration, layered as defaults <- `BLUNDERS_*` environment.
///
/// Nested keys use a double underscore, e.g. `BLUNDERS_SUPABASE__URL` or
/// `BLUNDERS_STRIPE__PRICE_IDS=[price_a,price_b]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,
    /// Key guarding the admin endpoints. Empty disables them.
    pub admin_key: String,
    /// Public front-end origin, used to build checkout and portal return URLs.
    pub site_url: Url,
    pub proxy: Option<Url>,
    pub pageview_rate_per_minute: u32,
    pub supabase: SupabaseConfig,
    pub stripe: StripeConfig,
    pub chesscom: ChessComConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripeConfig {
    pub api_base: Url,
    pub secret_key: String,
    /// Prices belonging to this product; the first one is the checkout default.
    pub price_ids: Vec<String>,
    /// Monthly price per active subscription, used for MRR.
    pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessComConfig {
    pub api_base: Url,
    pub user_agent: String,
    pub retries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisBackend {
    Placeholder,
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub backend: AnalysisBackend,
    pub engine_url: Option<Url>,
    pub engine_path: Option<PathBuf>,
    pub default_depth: u32,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            admin_key: String::new(),
            site_url: Url::parse("http://localhost:3000").expect("valid default site url"),
            proxy: None,
            pageview_rate_per_minute: 600,
            supabase: SupabaseConfig::default(),
            stripe: StripeConfig::default(),
            chesscom: ChessComConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost:54321").expect("valid default supabase url"),
            anon_key: String::new(),
            service_role_key: String::new(),
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://api.stripe.com").expect("valid default stripe url"),
            secret_key: String::new(),
            price_ids: Vec::new(),
            price_cents: 499,
        }
    }
}

impl Default for ChessComConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://api.chess.com").expect("valid default chess.com url"),
            user_agent: "ChessBlunders/1.0".to_string(),
            retries: 2,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: AnalysisBackend::Placeholder,
            engine_url: None,
            engine_path: None,
            default_depth: 20,
            timeout_secs: 25,
        }
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Load defaults, then overlay the `BLUNDERS_` environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("BLUNDERS_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extract_without_environment() {
        figment::Jail::expect_with(|_jail| {
            let cfg = Config::load()?;
            assert_eq!(cfg.listen_addr, "0.0.0.0:8000");
            assert_eq!(cfg.stripe.price_cents, 499);
            assert_eq!(cfg.analysis.backend, AnalysisBackend::Placeholder);
            assert!(cfg.admin_key.is_empty());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_nested_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BLUNDERS_ADMIN_KEY", "s3cret");
            jail.set_env("BLUNDERS_SUPABASE__URL", "https://demo.supabase.co");
            jail.set_env("BLUNDERS_STRIPE__PRICE_IDS", "[price_month,price_year]");
            jail.set_env("BLUNDERS_ANALYSIS__BACKEND", "remote");
            let cfg = Config::load()?;
            assert_eq!(cfg.admin_key, "s3cret");
            assert_eq!(cfg.supabase.url.as_str(), "https://demo.supabase.co/");
            assert_eq!(cfg.stripe.price_ids, vec!["price_month", "price_year"]);
            assert_eq!(cfg.analysis.backend, AnalysisBackend::Remote);
            Ok(())
        });
    }
}
