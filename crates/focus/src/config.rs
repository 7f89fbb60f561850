//! Focus NFe client configuration.
//!
//! Environment, base URL and token are chosen once and handed to
//! `FocusClient::new`; nothing is read from the environment per call.

use url::Url;

pub const HOMOLOGATION_URL: &str = "https://homologacao.focusnfe.com.br";
pub const PRODUCTION_URL: &str = "https://api.focusnfe.com.br";

/// Default request timeout. Timeouts surface as transport failures.
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Provider environment. Each one has its own token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusEnvironment {
    /// SEFAZ test environment; documents have no fiscal value.
    #[default]
    Homologation,
    Production,
}

impl FocusEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusEnvironment::Homologation => "homologacao",
            FocusEnvironment::Production => "producao",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            FocusEnvironment::Homologation => HOMOLOGATION_URL,
            FocusEnvironment::Production => PRODUCTION_URL,
        }
    }

    /// Name of the variable holding this environment's token.
    pub fn token_var(&self) -> &'static str {
        match self {
            FocusEnvironment::Homologation => "FOCUS_NFE_TOKEN_HOMOLOGACAO",
            FocusEnvironment::Production => "FOCUS_NFE_TOKEN_PRODUCAO",
        }
    }
}

impl core::str::FromStr for FocusEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "homologacao" | "homologation" => Ok(FocusEnvironment::Homologation),
            "producao" | "production" => Ok(FocusEnvironment::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Connection settings for the provider.
///
/// Custom `Debug` implementation redacts the `token` field.
#[derive(Clone)]
pub struct FocusConfig {
    pub environment: FocusEnvironment,
    pub base_url: Url,
    /// Basic-Auth user; the password is always empty.
    pub token: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for FocusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusConfig")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FocusConfig {
    /// Config for `environment` with its default base URL.
    pub fn new(
        environment: FocusEnvironment,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token = token.into();
        check_token(environment, &token)?;
        Ok(Self {
            environment,
            base_url: parse_url("base_url", environment.default_base_url())?,
            token,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FOCUS_NFE_ENVIRONMENT` (`homologacao` | `producao`, default: `homologacao`)
    /// - `FOCUS_NFE_TOKEN_HOMOLOGACAO` / `FOCUS_NFE_TOKEN_PRODUCAO` (required for the
    ///   chosen environment)
    /// - `FOCUS_NFE_BASE_URL` (default: the environment's URL)
    /// - `FOCUS_NFE_TIMEOUT_SECS` (default: 45)
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match std::env::var("FOCUS_NFE_ENVIRONMENT") {
            Ok(raw) => raw.parse()?,
            Err(_) => FocusEnvironment::default(),
        };
        let token = std::env::var(environment.token_var())
            .map_err(|_| ConfigError::MissingToken(environment.token_var()))?;

        let mut config = Self::new(environment, token)?;
        if let Ok(raw) = std::env::var("FOCUS_NFE_BASE_URL") {
            config.base_url = parse_url("FOCUS_NFE_BASE_URL", &raw)?;
        }
        if let Ok(raw) = std::env::var("FOCUS_NFE_TIMEOUT_SECS") {
            config.timeout_secs = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    /// Homologation config pointing at a local mock server (for testing).
    pub fn local_mock(uri: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(FocusEnvironment::Homologation, token)?
            .with_base_url(parse_url("local_mock", uri)?)
            .with_timeout_secs(5))
    }
}

/// Tokens are sent as the Basic-Auth user: blank is missing, and embedded
/// whitespace or control characters mean a mangled value.
pub(crate) fn check_token(environment: FocusEnvironment, token: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::MissingToken(environment.token_var()));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::InvalidToken(environment.token_var()));
    }
    Ok(())
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingToken(&'static str),
    #[error("{0} contains whitespace or control characters")]
    InvalidToken(&'static str),
    #[error("FOCUS_NFE_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
    #[error("unknown Focus NFe environment '{0}' (expected homologacao or producao)")]
    InvalidEnvironment(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environments_pick_their_own_url_and_token() {
        let homolog = FocusConfig::new(FocusEnvironment::Homologation, "h-token").unwrap();
        assert_eq!(homolog.base_url.as_str(), "https://homologacao.focusnfe.com.br/");
        assert_eq!(homolog.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let prod = FocusConfig::new(FocusEnvironment::Production, "p-token").unwrap();
        assert_eq!(prod.base_url.as_str(), "https://api.focusnfe.com.br/");
        assert_eq!(FocusEnvironment::Production.token_var(), "FOCUS_NFE_TOKEN_PRODUCAO");
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = FocusConfig::new(FocusEnvironment::Production, "  ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken("FOCUS_NFE_TOKEN_PRODUCAO")));
    }

    #[test]
    fn mangled_token_is_invalid_not_missing() {
        let err = FocusConfig::new(FocusEnvironment::Homologation, "abc\ndef").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToken("FOCUS_NFE_TOKEN_HOMOLOGACAO")));

        let err = FocusConfig::new(FocusEnvironment::Production, "abc def").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidToken("FOCUS_NFE_TOKEN_PRODUCAO")));
    }

    #[test]
    fn timeout_must_parse_to_positive_seconds() {
        assert_eq!(parse_timeout("30").unwrap(), 30);
        assert_eq!(parse_timeout(" 60 ").unwrap(), 60);
        for raw in ["abc", "", "0", "-5", "1.5"] {
            let err = parse_timeout(raw).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout(ref got) if got == raw));
        }
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = FocusConfig::new(FocusEnvironment::Homologation, "super-secret").unwrap();
        let printed = format!("{cfg:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn environment_parses_portuguese_names() {
        assert_eq!("producao".parse::<FocusEnvironment>().unwrap(), FocusEnvironment::Production);
        assert_eq!(
            " Homologacao ".parse::<FocusEnvironment>().unwrap(),
            FocusEnvironment::Homologation
        );
        assert!("staging".parse::<FocusEnvironment>().is_err());
    }

    #[test]
    fn local_mock_uses_short_timeout() {
        let cfg = FocusConfig::local_mock("http://127.0.0.1:9000", "t").unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
    }
}
