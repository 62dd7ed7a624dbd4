use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Application settings, loaded from the environment.
///
/// Variables are `APP_`-prefixed with `__` as the section separator,
/// e.g. `APP_SERVER__PORT=8080`, `APP_TWILIO__AUTH_TOKEN=...`. A local
/// `.env` file is honored by the binary before settings are read.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub twilio: TwilioSettings,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// External base URL of this service as the webhook provider sees it
    /// (scheme + authority, no trailing slash). Signature validation covers
    /// the exact URL, so this must be set when running behind a reverse
    /// proxy that does not forward `X-Forwarded-Proto`/`X-Forwarded-Host`.
    pub external_url: Option<String>,
    /// Comma-separated CORS origin allowlist. Unset or empty allows all.
    pub allowed_origins: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub uri: String,
    pub name: String,
}

/// Webhook authentication. When no auth token is configured, signature
/// checking is disabled entirely (permissive local/dev default).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioSettings {
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// Summarization is skipped when no API key is configured.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Per-request timeout for `generateContent` calls.
    pub timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.uri", "mongodb://localhost:27017")?
            .set_default("database.name", "capmatch")?
            .set_default("gemini.model", "gemini-2.5-flash")?
            .set_default("gemini.endpoint", "https://generativelanguage.googleapis.com")?
            .set_default("gemini.timeout_secs", 30)?
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
