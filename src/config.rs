use serde::Deserialize;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Optional: without a key every narrative falls back to the static sentence.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|s| !s.trim().is_empty()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim()
                .trim_end_matches('/')
                .to_string(),
            gemini_model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("GEMINI_TIMEOUT_SECS must be a positive integer"))?,
        };

        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Gemini Base URL: {}", config.gemini_base_url);
        tracing::debug!("Gemini Model: {}", config.gemini_model);
        if config.gemini_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set - narratives will use the static fallback");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.gemini_base_url.is_empty() {
            anyhow::bail!("GEMINI_BASE_URL cannot be empty");
        }
        if !self.gemini_base_url.starts_with("http://")
            && !self.gemini_base_url.starts_with("https://")
        {
            anyhow::bail!("GEMINI_BASE_URL must start with http:// or https://");
        }
        if self.gemini_timeout_secs == 0 {
            anyhow::bail!("GEMINI_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_timeout_secs: 30,
        }
    }
}
