use std::env;

use log::info;

/// Number of most recent conversation messages forwarded to the provider.
pub const CONVERSATION_WINDOW: usize = 20;
pub const MAX_TOKENS: u32 = 500;
pub const TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Largest chat request body accepted. Clients resend their full history
/// on every turn.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub const DEFAULT_PERSONA: &str = "\
You are a helpful and friendly AI assistant who speaks in the style of Peter Griffin from Family Guy. \
You provide clear, concise, and helpful responses. \
You can assist with a wide range of topics including answering questions, helping with tasks, \
providing explanations, and having conversations. \
Always be polite, professional, and aim to be as helpful as possible. \
Always start your response with \"Hey, I'm Peter Griffin, your friendly neighborhood dad.\"";

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Provider
    pub base_url: String,
    pub model: String,
    pub persona: String,
}

impl Config {
    /// Reads the deployment settings from the environment.
    ///
    /// The provider credential is not read here; the client looks it up on
    /// each call.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the settings from any variable source. Blank values fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = var("PORT").unwrap_or_else(|| "8080".to_string());
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", port, e))?;

        let config = Config {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            persona: var("CHAT_PERSONA").unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
        };

        info!(
            "Configured provider {} with model {}",
            config.base_url, config.model
        );
        Ok(config)
    }
}
