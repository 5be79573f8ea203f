//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use storyloom_narrative::application::prompts::DEFAULT_PERSONA;

use crate::error::AppError;

/// Groq's OpenAI-compatible chat-completions endpoint.
pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Model requested when `LLM_MODEL` is unset.
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-oss-120b";
/// Path the render service reports completions to, under `PUBLIC_BASE_URL`.
pub const RENDER_CALLBACK_PATH: &str = "/api/v1/renders/completed";

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub render_service_url: String,
    pub public_base_url: String,
    pub output_dir: PathBuf,
    pub persona_file: Option<PathBuf>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                AppError::Config(format!("{key} environment variable must be set"))
            })
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            llm_api_url: get("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            llm_api_key: required("LLM_API_KEY")?,
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            render_service_url: required("RENDER_SERVICE_URL")?,
            public_base_url: required("PUBLIC_BASE_URL")?,
            output_dir: get("STORY_OUTPUT_DIR")
                .map_or_else(|| PathBuf::from("generated"), PathBuf::from),
            persona_file: get("STORY_PERSONA_FILE").map(PathBuf::from),
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Where the render service should report finished jobs.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!(
            "{}{RENDER_CALLBACK_PATH}",
            self.public_base_url.trim_end_matches('/')
        )
    }

    /// The system persona: the contents of `persona_file` when set, the
    /// built-in persona otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the persona file cannot be read or is
    /// blank.
    pub fn persona(&self) -> Result<String, AppError> {
        let Some(path) = &self.persona_file else {
            return Ok(DEFAULT_PERSONA.to_string());
        };
        let persona = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read persona file {}: {e}", path.display()))
        })?;
        if persona.trim().is_empty() {
            return Err(AppError::Config(format!(
                "persona file {} is empty",
                path.display()
            )));
        }
        Ok(persona)
    }
}
