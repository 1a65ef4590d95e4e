use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Collaborator API keys
    pub serper_api_key: String,
    pub anthropic_api_key: String,

    // Extraction model
    pub extract_model: String,

    // Base URL the agent uses to reach the tools service. Defaults to the
    // service's own listener since the tools routes are self-hosted.
    pub tools_base_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

const DEFAULT_EXTRACT_MODEL: &str = "claude-haiku-4-5-20251001";

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let web_host = env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let web_port: u16 = env::var("WEB_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .expect("WEB_PORT must be a number");

        Self {
            serper_api_key: required_env("SERPER_API_KEY"),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            extract_model: env::var("EXTRACT_MODEL")
                .unwrap_or_else(|_| DEFAULT_EXTRACT_MODEL.to_string()),
            tools_base_url: env::var("TOOLS_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{web_port}/tools")),
            web_host,
            web_port,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
