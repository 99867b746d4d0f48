use serde::Deserialize;

use crate::domain::{Mode, SearchEngine};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub webdriver: WebdriverSettings,
    pub llm: LlmSettings,
    pub project: ProjectDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebdriverSettings {
    /// ChromeDriver endpoint, e.g. `http://localhost:9515`.
    pub url: String,
    /// Path to a Chromium-family binary, supplied by an external locator.
    /// When absent the driver falls back to whatever it finds on its own.
    pub chrome_binary: Option<String>,
    pub headless: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub provider: String,
    pub host: String,
    pub port: u16,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDefaults {
    pub mode: Mode,
    pub search_engine: SearchEngine,
    pub num_queries: usize,
    pub num_results_per_query: usize,
}

/// Layered settings: coded defaults, then an optional `configuration.yaml`,
/// then `SCOUR__`-prefixed environment variables.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("webdriver.url", "http://localhost:9515")?
        .set_default("webdriver.headless", true)?
        .set_default("llm.provider", "ollama")?
        .set_default("llm.host", "http://localhost")?
        .set_default("llm.port", 11434)?
        .set_default("llm.model", "llama3.2:3b")?
        .set_default("project.mode", "basic")?
        .set_default("project.search_engine", "Bing")?
        .set_default("project.num_queries", 10)?
        .set_default("project.num_results_per_query", 10)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("SCOUR").separator("__"))
        .build()?;

    settings.try_deserialize()
}
