use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the SQLite store holding the cached plan and the history.
    pub database_url: String,

    // AI/Gemini Settings
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub fitness_debug_prompt: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "fuerza_activa.db".to_string(),
            gemini_api_key: "".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            fitness_debug_prompt: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(
            AppConfig::default(),
        ))
        .merge(Toml::file("Fuerza.toml"))
        .merge(Env::raw().only(&[
            "DATABASE_URL",
            "GEMINI_API_KEY",
            "GEMINI_MODEL",
            "FITNESS_DEBUG_PROMPT",
        ]))
        .extract()
    }
}
