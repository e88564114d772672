//! Runtime settings, read from `NESTBOARD_*` environment variables
//! (optionally via a `.env` file loaded in `main`).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Socket address to listen on.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// SQLite database URL (e.g. `sqlite:nestboard.db`). Unset means the
    /// in-memory store, which forgets everything on shutdown.
    #[serde(default)]
    pub database_url: Option<String>,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("NESTBOARD"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
