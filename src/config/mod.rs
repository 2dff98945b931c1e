use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

fn default_database_url() -> String {
    "sqlite://business_admin.db".to_string()
}

fn default_export_dir() -> String {
    "exports".to_string()
}

fn default_log_file() -> String {
    "business_admin.log".to_string()
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SQLite database holding the local storage table
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Base URL of the optional REST backend, e.g. `http://localhost:3000`
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Directory exported PDFs are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    /// File the tracing subscriber writes to; the terminal belongs to the UI
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Applies command line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        api_base_url: Option<String>,
        export_dir: Option<String>,
    ) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if api_base_url.is_some() {
            self.api_base_url = api_base_url;
        }
        if let Some(dir) = export_dir {
            self.export_dir = dir;
        }
        self
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    let config = Config::load()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        envy::from_iter::<_, Config>(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.database_url(), "sqlite://business_admin.db");
        assert_eq!(config.api_base_url, None);
        assert_eq!(config.export_dir, "exports");
    }

    #[test]
    fn environment_and_flags_are_layered() {
        let config = from_pairs(&[
            ("DATABASE_URL", "sqlite://other.db"),
            ("API_BASE_URL", "http://localhost:3000"),
        ])
        .with_overrides(None, None, Some("/tmp/pdfs".to_string()));

        assert_eq!(config.database_url(), "sqlite://other.db");
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.export_dir, "/tmp/pdfs");
    }
}
