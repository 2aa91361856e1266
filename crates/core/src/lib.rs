pub mod domain;
pub mod llm;
pub mod marketdata;
pub mod momentum;
pub mod risk;
pub mod storage;
pub mod sync;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub rapidapi_key: Option<String>,
        pub rapidapi_host: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                rapidapi_key: std::env::var("RAPIDAPI_KEY").ok(),
                rapidapi_host: std::env::var("RAPIDAPI_HOST").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_rapidapi_key(&self) -> anyhow::Result<&str> {
            self.rapidapi_key
                .as_deref()
                .context("RAPIDAPI_KEY is required")
        }
    }
}
