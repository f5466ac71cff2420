use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    /// Whether a passed unit quiz counts as one completed item in the
    /// course percentage. Off by default; only lessons count.
    pub quizzes_count_toward_progress: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                // Allow missing config file, fallback to ENV
                config::File::with_name(&format!("config/{}", env)).required(false),
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let listen_addr = settings
            .get_string("http.listen_addr")
            .or_else(|_| env::var("LISTEN_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "rabita".to_string());

        let jwt_secret = settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: JWT_SECRET must be set in production!");
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let quizzes_count_toward_progress = settings
            .get_bool("progress.quizzes_count_toward_progress")
            .ok()
            .or_else(|| {
                env::var("QUIZZES_COUNT_TOWARD_PROGRESS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(false);

        Ok(Config {
            listen_addr,
            mongo_uri,
            mongo_database,
            jwt_secret,
            quizzes_count_toward_progress,
        })
    }
}
