use std::env;
use std::path::PathBuf;

/// Runtime configuration, read from the environment once at startup and
/// shared via Rocket managed state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary store connection string (MongoDB Atlas in production).
    pub mongo_uri: String,
    /// Database name inside the primary store.
    pub db_name: String,
    /// Production deployments have no file fallback for writes.
    pub production: bool,
    pub site_name: String,
    /// Root of the file fallback tree (contact_messages/, admin/).
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    /// Admin session inactivity timeout, seconds.
    pub session_timeout_secs: i64,
}

fn env_set(key: &str) -> bool {
    env::var_os(key).is_some()
}

impl Config {
    pub fn from_env() -> Config {
        // Hosted platforms set a marker variable; APP_ENV=production covers
        // everything else.
        let production = env_set("RENDER")
            || env_set("RAILWAY")
            || env_set("VERCEL")
            || env::var("APP_ENV").map(|v| v == "production").unwrap_or(false);

        Config {
            mongo_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            db_name: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "ngo_website".to_string()),
            production,
            site_name: env::var("SITE_NAME").unwrap_or_else(|_| "Pearls of Hope".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("website/uploads")),
            session_timeout_secs: env::var("ADMIN_SESSION_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }

    /// A config pointed at a throwaway data directory, for tests.
    #[cfg(test)]
    pub fn for_tests(data_dir: &std::path::Path) -> Config {
        Config {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            db_name: "ngo_website_test".to_string(),
            production: false,
            site_name: "Pearls of Hope".to_string(),
            data_dir: data_dir.to_path_buf(),
            upload_dir: data_dir.join("uploads"),
            session_timeout_secs: 3600,
        }
    }
}
