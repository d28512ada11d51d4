use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Runtime configuration, loaded once at startup from environment variables
/// and shared with handlers as `web::Data<Config>`.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Path of the SQLite database file.
    pub db_path: String,
    /// Root directory of the file storage area served under `/files`.
    pub storage_root: String,
    /// Prefix of generated reference numbers, e.g. `SUK`.
    pub reference_prefix: String,
    /// Secret for signed download URLs.
    pub signing_secret: String,
    /// Resend API key; when absent, status emails are skipped (logged).
    pub resend_api_key: Option<String>,
    /// Public base URL used in email links.
    pub site_url: String,
    /// Directory holding the TTF font families for the PDF renderer.
    pub fonts_dir: String,
}

impl Config {
    pub fn load() -> Self {
        Config {
            host: try_load("SURATKU_HOST", "127.0.0.1"),
            port: try_load("SURATKU_PORT", "8080"),
            db_path: try_load("SURATKU_DB", "suratku.sqlite"),
            storage_root: try_load("SURATKU_STORAGE", "./storage"),
            reference_prefix: try_load("SURATKU_REF_PREFIX", "SUK"),
            signing_secret: try_load("SURATKU_SIGNING_SECRET", "change-me"),
            resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
            site_url: try_load("SITE_URL", "http://127.0.0.1:8080"),
            fonts_dir: try_load("SURATKU_FONTS", "./fonts"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{} not set, using default: {}", key, default);
            default.to_string()
        })
        .parse()
        .map_err(|e| warn!("Invalid {} value: {}", key, e))
        .expect("Environment misconfigured!")
}
