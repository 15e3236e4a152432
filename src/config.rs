use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub media_root: PathBuf,
    pub media_url: String,
    pub cookie_secret: String,
    pub session_ttl_hours: i64,
    pub route_compression_threshold: usize,
    pub max_upload_bytes: usize,
    pub mail_from: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tripmate.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let media_url = env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-tripmate-session-cookie-secret".to_string());

        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", 24 * 30)?;
        let route_compression_threshold =
            parse_var("ROUTE_DATA_COMPRESSION_THRESHOLD", 1_000_000)?;
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?;

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "TripMate <noreply@tripmate.local>".into());
        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            listen_addr,
            media_root,
            media_url,
            cookie_secret,
            session_ttl_hours,
            route_compression_threshold,
            max_upload_bytes,
            mail_from,
            smtp,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
