use std::env;
use std::path::PathBuf;

use derive_more::Display;
use dotenvy::dotenv;

use crate::auth::policy::{DEFAULT_MENTION_ROLES, DEFAULT_MODERATOR_ROLES};

const MIN_TOKEN_LEN: usize = 20;
const TOKEN_PLACEHOLDERS: [&str; 2] = ["ваш_токен", "your_token"];

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "BOT_TOKEN не установлен! Создайте файл .env и добавьте туда BOT_TOKEN=ваш_токен")]
    MissingToken,
    #[display(fmt = "Токен не установлен или неверный! Замените значение BOT_TOKEN в .env на реальный токен")]
    MalformedToken,
    #[display(fmt = "{} must be a number, got {:?}", name, value)]
    InvalidNumber { name: &'static str, value: String },
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    /// Shared secret: the gateway signs actor tokens with it
    pub bot_token: String,
    pub server_addr: String,
    pub data_file: PathBuf,
    pub default_department: String,
    pub moderator_roles: Vec<String>,
    pub mention_roles: Vec<String>,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub outbox_capacity: usize,
    pub api_prefix: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            bot_token: validate_token(lookup("BOT_TOKEN"))?,
            server_addr: var("SERVER_ADDR", "127.0.0.1:8080"),
            data_file: PathBuf::from(var("OTGUL_FILE", "otgul_requests.json")),
            default_department: var("DEFAULT_DEPARTMENT", "ГИБДД"),
            moderator_roles: role_list(lookup("MODERATOR_ROLES"), &DEFAULT_MODERATOR_ROLES),
            mention_roles: role_list(lookup("MENTION_ROLES"), &DEFAULT_MENTION_ROLES),
            rate_protected_per_min: number(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            outbox_capacity: number(&lookup, "OUTBOX_CAPACITY", 1000)?,
            api_prefix: var("API_PREFIX", "/api"),
            log_dir: var("LOG_DIR", "logs"),
        })
    }
}

fn validate_token(token: Option<String>) -> Result<String, ConfigError> {
    let token = token.ok_or(ConfigError::MissingToken)?;
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingToken);
    }

    let lowered = trimmed.to_lowercase();
    if trimmed.chars().count() < MIN_TOKEN_LEN
        || TOKEN_PLACEHOLDERS.iter().any(|p| lowered.contains(p))
    {
        return Err(ConfigError::MalformedToken);
    }
    Ok(trimmed.to_string())
}

fn role_list(raw: Option<String>, defaults: &[&str]) -> Vec<String> {
    let parsed: Vec<String> = raw
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        defaults.iter().map(|r| r.to_string()).collect()
    } else {
        parsed
    }
}

fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
