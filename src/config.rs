use std::{env, io};

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

const DEFAULT_BATCH_SIZE: usize = 3;
const DEFAULT_MAX_CANDIDATES: usize = 20;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000;
const DEFAULT_DETAIL_STAGGER_MS: u64 = 200;
const DEFAULT_SEARCH_RADIUS_M: u32 = 5_000;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: String,
    pub database_file_name: String,
    pub places_api_base: String,
    pub google_places_api_key: Option<SecretString>,
    pub crm_api_url: Option<String>,
    pub crm_api_token: Option<SecretString>,
    pub batch_size: usize,
    pub max_candidates_per_run: usize,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub detail_stagger_ms: u64,
    pub search_radius_m: u32,
}

/// Safe-to-serialize view of the config; secrets reduced to presence flags.
#[derive(Clone, Debug, Serialize)]
pub struct PublicAppConfig {
    pub bind_addr: String,
    pub database_file_name: String,
    pub batch_size: usize,
    pub max_candidates_per_run: usize,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub detail_stagger_ms: u64,
    pub search_radius_m: u32,
    pub has_google_places_key: bool,
    pub has_crm_credentials: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            database_file_name: env::var("DATABASE_FILE_NAME")
                .unwrap_or_else(|_| "workspace-importer.db".to_string()),
            places_api_base: env::var("PLACES_API_BASE")
                .unwrap_or_else(|_| "https://maps.googleapis.com".to_string()),
            google_places_api_key: secret_var("GOOGLE_PLACES_API_KEY"),
            crm_api_url: env::var("CRM_API_URL").ok().filter(|v| !v.trim().is_empty()),
            crm_api_token: secret_var("CRM_API_TOKEN"),
            batch_size: parse_usize("IMPORT_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1),
            max_candidates_per_run: parse_usize("IMPORT_MAX_CANDIDATES", DEFAULT_MAX_CANDIDATES)
                .max(1),
            max_attempts: parse_u32("IMPORT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1),
            base_backoff_ms: parse_u64("IMPORT_BASE_BACKOFF_MS", DEFAULT_BASE_BACKOFF_MS),
            detail_stagger_ms: parse_u64("IMPORT_DETAIL_STAGGER_MS", DEFAULT_DETAIL_STAGGER_MS),
            search_radius_m: parse_u32("IMPORT_SEARCH_RADIUS_M", DEFAULT_SEARCH_RADIUS_M),
        }
    }

    pub fn public_profile(&self) -> PublicAppConfig {
        PublicAppConfig {
            bind_addr: self.bind_addr.clone(),
            database_file_name: self.database_file_name.clone(),
            batch_size: self.batch_size,
            max_candidates_per_run: self.max_candidates_per_run,
            max_attempts: self.max_attempts,
            base_backoff_ms: self.base_backoff_ms,
            detail_stagger_ms: self.detail_stagger_ms,
            search_radius_m: self.search_radius_m,
            has_google_places_key: self.google_places_api_key.is_some(),
            has_crm_credentials: self.crm_api_url.is_some() && self.crm_api_token.is_some(),
        }
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn secret_var(key: &str) -> Option<SecretString> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}
