//! Configuration resolution for bmcat-catalog
//!
//! Secrets resolve with environment → TOML priority.

use bmcat_common::config::TomlConfig;
use bmcat_common::{Error, Result};
use tracing::{info, warn};

use crate::services::OsuCredentials;

pub const OSU_CLIENT_ID_ENV: &str = "BMCAT_OSU_CLIENT_ID";
pub const OSU_CLIENT_SECRET_ENV: &str = "BMCAT_OSU_CLIENT_SECRET";
pub const ADMIN_TOKEN_ENV: &str = "BMCAT_ADMIN_TOKEN";

/// Default HTTP port when neither CLI, environment nor TOML set one
pub const DEFAULT_PORT: u16 = 5810;

/// Resolve osu! OAuth client credentials
pub fn resolve_osu_credentials(toml_config: &TomlConfig) -> Result<OsuCredentials> {
    let client_id = resolve_value(
        "osu! client id",
        OSU_CLIENT_ID_ENV,
        toml_config.osu.client_id.as_deref(),
    );
    let client_secret = resolve_value(
        "osu! client secret",
        OSU_CLIENT_SECRET_ENV,
        toml_config.osu.client_secret.as_deref(),
    );

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(OsuCredentials {
            client_id,
            client_secret,
        }),
        _ => Err(Error::Config(format!(
            "osu! credentials not configured. Set {} and {}, or [osu] client_id and \
             client_secret in config.toml",
            OSU_CLIENT_ID_ENV, OSU_CLIENT_SECRET_ENV
        ))),
    }
}

/// Resolve the moderator bearer token, if any
pub fn resolve_admin_token(toml_config: &TomlConfig) -> Option<String> {
    let token = resolve_value("admin token", ADMIN_TOKEN_ENV, toml_config.admin_token.as_deref());
    if token.is_none() {
        warn!("No admin token configured; moderation endpoints will reject every request");
    }
    token
}

fn resolve_value(label: &str, env_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_name).ok().filter(|v| is_valid(v));
    let toml_value = toml_value.filter(|v| is_valid(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment", label);
        return Some(value.trim().to_string());
    }

    toml_value.map(|value| {
        info!("{} loaded from TOML", label);
        value.trim().to_string()
    })
}

fn is_valid(value: &str) -> bool {
    !value.trim().is_empty()
}
