use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Load configuration from a file using the config crate.
/// JSON is the native format; TOML and YAML are picked by extension.
pub async fn load_config(config_path: &str) -> Result<GatewayConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<GatewayConfig> {
    let config_path = Path::new(config_path);

    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Json,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

    let gateway_config: GatewayConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    tracing::debug!(
        "Loaded {} route(s) from {}",
        gateway_config.routes.len(),
        config_path.display()
    );

    Ok(gateway_config)
}
