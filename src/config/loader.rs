use super::models::Config;
use crate::types::GatewayError;
use crate::types::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

// Matches ${VAR_NAME} or ${VAR_NAME:-default}
static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]+))?\}").expect("valid env var regex")
});

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let mut config = if path.exists() {
        parse_config_file(path)?
    } else {
        tracing::info!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        Config::default()
    };

    config.apply_env_overrides();

    config
        .validate()
        .map_err(|e| GatewayError::Config(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let expanded = expand_env_vars(&content);

    // YAML unless the file says it is JSON
    let config: Config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        serde_json::from_str(&expanded)?
    } else {
        serde_yaml::from_str(&expanded)?
    };

    Ok(config)
}

fn expand_env_vars(content: &str) -> String {
    ENV_VAR_RE
        .replace_all(content, |cap: &regex::Captures| {
            let var_name = &cap[1];
            let default_value = cap.get(3).map(|m| m.as_str());

            std::env::var(var_name)
                .ok()
                .or_else(|| default_value.map(|s| s.to_string()))
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "Environment variable '{}' not found and no default provided",
                        var_name
                    );
                    String::new()
                })
        })
        .into_owned()
}
