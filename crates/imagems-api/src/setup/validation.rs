//! Startup checks on top of [`Config::validate`].

use anyhow::Result;
use imagems_core::Config;

const MIN_JWT_SECRET_LEN: usize = 32;

/// Fails fast on configuration the service cannot run with; warns on
/// configuration it can run with but should not.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        tracing::warn!(
            "JWT secret is shorter than 32 characters - consider using a longer, more secure secret"
        );
    }

    if config.is_production() && config.master_api_key.is_none() {
        tracing::warn!("MASTER_API_KEY not set in production - upload routes rely on JWT alone");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/imagems"),
            ("JWT_SECRET", "secret"),
        ]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_upload_size_fails() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/imagems"),
            ("JWT_SECRET", "secret"),
            ("MAX_UPLOAD_SIZE_MB", "0"),
        ]);
        assert!(validate_config(&config).is_err());
    }
}
