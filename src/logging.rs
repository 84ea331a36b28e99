use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("LOKI_ENABLED is true but LOKI_URL is not set")]
    MissingLokiUrl,

    #[error("invalid log filter {0:?}: {1}")]
    Filter(String, String),

    #[error("invalid Loki URL: {0}")]
    LokiUrl(#[from] url::ParseError),

    #[cfg(feature = "loki")]
    #[error("Loki layer: {0}")]
    Loki(#[from] tracing_loki::Error),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Loki endpoint to ship to, if shipping is switched on.
fn loki_endpoint(settings: &LoggingSettings) -> Result<Option<url::Url>, LoggingError> {
    if !settings.loki_enabled {
        return Ok(None);
    }
    let raw = settings.loki_url.as_deref().ok_or(LoggingError::MissingLokiUrl)?;
    Ok(Some(url::Url::parse(raw)?))
}

fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(&settings.level)
        .map_err(|e| LoggingError::Filter(settings.level.clone(), e.to_string()))
}

/// Install the global subscriber: console output, plus a Loki layer labelled
/// with the service and environment when enabled. Must run inside the tokio
/// runtime, which drives the Loki shipping task.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let filter = env_filter(settings)?;
    let endpoint = loki_endpoint(settings)?;
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    #[cfg(feature = "loki")]
    {
        let loki_layer = match &endpoint {
            Some(url) => {
                let (layer, task) = tracing_loki::builder()
                    .label("service", &settings.service_name)?
                    .label("environment", &settings.environment)?
                    .build_url(url.clone())?;
                tokio::spawn(task);
                Some(layer)
            }
            None => None,
        };
        registry.with(loki_layer).try_init()?;
    }

    #[cfg(not(feature = "loki"))]
    registry.try_init()?;

    match &endpoint {
        Some(url) if cfg!(feature = "loki") => tracing::info!(
            "📊 Logging to console and Loki at {} (service={}, environment={})",
            url, settings.service_name, settings.environment
        ),
        Some(_) => tracing::warn!("LOKI_ENABLED is set but the `loki` feature is off, logging to console only"),
        None => tracing::info!("📊 Logging to console (filter: {})", settings.level),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loki_disabled_ignores_url() {
        let settings = LoggingSettings {
            loki_url: Some("not a url".to_string()),
            ..LoggingSettings::default()
        };
        assert!(loki_endpoint(&settings).unwrap().is_none());
    }

    #[test]
    fn test_loki_enabled_requires_url() {
        let settings = LoggingSettings {
            loki_enabled: true,
            ..LoggingSettings::default()
        };
        assert!(matches!(loki_endpoint(&settings), Err(LoggingError::MissingLokiUrl)));
    }

    #[test]
    fn test_loki_url_is_parsed() {
        let settings = LoggingSettings {
            loki_enabled: true,
            loki_url: Some("http://loki:3100".to_string()),
            ..LoggingSettings::default()
        };
        let url = loki_endpoint(&settings).unwrap().unwrap();
        assert_eq!(url.host_str(), Some("loki"));

        let bad = LoggingSettings {
            loki_url: Some("::nope".to_string()),
            ..settings
        };
        assert!(matches!(loki_endpoint(&bad), Err(LoggingError::LokiUrl(_))));
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        let settings = LoggingSettings {
            level: "craftprice=loud".to_string(),
            ..LoggingSettings::default()
        };
        assert!(matches!(env_filter(&settings), Err(LoggingError::Filter(..))));
        assert!(env_filter(&LoggingSettings::default()).is_ok());
    }
}
