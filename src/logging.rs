// Logging setup for the command line tool

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV: &str = "UPLOADER_LOG_LEVEL";
pub const LOG_FORMAT_JSON_ENV: &str = "UPLOADER_LOG_FORMAT_JSON";

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1"
}

/// Install the global `tracing` subscriber.
///
/// Filtering directives come from `UPLOADER_LOG_LEVEL` and fall back to
/// `default_level`. Setting `UPLOADER_LOG_FORMAT_JSON` to `true` or `1`
/// switches to JSON lines. Logs go to stderr so command output stays clean.
pub fn initialize_logging(default_level: Option<LevelFilter>) -> anyhow::Result<()> {
    let is_json = std::env::var(LOG_FORMAT_JSON_ENV)
        .map(|value| is_truthy(&value))
        .unwrap_or(false);

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.unwrap_or(LevelFilter::INFO).into())
        .with_env_var(LOG_LEVEL_ENV)
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if is_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" TRUE "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_second_initialization_fails() {
        let _ = initialize_logging(Some(LevelFilter::WARN));
        assert!(initialize_logging(None).is_err());
    }
}
