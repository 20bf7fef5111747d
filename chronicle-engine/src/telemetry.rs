//! Tracing initialisation.

use chronicle_core::config::GeneralConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{EngineError, Result};

/// Install the global subscriber. `RUST_LOG` overrides
/// `general.log_level`; `general.json_logs` switches to JSON lines.
///
/// # Errors
///
/// [`EngineError::Telemetry`] if a global subscriber is already set.
pub fn init_tracing(general: &GeneralConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if general.json_logs {
        registry.with(fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| EngineError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        let general = GeneralConfig {
            log_level: "warn".into(),
            json_logs: true,
        };
        // Another test in this binary may have won the race; either way
        // the second call must fail.
        let _ = init_tracing(&general);
        assert!(matches!(init_tracing(&general), Err(EngineError::Telemetry(_))));
    }
}
