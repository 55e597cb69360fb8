//! Global subscriber installation, isolated in its own test binary so no
//! other test observes the installed subscriber.

use forward_proxy::config::{LogFormat, ObservabilityConfig};
use forward_proxy::observability::logging::init_logging;

#[test]
fn second_install_is_rejected() {
    let config = ObservabilityConfig {
        log_format: LogFormat::Json,
        ..ObservabilityConfig::default()
    };

    init_logging(&config).unwrap();
    assert!(init_logging(&config).is_err());

    tracing::info!("Subscriber installed");
}
