use std::sync::Arc;

use application::printer::{PrinterSession, SessionSettings};
use domain::{LabelRenderer, RelayPort};
use infrastructure::config::LoggingConfig;
use infrastructure::{AgentConfig, MockRelay, MockRenderer, ProcessRenderer, SysfsRelay};
use tracing::{info, warn};

/// One printer session plus the hardware it was wired to
pub struct Agent {
    session: PrinterSession,
    gpio: Option<Arc<SysfsRelay>>,
}

impl Agent {
    /// Wire a session from configuration
    ///
    /// A relay that cannot be opened is logged and the session runs without
    /// one. In dry-run mode the relay and the printing program are replaced by
    /// in-process fakes.
    pub async fn connect(config: &AgentConfig, dry_run: bool) -> Self {
        let settings = session_settings(config);

        if dry_run {
            info!("🧪 Dry run: using simulated relay and printer");
            let session = PrinterSession::new(
                Arc::new(MockRenderer::new()),
                Some(Arc::new(MockRelay::new())),
                settings,
            );
            return Self { session, gpio: None };
        }

        let renderer: Arc<dyn LabelRenderer> =
            Arc::new(ProcessRenderer::new(config.printer.binary.clone()));
        info!(binary = %config.printer.binary, "🖨️ Using printing program");

        let gpio = open_relay(config).await;
        let relay = gpio.clone().map(|r| r as Arc<dyn RelayPort>);

        Self {
            session: PrinterSession::new(renderer, relay, settings),
            gpio,
        }
    }

    pub fn session(&self) -> &PrinterSession {
        &self.session
    }

    pub fn has_gpio_relay(&self) -> bool {
        self.gpio.is_some()
    }

    /// Close the session, then release the GPIO line
    pub async fn shutdown(self) {
        self.session.close().await;
        if let Some(gpio) = &self.gpio {
            gpio.close().await;
        }
        info!("👋 Good bye!");
    }
}

pub fn session_settings(config: &AgentConfig) -> SessionSettings {
    SessionSettings {
        retry: config.retry_policy(),
        shutdown_delay: config.auto_shutdown_delay(),
        drafts_folder: config.drafts_folder(),
        folder_permissions: config.folder_permissions(),
        default_font_size: config.printer.font_size,
    }
}

async fn open_relay(config: &AgentConfig) -> Option<Arc<SysfsRelay>> {
    let pin = config.gpio.relay_pin?;

    match SysfsRelay::open(&config.gpio.sysfs_root, pin, config.gpio.active_low).await {
        Ok(relay) => Some(Arc::new(relay)),
        Err(e) => {
            warn!(pin, error = %e, "Failed to open relay, continuing without power control");
            None
        }
    }
}

/// Default `tracing` filter when `RUST_LOG` is unset: the configured level for
/// the workspace crates, warnings only for everything else
pub fn log_filter(logging: &LoggingConfig) -> String {
    let level = logging.filter_directive();
    format!(
        "warn,label_agent={0},application={0},infrastructure={0},domain={0}",
        level
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_uses_configured_level() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
        };
        assert_eq!(
            log_filter(&logging),
            "warn,label_agent=debug,application=debug,infrastructure=debug,domain=debug"
        );
    }

    #[test]
    fn test_session_settings_from_config() {
        let config = AgentConfig::from_yaml(
            "printer:\n  retry_attempts: 3\n  auto_shutdown_delay_minutes: 4\n  folder_permissions: \"700\"\n  font_size: 20\n",
        )
        .unwrap();

        let settings = session_settings(&config);

        assert_eq!(settings.retry.attempts(), 3);
        assert_eq!(settings.shutdown_delay.as_secs(), 240);
        assert_eq!(settings.folder_permissions, 0o700);
        assert_eq!(settings.default_font_size, 20);
    }
}
