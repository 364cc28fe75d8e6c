use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "lumen_runtime=debug,wgpu=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
///
/// Hosts that already install a logger should not call this.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        builder.write_style(config.write_style);

        if builder.try_init().is_err() {
            return;
        }
        log::debug!("logging initialized");
    });
}
