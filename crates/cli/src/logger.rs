/// Define log format used
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Basic,
    Pretty,
    Json,
}

/// Initializing logging facilities
///
/// Log filtering is configured in this priority order:
/// - `AZION_LOG` env variable, formatted for [tracing_subscriber::EnvFilter]
/// - `RUST_LOG` "standard" env variable, also formatted for [tracing_subscriber::EnvFilter]
/// - `debug` level when `--debug` is given, `error` otherwise
pub fn init(log_format: LogFormat, debug: bool) {
    use std::env;

    use tracing::Level;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let fmt_layer = fmt::layer().with_target(false).without_time();

    let fmt_layer = match log_format {
        LogFormat::Basic => fmt_layer.boxed(),
        LogFormat::Pretty => fmt_layer.pretty().boxed(),
        LogFormat::Json => fmt_layer.json().boxed(),
    };

    let filter_layer = {
        let level = if debug { Level::DEBUG } else { Level::ERROR };

        let directives = env::var("AZION_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_default();

        EnvFilter::builder()
            .with_default_directive(level.into())
            .parse_lossy(directives)
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
