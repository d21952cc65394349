use std::io::Write;

use env_logger::Builder;
use log::{Level, LevelFilter};

/// Environment variable consulted when no `-v` flag was given. Accepts the
/// usual `env_logger` filter syntax (`debug`, `bitcnt_rs=trace`, ...).
pub const LOG_ENV: &str = "BITCNT_LOG";

/// Map a `-v` occurrence count to a level filter.
/// 0 means "not given"; the caller then falls back to the environment.
pub fn level_from_verbosity(verbosity: u8) -> Option<LevelFilter> {
    match verbosity {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

/// Tag printed between brackets on each line.
pub fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

/// Logger writing `TOOL: [level] message` lines to stderr.
///
/// Explicit verbosity wins over `BITCNT_LOG`; the default is `warn`.
pub fn builder(tool: &'static str, verbosity: u8) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Warn);
    match level_from_verbosity(verbosity) {
        Some(level) => {
            builder.filter_level(level);
        }
        None => {
            builder.parse_env(LOG_ENV);
        }
    }
    builder.format(move |buf, record| {
        writeln!(buf, "{}: [{}] {}", tool, level_tag(record.level()), record.args())
    });
    builder
}

/// Install the logger. Calling this twice keeps the first one.
pub fn init(tool: &'static str, verbosity: u8) {
    let _ = builder(tool, verbosity).try_init();
}
