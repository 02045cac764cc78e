//! Logging setup: env_logger, routed through indicatif on a TTY

use indicatif::MultiProgress;

/// Crates whose records are shown at the requested level.
/// Everything else (reqwest, hyper, ...) stays at `warn`.
const OWN_TARGETS: [&str; 2] = ["feedline", "feedline_core"];

/// Filter string for `env_logger` when `RUST_LOG` is unset
fn default_filter(quiet: bool, debug: bool) -> String {
    let level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let mut filter = String::from("warn");
    for target in OWN_TARGETS {
        filter.push_str(&format!(",{target}={level}"));
    }
    filter
}

fn level_label(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

fn level_color(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    }
}

/// Logger that suspends progress bars while printing a line
pub struct ProgressLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl ProgressLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for ProgressLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.matches(record) {
            return;
        }
        let level = record.level();
        let line = format!(
            "[{}{}\x1b[0m] {}",
            level_color(level),
            level_label(level),
            record.args()
        );
        self.multi.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize logging.
///
/// With `multi`, log lines are printed above the progress bars in color.
/// Without it, plain `[LEVEL] message` lines for log aggregation.
/// `RUST_LOG` overrides the computed filter in both modes.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or(default_filter(quiet, debug));

    match multi {
        Some(multi) => {
            let logger = env_logger::Builder::from_env(env).build();
            let max_level = logger.filter();
            match log::set_boxed_logger(Box::new(ProgressLogger::new(logger, multi.clone()))) {
                Ok(()) => log::set_max_level(max_level),
                Err(e) => eprintln!("logger already initialized: {e}"),
            }
        }
        None => {
            let result = env_logger::Builder::from_env(env)
                .format(|buf, record| {
                    writeln!(buf, "[{}] {}", level_label(record.level()), record.args())
                })
                .try_init();
            if let Err(e) = result {
                eprintln!("logger already initialized: {e}");
            }
        }
    }
}
