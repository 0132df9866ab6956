use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

/// Log target for write operations (insert/update/delete).
pub const AUDIT_TARGET: &str = "visa_navigator::audit";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const RETENTION: u32 = 7;

#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Build the logging configuration: console always, plus rolling `app.log` and
/// `audit.log` under `dir` when given. Audit lines also reach the console.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be created.
pub fn build_config(dir: Option<&Path>, level: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level);
    let console = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build();
    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
        builder = builder
            .appender(Appender::builder().build("app", Box::new(rolling(dir, "app")?)))
            .appender(Appender::builder().build("audit", Box::new(rolling(dir, "audit")?)))
            .logger(Logger::builder().appender("audit").build(AUDIT_TARGET, lvl));
        root = root.appender("app");
    }

    Ok(builder.build(root.build(lvl))?)
}

fn rolling(dir: &Path, stem: &str) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{stem}.{{}}.log")).display()), RETENTION)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(dir.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Install the process-wide logger.
///
/// # Errors
/// Returns an error if the configuration cannot be built or a logger is already installed.
pub fn configure_logging(dir: Option<&Path>, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_config(build_config(dir, level)?)?;
    Ok(())
}

/// Record a write against a collection.
pub fn log_audit(op: &str, collection: &str, id: &str, detail: Option<&str>) {
    match detail {
        Some(d) => log::info!(target: AUDIT_TARGET, "op={op} collection={collection} id={id} {d}"),
        None => log::info!(target: AUDIT_TARGET, "op={op} collection={collection} id={id}"),
    }
}
