// src/logging.rs
// =============================================================================
// Logger setup.
//
// RUST_LOG is read first; the --log-level flag then sets the level for our
// own crate. HTML parsing and HTTP internals are kept quiet unless RUST_LOG
// asks for them. Everything goes to stderr so stdout stays clean for JSON.
// =============================================================================

use std::io::Write;

use log::LevelFilter;

pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);

    // RUST_LOG directives win over the defaults above
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.filter_module("site_auditor", level);
    builder.target(env_logger::Target::Stderr);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            chrono::Utc::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    builder.try_init()
}
