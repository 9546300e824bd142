//! Logging setup. Loads `log4rs.yaml` from beside the binary's working
//! directory when present (teacher convention: configuration-file-driven
//! logging); otherwise installs a sane stderr/info default programmatically
//! so the service is runnable without any external config file.

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

const LOG_CONFIG_FILE: &str = "log4rs.yaml";

pub fn init() {
    if std::path::Path::new(LOG_CONFIG_FILE).exists() {
        if let Err(e) = log4rs::init_file(LOG_CONFIG_FILE, log4rs::file::Deserializers::default()) {
            eprintln!("failed to load {}: {}, falling back to default logging", LOG_CONFIG_FILE, e);
            init_default();
        }
    } else {
        init_default();
    }
}

fn init_default() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%dT%H:%M:%S%.3f)} {l} [{T}] {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(log::LevelFilter::Info))
        .expect("default logging configuration must be valid");
    let _ = log4rs::init_config(config);
}
