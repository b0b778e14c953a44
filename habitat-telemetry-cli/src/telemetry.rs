use std::fs::File;
use std::io::{BufReader, BufWriter};

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use habitat_telemetry::{SummaryWriter, SummaryWriterConfig, TelemetryWriter, TomlRead};

use crate::traits::TelemetryOption;

const LOG_DIR: &str = "LOG_DIR";
const SUMMARY_CONFIG: &str = "SUMMARY_CONFIG";

pub type FileTelemetryWriter = TelemetryWriter<SummaryWriter<BufWriter<File>>>;

/// Where and how telemetry is written.
pub struct TelemetrySettings {
    log_dir: Option<String>,
    config: SummaryWriterConfig,
}

impl TelemetrySettings {
    /// Open a writer, which is inert without a log directory.
    pub fn open(&self) -> Result<FileTelemetryWriter> {
        let writer = FileTelemetryWriter::from_option(self.log_dir.as_ref(), self.config.clone())
            .context("Cannot open TensorBoard log directory")?;

        if !writer.is_active() {
            log::info!("No log directory given, telemetry will not be written");
        }

        Ok(writer)
    }
}

pub struct LogDirOption;

impl TelemetryOption for LogDirOption {
    type Value = TelemetrySettings;

    fn add_to_app(app: Command) -> Command {
        app.arg(
            Arg::new(LOG_DIR)
                .long("log-dir")
                .value_name("DIR")
                .help("TensorBoard log directory, nothing is logged when absent"),
        )
        .arg(
            Arg::new(SUMMARY_CONFIG)
                .long("summary-config")
                .value_name("FILE")
                .help("Summary writer configuration (TOML)"),
        )
    }

    fn parse(matches: &ArgMatches) -> Result<Self::Value> {
        let config = match matches.get_one::<String>(SUMMARY_CONFIG) {
            Some(path) => load_summary_config(path)?,
            None => SummaryWriterConfig::default(),
        };

        Ok(TelemetrySettings {
            log_dir: matches.get_one::<String>(LOG_DIR).cloned(),
            config,
        })
    }
}

fn load_summary_config(path: &str) -> Result<SummaryWriterConfig> {
    let f = File::open(path).context(format!("Cannot open summary configuration: {}", path))?;
    SummaryWriterConfig::from_toml_read(BufReader::new(f))
        .context(format!("Cannot parse summary configuration: {}", path))
}
