use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::SummaryError;

/// Summary writer configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryWriterConfig {
    /// Number of pending events after which the event file is flushed.
    pub max_queue: usize,

    /// Number of seconds after which pending events are flushed.
    pub flush_secs: u64,

    /// Suffix that is appended to the event file name.
    pub filename_suffix: String,

    /// Discard events with a larger step from earlier runs that wrote
    /// to the same log directory.
    pub purge_step: Option<i64>,
}

impl Default for SummaryWriterConfig {
    fn default() -> Self {
        SummaryWriterConfig {
            max_queue: 10,
            flush_secs: 120,
            filename_suffix: String::new(),
            purge_step: None,
        }
    }
}

pub trait TomlRead
where
    Self: Sized,
{
    fn from_toml_read(read: impl Read) -> Result<Self, SummaryError>;
}

impl TomlRead for SummaryWriterConfig {
    fn from_toml_read(mut read: impl Read) -> Result<Self, SummaryError> {
        let mut data = String::new();
        read.read_to_string(&mut data)?;
        let config: SummaryWriterConfig = toml::from_str(&data)?;
        Ok(config)
    }
}
