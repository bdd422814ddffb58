use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::Serialize;

static LOGGER: OnceCell<Box<dyn Logger>> = OnceCell::new();

pub trait Logger: Send + Sync {
    fn log(&self, message: LogMessage);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum LogMessage {
    DeletedPath {
        path: PathBuf,
    },

    MovedFile {
        from: PathBuf,
        to: PathBuf,
    },

    RewroteImports {
        path: PathBuf,
        replacements: usize,
    },

    /// Destinations overlap with sources, so every file goes through a staging directory first.
    StagedMoves {
        staging_directory: PathBuf,
        files: usize,
    },

    /// The installed cypress version couldn't be read, so it is treated as unknown.
    UnreadableCypressVersion {
        path: PathBuf,
        error: String,
    },

    UpdatedProjectConfiguration {
        project: String,
    },

    WroteFile {
        path: PathBuf,
    },
}

pub fn set_logger(logger: Box<dyn Logger>) {
    if LOGGER.set(logger).is_err() {
        unreachable!("logger already set");
    }
}

pub fn log(message: LogMessage) {
    if let Some(logger) = LOGGER.get() {
        logger.log(message);
    }
}
