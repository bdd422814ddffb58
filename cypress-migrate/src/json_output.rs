use std::path::PathBuf;

use cypress_migrate_lib::{
    logs::LogMessage, IneligibleReason, MigrationPlan, MigrationReport,
};
use serde::Serialize;

use crate::validate_config::InvalidConfigError;

#[derive(Serialize)]
#[serde(tag = "type")]
pub enum JsonOutput<'a> {
    ComponentFiles(JsonComponentFiles<'a>),
    Error(JsonError),
    InvalidConfig(InvalidConfigError),
    LogMessage(LogMessage),
    Plan(&'a MigrationPlan),
    Report(&'a MigrationReport),
    Skipped(JsonSkipped<'a>),
}

#[derive(Serialize)]
pub struct JsonComponentFiles<'a> {
    pub(crate) project: &'a str,
    pub(crate) written: &'a [PathBuf],
}

#[derive(Serialize)]
pub struct JsonError {
    pub(crate) message: String,
}

#[derive(Serialize)]
pub struct JsonSkipped<'a> {
    pub(crate) project: &'a str,
    pub(crate) reason: IneligibleReason,
    pub(crate) message: String,
}

pub fn print_json(output: JsonOutput) {
    match serde_json::to_string(&output) {
        Ok(json) => println!("{json}"),
        Err(error) => eprintln!("couldn't serialize output: {error}"),
    }
}
