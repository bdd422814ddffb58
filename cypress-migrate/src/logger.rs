use crate::opts::DisplayStyle;

use cypress_migrate_lib::{
    logs::{LogMessage, Logger},
    text::counted,
};

struct Json2Logger;
struct RichLogger;

impl Logger for Json2Logger {
    fn log(&self, message: LogMessage) {
        crate::json_output::print_json(crate::json_output::JsonOutput::LogMessage(message))
    }
}

impl Logger for RichLogger {
    fn log(&self, message: LogMessage) {
        match message {
            LogMessage::DeletedPath { path } => {
                eprintln!("deleted {}", path.display());
            }

            LogMessage::MovedFile { from, to } => {
                eprintln!("moved {} to {}", from.display(), to.display());
            }

            LogMessage::RewroteImports { path, replacements } => {
                eprintln!(
                    "rewrote {} in {}",
                    counted(replacements, "import", "imports"),
                    path.display()
                );
            }

            LogMessage::StagedMoves {
                staging_directory,
                files,
            } => {
                eprintln!(
                    "some files are moved where others currently are, so {} will go through `{}` first",
                    counted(files, "file", "files"),
                    staging_directory.display()
                );
            }

            LogMessage::UnreadableCypressVersion { error, .. } => {
                eprintln!("couldn't tell which version of cypress is installed: {error}");
            }

            LogMessage::UpdatedProjectConfiguration { project } => {
                eprintln!("pointed the targets of {project} at the new config");
            }

            LogMessage::WroteFile { path } => {
                eprintln!("wrote {}", path.display());
            }
        }
    }
}

pub fn get_logger(options: &crate::opts::Options) -> Option<Box<dyn Logger>> {
    match options.display_style {
        DisplayStyle::Json2 => Some(Box::new(Json2Logger)),
        DisplayStyle::Rich => Some(Box::new(RichLogger)),
        DisplayStyle::Quiet => None,
    }
}
