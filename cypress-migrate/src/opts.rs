use std::path::PathBuf;

use structopt::{clap::arg_enum, StructOpt};

#[derive(Clone, Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub struct Options {
    /// The root of the Nx workspace
    #[structopt(long, default_value = ".", parse(from_os_str))]
    pub workspace_root: PathBuf,

    /// A toml file to configure the migration [default: cypress-migrate.toml]
    // .default is not used here since if the user explicitly specifies the config file
    // we want it to error if it doesn't exist
    #[structopt(long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Sets the display method
    #[structopt(
        long,
        possible_values = &DisplayStyle::variants(),
        case_insensitive = true,
        default_value = "Rich",
    )]
    pub display_style: DisplayStyle,

    #[structopt(
        long,
        possible_values = &Color::variants(),
        case_insensitive = true,
        default_value = "Auto",
    )]
    pub color: Color,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub enum Command {
    /// Moves a project from cypress.json to cypress.config
    Migrate {
        /// The name of the project in workspace.json
        project: String,

        /// The target running cypress
        #[structopt(long, default_value = "e2e")]
        target: String,

        /// Prints what would change without changing anything
        #[structopt(long)]
        dry_run: bool,

        /// The installed major version of cypress, instead of reading it from node_modules
        #[structopt(long)]
        cypress_version: Option<u32>,
    },

    /// Adds the boilerplate files needed for component testing
    AddComponentFiles {
        /// The name of the project in workspace.json
        project: String,
    },

    /// Checks the config file, reporting where it is invalid
    ValidateConfig,
}

arg_enum! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum DisplayStyle {
        Json2,
        Rich,
        Quiet,
    }
}

arg_enum! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Color {
        Always,
        Auto,
        Never,
    }
}
