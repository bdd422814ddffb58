use std::{
    ffi::OsString,
    fmt, fs,
    io::{self, Write},
    path::PathBuf,
    sync::RwLock,
};

use color_eyre::eyre::{self, WrapErr};
use cypress_migrate_lib::{
    config::CONFIG_FILE_NAME,
    logs,
    project::read_project_configuration,
    scaffold::add_component_files,
    text::{counted, english_list},
    version::FixedVersion,
    DiskTree, IneligibleReason, MigrationConfig, MigrationOutcome, MigrationPlan,
    MigrationReport, Migrator, VersionProbe,
};
use structopt::{clap, StructOpt};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

mod json_output;
mod logger;
mod opts;
mod validate_config;
mod version_probe;

use json_output::{print_json, JsonComponentFiles, JsonError, JsonOutput, JsonSkipped};
use opts::DisplayStyle;

macro_rules! error {
    ($fmt:expr) => {
        error(fmt::format(format_args!($fmt))).unwrap();
    };

    ($fmt:expr, $($args:tt)*) => {
        error(fmt::format(format_args!($fmt, $($args)*))).unwrap();
    };
}

lazy_static::lazy_static! {
    static ref OPTIONS: RwLock<Option<opts::Options>> = RwLock::new(None);
}

fn get_color() -> ColorChoice {
    let lock = OPTIONS.read().unwrap();
    let opts = lock.as_ref().unwrap();

    match opts.color {
        opts::Color::Always => ColorChoice::Always,
        opts::Color::Auto => {
            if atty::is(atty::Stream::Stdout) {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        opts::Color::Never => ColorChoice::Never,
    }
}

fn error(text: String) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(get_color());
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
    write!(&mut stderr, "ERROR: ")?;
    stderr.reset()?;
    writeln!(&mut stderr, "{text}")?;
    Ok(())
}

fn warning(text: &str) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(get_color());
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    write!(&mut stderr, "WARNING: ")?;
    stderr.reset()?;
    writeln!(&mut stderr, "{text}")?;
    Ok(())
}

fn config_path(options: &opts::Options) -> PathBuf {
    match &options.config {
        Some(config) => config.clone(),
        None => options.workspace_root.join(CONFIG_FILE_NAME),
    }
}

fn load_config(options: &opts::Options) -> eyre::Result<MigrationConfig> {
    let path = config_path(options);

    let config_contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,

        // Only a config file asked for explicitly has to exist
        Err(_) if options.config.is_none() => return Ok(MigrationConfig::default()),

        Err(error) => {
            return Err(error)
                .wrap_err_with(|| format!("couldn't read config file `{}`", path.display()))
        }
    };

    MigrationConfig::from_toml(&config_contents)
        .wrap_err_with(|| format!("config file `{}` not in correct format", path.display()))
}

fn log_report(report: &MigrationReport) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(get_color());

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(&mut stdout, "Migrated {}", report.project)?;
    stdout.reset()?;

    writeln!(
        &mut stdout,
        ": moved {}, rewrote {} in {}, wrote {}",
        counted(report.moved_files, "file", "files"),
        counted(report.replacements, "import", "imports"),
        counted(report.rewritten_files, "file", "files"),
        report.modern_config.display(),
    )
}

fn log_plan(plan: &MigrationPlan) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(get_color());

    writeln!(&mut stdout, "Migrating {} would:", plan.project)?;

    for planned in plan.mapping.moves() {
        if planned.from != planned.to {
            writeln!(
                &mut stdout,
                "  move {} to {}",
                planned.from.display(),
                planned.to.display()
            )?;
        }
    }

    for rewrite in &plan.rewrites {
        writeln!(
            &mut stdout,
            "  rewrite {} in {}",
            counted(rewrite.replacements, "import", "imports"),
            rewrite.path.display()
        )?;
    }

    if let Some(staging_directory) = &plan.staging_directory {
        writeln!(
            &mut stdout,
            "  stage the moves in {}",
            staging_directory.display()
        )?;
    }

    writeln!(&mut stdout, "  write {}:", plan.modern_config.display())?;
    stdout.set_color(ColorSpec::new().set_dimmed(true))?;
    for line in plan.modern_config_source.lines() {
        writeln!(&mut stdout, "    {line}")?;
    }
    stdout.reset()?;

    writeln!(&mut stdout, "  delete {}", plan.legacy_config.display())
}

fn report_skipped(display_style: DisplayStyle, project: &str, reason: IneligibleReason) {
    match display_style {
        DisplayStyle::Json2 => print_json(JsonOutput::Skipped(JsonSkipped {
            project,
            reason,
            message: reason.to_string(),
        })),

        DisplayStyle::Rich => {
            warning(&format!("skipped {project}: {reason}")).ok();
        }

        DisplayStyle::Quiet => {}
    }
}

fn migrate(
    options: &opts::Options,
    project: &str,
    target: &str,
    dry_run: bool,
    cypress_version: Option<u32>,
) -> eyre::Result<()> {
    let config = load_config(options)?;

    let probe: Box<dyn VersionProbe> = match cypress_version {
        Some(version) => Box::new(FixedVersion(Some(version))),
        None => Box::new(version_probe::NodeModulesProbe::new(
            &options.workspace_root,
        )),
    };

    let migrator = Migrator::new(config, probe)?;
    let mut tree = DiskTree::new(&options.workspace_root);

    if dry_run {
        match migrator.plan(&tree, project, target)? {
            MigrationOutcome::Done(plan) => match options.display_style {
                DisplayStyle::Json2 => print_json(JsonOutput::Plan(&plan)),
                DisplayStyle::Rich | DisplayStyle::Quiet => log_plan(&plan)?,
            },

            MigrationOutcome::Skipped(reason) => report_skipped(options.display_style, project, reason),
        }

        return Ok(());
    }

    match migrator.run(&mut tree, project, target)? {
        MigrationOutcome::Done(report) => match options.display_style {
            DisplayStyle::Json2 => print_json(JsonOutput::Report(&report)),
            DisplayStyle::Rich => log_report(&report)?,
            DisplayStyle::Quiet => {}
        },

        MigrationOutcome::Skipped(reason) => report_skipped(options.display_style, project, reason),
    }

    Ok(())
}

fn add_component_files_command(options: &opts::Options, project: &str) -> eyre::Result<()> {
    let mut tree = DiskTree::new(&options.workspace_root);
    let configuration = read_project_configuration(&tree, project)?;
    let written = add_component_files(&mut tree, &configuration)?;

    match options.display_style {
        DisplayStyle::Json2 => print_json(JsonOutput::ComponentFiles(JsonComponentFiles {
            project,
            written: &written,
        })),

        DisplayStyle::Rich => {
            if written.is_empty() {
                println!("{project} already has every component testing file");
            } else {
                let names: Vec<String> = written
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect();

                println!("Added {} to {project}", english_list(&names));
            }
        }

        DisplayStyle::Quiet => {}
    }

    Ok(())
}

/// Returns whether the config is valid.
fn validate_config_command(options: &opts::Options) -> eyre::Result<bool> {
    let path = config_path(options);
    let config_contents = fs::read_to_string(&path)
        .wrap_err_with(|| format!("couldn't read config file `{}`", path.display()))?;

    match validate_config::validate_config(&path, &config_contents) {
        Ok(_) => {
            if options.display_style == DisplayStyle::Rich {
                println!("{} is valid", path.display());
            }

            Ok(true)
        }

        Err(invalid) => {
            match options.display_style {
                DisplayStyle::Json2 => print_json(JsonOutput::InvalidConfig(invalid)),
                DisplayStyle::Rich | DisplayStyle::Quiet => {
                    error!("{}", invalid.rich_output());
                }
            }

            Ok(false)
        }
    }
}

fn report_error(display_style: DisplayStyle, report: &eyre::Report) {
    match display_style {
        DisplayStyle::Json2 => print_json(JsonOutput::Error(JsonError {
            message: format!("{report:#}"),
        })),

        DisplayStyle::Rich | DisplayStyle::Quiet => {
            error!("{:#}", report);
        }
    }
}

fn start(options: opts::Options) {
    *OPTIONS.write().unwrap() = Some(options.clone());

    if let Some(logger) = logger::get_logger(&options) {
        logs::set_logger(logger);
    }

    let result = match &options.command {
        opts::Command::Migrate {
            project,
            target,
            dry_run,
            cypress_version,
        } => migrate(&options, project, target, *dry_run, *cypress_version).map(|_| true),

        opts::Command::AddComponentFiles { project } => {
            add_component_files_command(&options, project).map(|_| true)
        }

        opts::Command::ValidateConfig => validate_config_command(&options),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(report) => {
            report_error(options.display_style, &report);
            std::process::exit(1);
        }
    }
}

fn main() {
    if let Err(error) = color_eyre::install() {
        eprintln!("couldn't install error reporting: {error}");
    }

    start(get_opts());
}

fn get_opts() -> opts::Options {
    get_opts_safe(std::env::args_os().collect::<Vec<_>>()).unwrap_or_else(|err| err.exit())
}

fn get_opts_safe(args: Vec<OsString>) -> Result<opts::Options, clap::Error> {
    opts::Options::from_iter_safe(args)
}
