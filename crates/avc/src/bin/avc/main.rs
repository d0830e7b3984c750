mod cli;

use avc::check::Violation;
use avc::document::ModuleDocument;
use avc::engine;
use avc::hcl_sources::{HclSources, OsSourceReader};
use avc::registry::Registry;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("AVC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(2);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(2);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Check(check_cli) => check(check_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli).map(|()| false),
    };

    match command_result {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            for error in e.chain() {
                eprintln!("{error}")
            }
            std::process::exit(2);
        }
    }
}

/// Runs the rule set; `Ok(true)` means violations were found
pub fn check(cli: cli::CheckCommand) -> anyhow::Result<bool> {
    let sources = load(&cli.input)?;
    let document = ModuleDocument::new(&sources)?;

    let violations = engine::run(&document, &Registry::builtin());
    output(&cli.output, &violations)?;

    Ok(!violations.is_empty())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<HclSources> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(body.into());
    }

    let reader = OsSourceReader;
    let mut sources = HclSources::default();

    if input.workdir {
        sources.load_directory(&reader, &std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        sources.load_file(&reader, file_path)?;
    }

    for dir_path in &input.directories {
        sources.load_directory(&reader, dir_path)?;
    }

    anyhow::ensure!(sources.source_count() > 0, "No files loaded");

    Ok(sources)
}

fn output(output: &cli::OutputArgs, violations: &[Violation]) -> anyhow::Result<()> {
    use std::io::Write;

    match output.format {
        cli::OutputFormat::Text => {
            let mut stdout = std::io::stdout().lock();
            for violation in violations {
                writeln!(stdout, "{violation}")?;
            }
        }
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), violations)?,
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), violations)?,
    };

    Ok(())
}

/// (avc-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    match cli.command {
        Rules => {
            let registry = Registry::builtin();
            for rule in registry.rules() {
                println!("{} <{}> {}", rule.rule, rule.severity, rule.link);
            }
            for interface in registry.interfaces() {
                println!("{} <{}> {}", interface.rule, interface.severity, interface.link);
            }
        }
        Sources => {
            let sources = load_workdir()?;
            println!("{sources:#?}");
        }
        Model => {
            let sources = load_workdir()?;
            let document = ModuleDocument::new(&sources)?;
            println!("{document:#?}");
        }
    }

    Ok(())
}

fn load_workdir() -> anyhow::Result<HclSources> {
    let mut sources = HclSources::default();
    sources.load_directory(&OsSourceReader, &std::env::current_dir()?)?;
    Ok(sources)
}
