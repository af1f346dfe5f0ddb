//! falcommand-config: inspect and manage Falcommand launcher configuration.

use anyhow::{Context, Result};
use clap::Parser;
use falcommand_config::cli::{Cli, Command, RestoreArgs, SetArgs};
use falcommand_config::config::{
    ConfigPaths, ConfigService, DocumentLoader, PartialConfig, Resolution, Scope,
};
use falcommand_config::error::ErrorReport;
use falcommand_config::format::{self, OutputFormat};
use falcommand_config::logging::{self, LogTarget};
use falcommand_config::platform::{BuildMode, PlatformTag};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let output = OutputFormat::from_str(&cli.format)
        .with_context(|| {
            format!("unknown output format '{}', expected json, yaml or text", cli.format)
        })?;

    let build_mode = cli.build_mode.unwrap_or_else(BuildMode::of_binary);
    let platform = match cli.platform {
        Some(platform) => platform,
        None => match std::env::var("FALCOMMAND_PLATFORM") {
            Ok(value) => value.parse::<PlatformTag>().map_err(anyhow::Error::msg)?,
            Err(_) => PlatformTag::detect(),
        },
    };

    let mut paths = match &cli.config_dir {
        Some(dir) => ConfigPaths::with_config_dir(dir),
        None => ConfigPaths::discover(build_mode),
    };
    if let Some(dir) = &cli.backup_dir {
        paths.backup_dir = dir.clone();
    }
    debug!(
        config_dir = %paths.config_dir.display(),
        backup_dir = %paths.backup_dir.display(),
        %platform,
        %build_mode,
        "configuration paths"
    );

    let service = ConfigService::with_paths(&paths, platform, build_mode);

    match cli.command {
        Some(Command::Resolve) | None => run_resolve(&service, output, false),
        Some(Command::Validate) => run_resolve(&service, output, true),
        Some(Command::Sources) => {
            let sources = service.locator().enumerate();
            match output {
                OutputFormat::Text => print!("{}", format::format_sources(&sources)),
                _ => println!("{}", output.render(&sources)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Backups) => {
            let entries = service.backups().list()?;
            match output {
                OutputFormat::Text => print!("{}", format::format_backups(&entries)),
                _ => println!("{}", output.render(&entries)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Restore(args)) => run_restore(&service, output, args),
        Some(Command::Set(args)) => run_set(&service, args),
        Some(Command::Init) => {
            match service.init_defaults()? {
                Some(path) => eprintln!("Created {}", path.display()),
                None => eprintln!("User config already exists; left unchanged"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Resolve and print; `strict` turns validation issues into a failing exit code.
fn run_resolve(service: &ConfigService, output: OutputFormat, strict: bool) -> Result<ExitCode> {
    let resolution = match service.resolve() {
        Ok(resolution) => resolution,
        Err(err) => {
            let report = ErrorReport::from(&err);
            eprintln!("{}", output.render(&report)?);
            return Ok(ExitCode::from(2));
        }
    };

    if !strict {
        println!("{}", output.render(&*resolution.config)?);
    }
    report_diagnostics(&resolution);

    if strict && !resolution.is_valid() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn report_diagnostics(resolution: &Resolution) {
    for warning in &resolution.warnings {
        eprintln!("warning: {}", warning);
    }
    if !resolution.issues.is_empty() {
        eprintln!("{} validation issue(s):", resolution.issues.len());
        eprint!("{}", format::format_issues(&resolution.issues));
    }
    if let Err(e) = &resolution.backup {
        eprintln!("warning: backup not recorded: {}", e);
    }
}

fn run_restore(service: &ConfigService, output: OutputFormat, args: RestoreArgs) -> Result<ExitCode> {
    let config = match service.restore(args.sequence) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", output.render(&ErrorReport::from(&err))?);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", output.render(&config)?);

    if args.apply {
        let path = service.persist(Scope::User, None, &PartialConfig::from(config.clone()))?;
        service.adopt(config);
        info!(sequence = args.sequence, path = %path.display(), "restored backup");
        eprintln!("Restored backup #{} to {}", args.sequence, path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_set(service: &ConfigService, args: SetArgs) -> Result<ExitCode> {
    let content = read_input(&args.file)?;
    let loaded = DocumentLoader
        .parse(&args.file, &content)
        .with_context(|| format!("rejected {}", args.file.display()))?;
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    let path = service.persist(args.scope, args.tag, &loaded.document)?;
    eprintln!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read document from stdin")?;
        Ok(content)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}
