use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::{Table, presets::UTF8_FULL};
use serde_json::json;
use std::path::PathBuf;

use osdeps::common::config::Config;
use osdeps::common::distro::OperatingSystem;
use osdeps::osdeps::{OsPackageResolver, PackageManager, ResolveStatus};
use osdeps::ui::{self, prelude::*};

/// Resolve abstract OS dependencies into native and language package lists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output JSON lines instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Additional osdeps file, merged after the configured sources
    #[arg(short = 'f', long = "file", global = true)]
    files: Vec<PathBuf>,

    /// Override the operating system, as names:versions (comma separated)
    #[arg(long, global = true, value_name = "NAMES:VERSIONS")]
    os: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the detected operating system
    Os,

    /// Show how a single osdeps name resolves
    Show { name: String },

    /// Show whether osdeps names can be installed on this OS
    Availability {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Resolve osdeps names into install commands per package manager
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List every known osdeps name
    List,
}

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, !cli.json);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            emit(Level::Error, "osdeps.cli.error", &format!("{:#}", e), None);
            std::process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(spec) = &cli.os {
        let os = OperatingSystem::parse_spec(spec)
            .ok_or_else(|| anyhow!("invalid --os value '{}', expected names:versions", spec))?;
        config.operating_system = Some(os);
    }
    Ok(config)
}

fn load_resolver(cli: &Cli, config: &Config) -> Result<OsPackageResolver> {
    config
        .resolver_with(&cli.files)
        .context("loading osdeps definitions")
}

fn run(cli: &Cli) -> Result<i32> {
    let Some(command) = &cli.command else {
        println!("osdeps: run with --help for usage");
        return Ok(0);
    };

    let config = load_config(cli)?;
    match command {
        Commands::Os => show_os(&config),
        Commands::Show { name } => show_package(&load_resolver(cli, &config)?, name),
        Commands::Availability { names } => {
            show_availability(&load_resolver(cli, &config)?, names)
        }
        Commands::Resolve { names } => resolve(&load_resolver(cli, &config)?, names),
        Commands::List => list(&load_resolver(cli, &config)?),
    }
}

fn show_os(config: &Config) -> Result<i32> {
    let Some(os) = config.operating_system() else {
        emit(
            Level::Warn,
            "osdeps.cli.unknown_os",
            "Unable to detect the operating system",
            None,
        );
        return Ok(1);
    };
    let registry = config.registry(Some(&os));

    if get_output_format() == OutputFormat::Json {
        emit(
            Level::Info,
            "osdeps.cli.os",
            &os.to_string(),
            Some(json!({
                "names": os.names,
                "versions": os.versions,
                "native_manager": registry.native(),
                "supported": os.is_supported(),
            })),
        );
        return Ok(0);
    }

    println!("{} {}", "Names:".bold(), os.names.join(", "));
    println!("{} {}", "Versions:".bold(), os.versions.join(", "));
    println!("{} {}", "Package manager:".bold(), registry.native());
    if !os.is_supported() {
        emit(
            Level::Warn,
            "osdeps.cli.unsupported_os",
            "This operating system is not supported",
            None,
        );
    }
    Ok(0)
}

fn show_package(resolver: &OsPackageResolver, name: &str) -> Result<i32> {
    let Some(resolution) = resolver.resolve_package(name) else {
        emit(
            Level::Error,
            "osdeps.cli.unknown_package",
            &format!("There is no osdeps definition for {}", name),
            Some(json!({ "name": name })),
        );
        return Ok(1);
    };
    let canonical = resolver.resolve_name(name);
    let sources = resolver.database().sources_of(canonical);
    let availability = resolver.availability_of(name);

    if get_output_format() == OutputFormat::Json {
        emit(
            Level::Info,
            "osdeps.cli.show",
            &format!("{}: {}", canonical, availability),
            Some(json!({
                "name": canonical,
                "sources": sources,
                "availability": availability,
                "resolution": resolution,
            })),
        );
        return Ok(0);
    }

    println!("{} {}", canonical.bold(), format!("({})", availability).dimmed());
    for source in &sources {
        println!("  defined in {}", source);
    }
    if resolution.is_empty() {
        return Ok(0);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Manager", "Status", "Packages"]);
    for entry in &resolution {
        let status = match entry.status {
            ResolveStatus::FoundPackages if entry.packages.is_empty() => "ignore",
            ResolveStatus::FoundPackages => "found",
            ResolveStatus::Nonexistent => "nonexistent",
        };
        table.add_row(vec![
            entry.manager.clone(),
            status.to_string(),
            entry.packages.join(" "),
        ]);
    }
    println!("{table}");
    Ok(0)
}

fn show_availability(resolver: &OsPackageResolver, names: &[String]) -> Result<i32> {
    let states: Vec<_> = names
        .iter()
        .map(|name| (name, resolver.availability_of(name)))
        .collect();

    if get_output_format() == OutputFormat::Json {
        for (name, availability) in &states {
            emit(
                Level::Info,
                "osdeps.cli.availability",
                &format!("{}: {}", name, availability),
                Some(json!({ "name": name, "availability": availability })),
            );
        }
        return Ok(0);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Name", "Availability"]);
    for (name, availability) in &states {
        table.add_row(vec![name.to_string(), availability.to_string()]);
    }
    println!("{table}");
    Ok(0)
}

fn install_hint(manager: &str, packages: &[String]) -> Option<String> {
    PackageManager::from_id(manager).map(|m| m.install_hint(packages))
}

fn resolve(resolver: &OsPackageResolver, names: &[String]) -> Result<i32> {
    let batches = match resolver.resolve_os_packages(names) {
        Ok(batches) => batches,
        Err(e) => {
            emit(
                Level::Error,
                "osdeps.cli.missing_osdep",
                &e.to_string(),
                Some(json!({ "name": e.package_name() })),
            );
            return Ok(1);
        }
    };

    if batches.is_empty() {
        emit(
            Level::Success,
            "osdeps.cli.nothing_to_install",
            "Nothing to install",
            None,
        );
        return Ok(0);
    }

    for (manager, packages) in &batches {
        let hint = install_hint(manager, packages);
        if get_output_format() == OutputFormat::Json {
            emit(
                Level::Info,
                "osdeps.cli.resolve",
                &format!("{}: {}", manager, packages.join(" ")),
                Some(json!({
                    "manager": manager,
                    "packages": packages,
                    "hint": hint,
                })),
            );
            continue;
        }
        println!("{} {}", format!("{}:", manager).bold(), packages.join(" "));
        if let Some(hint) = hint {
            println!("  {}", hint.dimmed());
        }
    }
    Ok(0)
}

fn list(resolver: &OsPackageResolver) -> Result<i32> {
    if get_output_format() == OutputFormat::Json {
        for (name, entry) in resolver.database().iter() {
            emit(
                Level::Info,
                "osdeps.cli.list",
                name,
                Some(json!({ "name": name, "source": entry.source })),
            );
        }
        return Ok(0);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Name", "Source"]);
    for (name, entry) in resolver.database().iter() {
        table.add_row(vec![name.to_string(), entry.source.clone()]);
    }
    println!("{table}");
    Ok(0)
}
