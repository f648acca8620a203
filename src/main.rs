//! Integrator CLI
//!
//! Entry point for the `integrator` command-line tool.

use clap::{Parser, Subcommand};
use integrator::{
    has_failures, HostConfig, Integrator, IntegratorConfig, ModuleLoader, RegistrationMode,
};
use std::path::{Path, PathBuf};
use std::process;

/// Default integrator config file
const DEFAULT_CONFIG: &str = "integrator.toml";

#[derive(Parser)]
#[command(name = "integrator")]
#[command(about = "Compose application settings into a host configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose applications into the host and print the effective configuration
    Compose {
        /// Host settings file
        #[arg(long)]
        host: PathBuf,

        /// Path to integrator config (default: integrator.toml if present)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Application to integrate (repeatable; added after configured ones)
        #[arg(long = "app")]
        apps: Vec<String>,

        /// Extra settings module by path or dotted name (repeatable)
        #[arg(long)]
        settings: Vec<String>,

        /// Restore a setting to its host value after composing (repeatable)
        #[arg(long)]
        restore: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List applications found in the applications directory
    Apps {
        /// Path to integrator config (default: integrator.toml if present)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Applications directory (overrides config)
        #[arg(long)]
        apps_dir: Option<PathBuf>,
    },

    /// Compose in collect mode and report every setting that fails to merge
    Check {
        /// Host settings file
        #[arg(long)]
        host: PathBuf,

        /// Path to integrator config (default: integrator.toml if present)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compose {
            host,
            config,
            apps,
            settings,
            restore,
            json,
        } => {
            run_compose(&host, config, apps, settings, restore, json);
        }
        Commands::Apps { config, apps_dir } => {
            run_apps(config, apps_dir);
        }
        Commands::Check { host, config } => {
            run_check(&host, config);
        }
    }
}

fn load_config(config_path: Option<PathBuf>) -> Result<IntegratorConfig, String> {
    match config_path {
        Some(path) => IntegratorConfig::from_file(&path).map_err(|e| e.to_string()),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG);
            if path.exists() {
                IntegratorConfig::from_file(&path).map_err(|e| e.to_string())
            } else {
                Ok(IntegratorConfig::default())
            }
        }
    }
}

fn load_or_exit(config_path: Option<PathBuf>) -> IntegratorConfig {
    match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    }
}

fn load_host_or_exit(path: &Path) -> HostConfig {
    match HostConfig::from_file(path) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error loading host settings: {}", e);
            process::exit(1);
        }
    }
}

fn build_integrator_or_exit(config: &IntegratorConfig) -> Integrator {
    match config.integrator() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_compose(
    host_path: &Path,
    config_path: Option<PathBuf>,
    apps: Vec<String>,
    settings: Vec<String>,
    restore: Vec<String>,
    json_output: bool,
) {
    let mut config = load_or_exit(config_path);
    config.applications.extend(apps);
    config.settings.extend(settings);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let mut host = load_host_or_exit(host_path);
    let mut integrator = build_integrator_or_exit(&config);

    let registrations = match integrator.compose(&mut host, &config.applications, &config.settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    for key in &restore {
        if let Err(e) = integrator.restore(&mut host, key) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    if json_output {
        let output = serde_json::json!({
            "host": host.to_json(),
            "registrations": registrations,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        for registration in &registrations {
            eprintln!(
                "Integrated {} ({} settings, {} routes)",
                registration.name,
                registration.merged_keys.len(),
                registration.routes
            );
        }
        print_host(&host, &integrator);
    }
}

fn print_host(host: &HostConfig, integrator: &Integrator) {
    for (key, value) in host.settings() {
        let marker = if integrator.importer().is_observed(key) {
            "*"
        } else {
            " "
        };
        println!("{} {} = {}", marker, key, value.to_json());
    }
    if !host.routes().is_empty() {
        println!();
        println!("urlpatterns:");
        for route in host.routes() {
            println!("  {}", route);
        }
    }
}

fn run_apps(config_path: Option<PathBuf>, apps_dir: Option<PathBuf>) {
    let config = load_or_exit(config_path);
    let loader = ModuleLoader::new(apps_dir.unwrap_or(config.apps_dir));

    let apps = loader.discover();
    if apps.is_empty() {
        println!("No applications found in {}", loader.apps_dir().display());
        return;
    }
    for name in apps {
        let marker = if config.applications.contains(&name) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, name);
    }
}

fn run_check(host_path: &Path, config_path: Option<PathBuf>) {
    let config = load_or_exit(config_path);
    let mut host = load_host_or_exit(host_path);
    let mut integrator = build_integrator_or_exit(&config).with_mode(RegistrationMode::Collect);

    let registrations = match integrator.compose(&mut host, &config.applications, &config.settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    for registration in &registrations {
        let status = if registration.is_clean() { "ok" } else { "FAILED" };
        println!("{}: {} ({})", registration.name, status, &registration.digest[..12]);
        for failure in &registration.failures {
            println!("  {}: {}", failure.key, failure.reason);
        }
    }

    if has_failures(&registrations) {
        process::exit(1);
    }
}
