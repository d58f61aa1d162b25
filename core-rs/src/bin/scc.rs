//! SCC - Security Kernel console CLI
//!
//! Inspect the route map, manage the demo persona and dry-run navigation
//! against a live permission endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use scc_core::routes::keys;
use scc_core::{
    ConsoleConfig, ConsoleContext, IdentityProvider, LocalState, Navigation, PermissionOrigin, RouteRegistry, Router,
    DEFAULT_CONFIG_FILE,
};

#[derive(Parser)]
#[command(name = "scc")]
#[command(version)]
#[command(about = "Security Kernel console core", long_about = None)]
struct Cli {
    /// Config file (default: ./scc.yaml when present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the route map
    Routes {
        /// Only routes shown in navigation, grouped by section
        #[arg(long)]
        nav: bool,
    },
    /// List demo personas
    Personas,
    /// Make a demo persona active (persisted across runs)
    UsePersona {
        /// Persona id, e.g. `auditor`
        id: String,
    },
    /// Fetch and show the current principal's permissions
    Permissions,
    /// Resolve a path through the guard chain
    Open {
        /// Console path, e.g. `/roles/new`
        path: String,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ConsoleConfig> {
    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    let path = match path {
        Some(p) => Some(p),
        None if default_path.exists() => Some(default_path.as_path()),
        None => None,
    };
    ConsoleConfig::resolve(path).context("failed to load console configuration")
}

/// Every registry entry bound to a page named after its label
fn compose(registry: Arc<RouteRegistry>) -> scc_core::Result<Router<String>> {
    let mut builder = Router::builder(Arc::clone(&registry));
    for entry in registry.entries() {
        let label = entry.label.clone();
        builder = match entry.route_key.as_str() {
            keys::LOGIN | keys::FORBIDDEN | keys::NOT_FOUND => builder.public(&entry.route_key, move |_| label.clone()),
            _ => builder.protected(&entry.route_key, move |_| label.clone()),
        };
    }
    builder.build()
}

fn handle_routes(nav: bool) -> Result<()> {
    let registry = RouteRegistry::console()?;

    if nav {
        for (section, entries) in registry.nav_sections() {
            println!("{}", section.label().bold());
            for entry in entries {
                println!(
                    "  {:<20} {:<28} {}",
                    entry.label,
                    entry.path,
                    entry.required_permission.as_deref().unwrap_or("-").dimmed()
                );
            }
        }
        return Ok(());
    }

    println!("{:<20} {:<30} {:<20} {}", "KEY".bold(), "PATH".bold(), "PERMISSION".bold(), "NAV".bold());
    for entry in registry.entries() {
        println!(
            "{:<20} {:<30} {:<20} {}",
            entry.route_key,
            entry.path,
            entry.required_permission.as_deref().unwrap_or("-"),
            if entry.show_in_nav { "yes" } else { "" }
        );
    }
    Ok(())
}

fn handle_personas(config: &ConsoleConfig, state: &LocalState) -> Result<()> {
    let identity = IdentityProvider::from_config(config, state)?;
    let Some(simulated) = identity.as_simulated() else {
        println!("{}", "Persona switching is only available in demo mode".yellow());
        return Ok(());
    };

    let active = simulated.active_persona().id.clone();
    for persona in simulated.roster() {
        let marker = if persona.id == active { "*".green().bold() } else { " ".normal() };
        println!(
            "{} {:<14} {:<22} {:<22} {}",
            marker, persona.id, persona.display_name, persona.email, persona.role_label.dimmed()
        );
    }
    Ok(())
}

fn handle_use_persona(config: &ConsoleConfig, state: &LocalState, id: &str) -> Result<()> {
    let identity = IdentityProvider::from_config(config, state)?;
    let simulated = identity
        .as_simulated()
        .ok_or(scc_core::SccError::PersonaSwitchUnavailable)?;

    if simulated.switch_persona(id)? {
        let persona = simulated.active_persona();
        println!("{} Now acting as {} <{}>", "✓".green(), persona.display_name, persona.email);
    } else {
        println!("Persona '{}' is already active", id);
    }
    Ok(())
}

async fn handle_permissions(config: ConsoleConfig, state: LocalState) -> Result<()> {
    let ctx = ConsoleContext::start(config, state, compose)?;
    let principal = ctx.principal();
    let permissions = ctx.permissions().settled().await;

    match principal.email() {
        Some(email) => println!("Principal: {} <{}>", principal.display_name().unwrap_or("-"), email),
        None => println!("Principal: {}", "anonymous".yellow()),
    }

    let origin = match permissions.origin {
        PermissionOrigin::Remote => "remote".green(),
        PermissionOrigin::Fallback => "fallback".yellow(),
        PermissionOrigin::None => "none".dimmed(),
    };
    println!("Source: {}", origin);
    if permissions.is_error {
        println!("{}", "Permission endpoint unavailable, fallback set applied".yellow());
    }

    for code in &permissions.permissions {
        println!("  {}", code);
    }

    ctx.shutdown();
    Ok(())
}

async fn handle_open(config: ConsoleConfig, state: LocalState, path: &str) -> Result<bool> {
    let ctx = ConsoleContext::start(config, state, compose)?;
    ctx.permissions().settled().await;

    let allowed = match ctx.navigate(path) {
        Navigation::Render { route, page } => {
            println!("{} {} ({})", "ALLOWED".green().bold(), page, route.route_key);
            for crumb in ctx.registry().breadcrumb(&route.route_key)? {
                print!("{} ", crumb.dimmed());
            }
            println!();
            true
        }
        Navigation::Redirect { to, reason, .. } => {
            println!("{} {:?} -> {}", "DENIED".red().bold(), reason, to);
            false
        }
        Navigation::Loading { .. } => {
            println!("{}", "PENDING".yellow().bold());
            false
        }
        Navigation::NotFound { path } => {
            println!("{} no route matches {}", "NOT FOUND".red().bold(), path);
            false
        }
    };

    ctx.shutdown();
    Ok(allowed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let state = LocalState::persistent(&config.state_dir)
        .with_context(|| format!("failed to open state directory {}", config.state_dir.display()))?;

    match cli.command {
        Commands::Routes { nav } => handle_routes(nav)?,
        Commands::Personas => handle_personas(&config, &state)?,
        Commands::UsePersona { id } => handle_use_persona(&config, &state, &id)?,
        Commands::Permissions => handle_permissions(config, state).await?,
        Commands::Open { path } => {
            if !handle_open(config, state, &path).await? {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
