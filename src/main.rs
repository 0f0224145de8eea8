//! Argus request logger dashboard - Entry Point

use argus::session::{FileSession, Session};
use argus::transport::Target;
use argus::view::ColorConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Argus - terminal dashboard for the Argus HTTP request logger
#[derive(Parser, Debug)]
#[command(name = "argus")]
#[command(version)]
#[command(about = "Live table of HTTP requests recorded by an Argus server")]
pub struct Args {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Server deployment (development or production)
    #[arg(long)]
    pub target: Option<Target>,

    /// Server origin used by the production target, e.g. https://api.example.com
    #[arg(long)]
    pub server: Option<String>,

    /// Requests per page (must be positive)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Remember that this machine is logged in, then exit
    #[arg(long, conflicts_with = "logout")]
    pub login: bool,

    /// Forget the stored login, then exit
    #[arg(long)]
    pub logout: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = argus::config::load_config_with_precedence(args.config.clone())?;
        let merged = argus::config::merge_config(config_file);
        let with_env = argus::config::apply_env_overrides(merged)?;
        argus::config::apply_cli_overrides(
            with_env,
            args.target,
            args.server.clone(),
            args.page_size,
        )
        .validate()?
    };

    argus::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    if args.login || args.logout {
        let mut session = FileSession::load(&config.session_file_path)?;
        session.set_authenticated(args.login)?;
        info!(authenticated = args.login, path = ?session.path(), "Session flag updated");
        println!(
            "{} ({})",
            if args.login { "Logged in" } else { "Logged out" },
            session.path().display()
        );
        return Ok(());
    }

    argus::view::run_dashboard(&config, ColorConfig::from_env_and_args(args.no_color))?;

    Ok(())
}
