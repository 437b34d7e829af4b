// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Read-only study dashboard: library, notes, calendar and focus history.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

use luminara::config::AppConfig;
use luminara::db::Database;
use luminara::Result;

#[derive(Parser, Debug)]
#[command(name = "luminara-web", version, about = "Serve the Luminara study dashboard")]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Address to listen on, e.g. 0.0.0.0:9000
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Serve a different PDF library folder
    #[arg(long)]
    library: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Launch the system browser once the server is up
    #[arg(long)]
    open: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(addr) = self.bind {
            config.web.host = addr.ip().to_string();
            config.web.port = addr.port();
        }
        if let Some(dir) = &self.library {
            config.storage.library_dir = dir.display().to_string();
        }
    }
}

fn browser_command(url: &str) -> Option<Command> {
    let (program, prefix): (&str, &[&str]) = if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/c", "start"])
    } else if cfg!(unix) {
        ("xdg-open", &[])
    } else {
        return None;
    };
    let mut command = Command::new(program);
    command.args(prefix).arg(url);
    Some(command)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose { "debug" } else { "info" })
        .with_target(false)
        .init();

    let mut config = AppConfig::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let db = Database::open(&config.storage.database)?;
    let stats = db.stats()?;
    info!(
        "{}: {} generated artifacts, {} focus sessions ({} min)",
        config.storage.database, stats.artifact_count, stats.focus_session_count, stats.focus_minutes
    );

    if args.open {
        let url = format!("http://{}:{}", config.web.host, config.web.port);
        match browser_command(&url).map(|mut c| c.spawn()) {
            Some(Ok(_)) => {}
            Some(Err(e)) => warn!("Could not launch a browser for {}: {}", url, e),
            None => warn!("No known browser launcher on this platform; visit {}", url),
        }
    }

    luminara::web::start_server(config, db).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_library_override_config() {
        let args = Args::try_parse_from([
            "luminara-web",
            "--bind",
            "0.0.0.0:9000",
            "--library",
            "/srv/pdfs",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.storage.library_dir, "/srv/pdfs");
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = Args::try_parse_from(["luminara-web"]).unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.web.port, AppConfig::default().web.port);
        assert!(!args.open);
    }

    #[test]
    fn test_bind_rejects_bare_host() {
        assert!(Args::try_parse_from(["luminara-web", "--bind", "localhost"]).is_err());
    }
}
