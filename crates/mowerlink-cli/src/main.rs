//! `mowerlink-cli` – MowerLink client entry point
//!
//! The `mowerlink` binary:
//!
//! 1. Loads `~/.mowerlink/config.toml` (writing the defaults on first run)
//!    and applies `MOWERLINK_*` environment overrides.
//! 2. Initialises structured logging (`RUST_LOG`, optional JSON output via
//!    `MOWERLINK_LOG_FORMAT=json`, optional OTLP export).
//! 3. Resolves the mower's endpoints and starts the synchronization layer.
//! 4. Reports link-status transitions to the terminal until **Ctrl-C**.

mod config;

use colored::Colorize;
use tracing::warn;

use mowerlink_runtime::{MowerLink, telemetry};
use mowerlink_types::LinkStatus;

#[tokio::main]
async fn main() {
    let _guard = telemetry::init_tracing("mowerlink");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  Wrote default config to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => warn!(error = %e, "could not write default config"),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Bring the link up ─────────────────────────────────────────────────
    println!(
        "  Resolving endpoints via {} …",
        format!("http://{}:{}", cfg.mower_host, cfg.discovery_port).bold()
    );
    let link = MowerLink::init(cfg.link_config()).await;

    let store = link.store();
    let endpoints = store.endpoints();
    if endpoints.is_fallback {
        println!(
            "{}",
            "  ⚠ Discovery failed – placeholder camera, no control channel.".yellow()
        );
    } else {
        println!("  Camera feed: {}", endpoints.camera.bold());
        println!("  Stream:      {}", endpoints.ws.bold());
    }

    // ── Status reporter ───────────────────────────────────────────────────
    let mut status = store.watch_link_status();
    let reporter = tokio::spawn(async move {
        loop {
            print_status(*status.borrow_and_update());
            if status.changed().await.is_err() {
                break;
            }
        }
    });

    // ── Run until Ctrl-C ──────────────────────────────────────────────────
    let _ = tokio::signal::ctrl_c().await;
    println!();
    println!("{}", "  Ctrl-C received – shutting down …".yellow());
    link.shutdown().await;
    reporter.abort();
    println!("{}", "  ✓ MowerLink stopped.".green());
}

fn print_status(status: LinkStatus) {
    match status {
        LinkStatus::Idle => println!("  link: {}", "idle".dimmed()),
        LinkStatus::Connecting { attempt } => {
            println!("  link: {} (attempt {attempt})", "connecting".cyan())
        }
        LinkStatus::Open => println!("  link: {}", "open".green().bold()),
        LinkStatus::Closed => println!("  link: {}", "closed".yellow()),
        LinkStatus::Errored => println!("  link: {}", "errored".red()),
        LinkStatus::Down => println!("  link: {}", "DOWN".red().bold()),
    }
}

fn print_banner() {
    println!();
    println!("  {}", "MowerLink".green().bold());
    println!("  {}", "telemetry sync for the robot mower".dimmed());
    println!();
}
