#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod capture;
mod cli;
mod error_fmt;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use weigh_core::CaptureOutcome;

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn load_config(path: Option<&Path>) -> eyre::Result<weigh_config::Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            toml::from_str::<weigh_config::Config>(&text).wrap_err("parse config TOML")?
        }
        None => weigh_config::Config::default(),
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Console logs go to stderr so stdout carries only results. The optional
/// `[logging].file` gets JSON lines through a non-blocking appender.
fn init_tracing(json: bool, level: &str, logging: &weigh_config::Logging) {
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    let console_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (json_layer, text_layer) = if json {
        (
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(console_filter()),
            ),
            None,
        )
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(console_filter()),
            ),
        )
    };

    let file_layer = logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "weigh.log".into(), std::ffi::OsStr::to_os_string);
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(EnvFilter::new(logging.level.as_deref().unwrap_or("info")))
    });

    let _ = tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init();
}

/// Print `value` as one JSON line or as `text`, and mirror it to `out` if asked.
fn emit(json: bool, out: Option<&Path>, value: &Value, text: &str) -> eyre::Result<()> {
    if let Some(p) = out {
        weigh_core::atomic::write_json_atomic(p, value)
            .wrap_err_with(|| format!("write result to {}", p.display()))?;
    }
    if json {
        println!("{value}");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn outcome_text(outcome: &CaptureOutcome) -> String {
    match outcome {
        CaptureOutcome::Single { slot, weight } => format!("captured {slot}: {weight:.1}"),
        CaptureOutcome::Axles { records, total } => {
            let mut lines: Vec<String> = records
                .iter()
                .map(|r| {
                    format!(
                        "axle {} ({}): {:.1}",
                        r.axle_number,
                        r.axle_type.as_str(),
                        r.weight
                    )
                })
                .collect();
            lines.push(format!("total: {total:.1}"));
            lines.join("\n")
        }
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let Cli {
        config,
        fleet,
        json,
        log_level,
        out,
        cmd,
    } = cli;

    let cfg = load_config(config.as_deref())?;
    init_tracing(json, &log_level, &cfg.logging);
    tracing::debug!(
        method = ?cfg.source.method,
        driver = ?cfg.source.driver,
        mode = ?cfg.runner.mode,
        "config loaded"
    );

    let fleet = fleet
        .as_deref()
        .map(weigh_config::load_fleet_csv)
        .transpose()?;
    if let Some(f) = &fleet {
        tracing::info!(vehicles = f.len(), "fleet loaded");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let c = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || c.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler; captures cannot be interrupted");
        }
    }

    let out = out.as_deref();
    match cmd {
        Commands::Capture { slot, weight, opts } => {
            let outcome = capture::run_single(&cfg, slot.into(), weight, &opts, cancel)?;
            emit(json, out, &serde_json::to_value(&outcome)?, &outcome_text(&outcome))
        }
        Commands::Axles { vehicle, opts } => {
            let outcome =
                capture::run_axles(&cfg, fleet.as_ref(), vehicle.as_deref(), &opts, cancel)?;
            emit(json, out, &serde_json::to_value(&outcome)?, &outcome_text(&outcome))
        }
        Commands::Ticket { opts } => {
            let ticket = capture::run_ticket(&cfg, &opts, &cancel)?;
            let mut text = format!(
                "gross: {:.1}\ntare: {:.1}\nnet: {:.1}",
                ticket.gross, ticket.tare, ticket.net
            );
            if ticket.overloaded == Some(true) {
                text.push_str("\nOVERLOADED");
            }
            emit(json, out, &serde_json::to_value(ticket)?, &text)
        }
        Commands::SelfCheck => {
            let detail = capture::self_check(&cfg)?;
            emit(
                json,
                out,
                &json!({ "status": "ok", "detail": detail }),
                &format!("self-check ok: {detail}"),
            )
        }
    }
}
