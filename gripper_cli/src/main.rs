#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod hw;
mod rt;
mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use gripper_core::GripperError;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::RunArgs;

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        let code = exit_code_for_error(&e);
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
}

/// Collapse a config failure into one `GripperError::Config` so it maps to its exit code.
fn config_error(e: eyre::Report) -> eyre::Report {
    let chain: Vec<String> = e.chain().map(|c| c.to_string()).collect();
    GripperError::Config(chain.join(": ")).into()
}

fn load_config(path: Option<&Path>) -> eyre::Result<gripper_config::Config> {
    let path: Option<PathBuf> = match path {
        Some(p) => Some(p.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let Some(path) = path else {
        return Ok(gripper_config::Config::default());
    };
    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("reading config {}", path.display()))
        .map_err(config_error)?;
    let cfg = gripper_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("parsing config {}", path.display()))
        .map_err(config_error)?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid config {}", path.display()))
        .map_err(config_error)?;
    Ok(cfg)
}

fn init_logging(cli: &Cli, cfg: &gripper_config::Config) {
    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    // Console logs go to stderr so stdout stays clean for status lines.
    if cli.json {
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed(),
        );
    } else {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if let Some(file) = cfg.logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gripper.log".to_string());
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let mut cfg = load_config(cli.config.as_deref())?;
    if let Commands::Run {
        swing_strategy: Some(s),
        ..
    } = &cli.cmd
    {
        cfg.swing.strategy = (*s).into();
        cfg.validate()
            .wrap_err("invalid --swing-strategy for this config")
            .map_err(config_error)?;
    }
    init_logging(&cli, &cfg);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let backend = hw::open_backend(&cfg)?;
    match cli.cmd {
        Commands::Run {
            sampler,
            direct,
            max_ticks,
            rt,
            rt_prio,
            rt_lock,
            ..
        } => run::run_controller(
            &cfg,
            backend,
            RunArgs {
                sampler,
                direct,
                max_ticks,
                rt,
                rt_prio,
                rt_lock,
            },
            shutdown,
            cli.json,
        ),
        Commands::SelfCheck => run::self_check(&cfg, backend, cli.json),
        Commands::Rebase => run::rebase(&cfg, backend, cli.json),
    }
}
