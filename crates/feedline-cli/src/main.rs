//! feedline - stream large product feeds into size-bounded batches

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "feedline")]
#[command(about = "Stream large product feeds into size-bounded batches")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Config file path (default: ./feedline.toml or ~/.config/feedline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract items from a feed and send them in batches
    Run(cmd::run::RunArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = feedline_core::ProgressContext::new();

    // Logging:
    //   TTY:     info through the progress bars, debug with --debug
    //   non-TTY: plain lines for log aggregation
    //   --quiet: warnings and errors only
    let multi = progress.is_tty().then(|| progress.multi());
    feedline_core::init_logging(cli.quiet, cli.debug, multi);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Run(args) => {
            setup_signal_handler().context("Failed to install signal handlers")?;
            cmd::run::run(args, &config, &progress)
        }
        Command::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

fn setup_signal_handler() -> std::io::Result<()> {
    // First signal: stop reading, skip the final flush
    // Second signal: force exit
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
    for signal in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT] {
        unsafe {
            signal_hook::low_level::register(signal, || {
                if feedline_core::request_shutdown() {
                    std::process::exit(130);
                }
            })?;
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let tags = &config.feed.tags;
    table.add_row(vec![
        "Threshold".to_string(),
        format!(
            "{} bytes ({:.2} MB)",
            feedline_core::fmt_num(config.batch.threshold_bytes),
            config.batch.threshold_bytes as f64 / feedline_core::ONE_MEGABYTE as f64
        ),
    ]);
    table.add_row(vec![
        "Send queue".to_string(),
        match config.batch.queue {
            0 => "inline".to_string(),
            n => format!("{n} batches"),
        },
    ]);
    table.add_row(vec!["Item tag".to_string(), tags.item.clone()]);
    table.add_row(vec![
        "Field tags".to_string(),
        format!("id={} title={} description={}", tags.id, tags.title, tags.description),
    ]);
    table.add_row(vec![
        "Recovery".to_string(),
        format!("{:?}", config.feed.recovery).to_lowercase(),
    ]);
    table.add_row(vec!["Sink".to_string(), config.sink.kind.to_string()]);
    table.add_row(vec![
        "Output directory".to_string(),
        config.sink.dir.display().to_string(),
    ]);
    table.add_row(vec![
        "HTTP URL".to_string(),
        config.http.url.clone().unwrap_or_else(|| "not set".to_string()),
    ]);
    table.add_row(vec![
        "HTTP token".to_string(),
        if config.http.token.is_some() {
            "configured"
        } else {
            "not set"
        }
        .to_string(),
    ]);
    table.add_row(vec![
        "HTTP retries".to_string(),
        format!(
            "{} (timeout {}s)",
            config.http.max_retries, config.http.timeout_secs
        ),
    ]);

    eprintln!("\n{table}");
}
