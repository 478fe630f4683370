mod commands;
mod gateway;
mod sequencer;
#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use relink_channels::telegram::TelegramChannel;
use relink_core::{config, traits::Channel};
use relink_rules::{find_link_spans, rewrite, RuleSet};
use sequencer::Sequencer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "relink",
    version,
    about = "Relink: fixes paywalled and social links in your chats"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml", env = "RELINK_CONFIG")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Show the loaded configuration and channel readiness.
    Status,
    /// Run the link rules over some text and print the result.
    Rewrite {
        /// The text to rewrite.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Queue a message for the running bot to send to every allowed chat.
    Broadcast {
        /// The message to broadcast.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _guard = init_logging(&cfg.relink.log_level, Some(&cfg.relink.data_dir));

            // Build channels.
            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();

            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    if tg.bot_token.is_empty() {
                        anyhow::bail!(
                            "Telegram is enabled but bot_token is empty. \
                             Set it in config.toml or TELEGRAM_BOT_TOKEN env var."
                        );
                    }
                    let channel = TelegramChannel::new(tg.clone());
                    channels.insert("telegram".to_string(), Arc::new(channel));
                }
            }

            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
            }

            if cfg.auth.allowed_chats.is_empty() {
                warn!("auth.allowed_chats is empty: no chat will get links rewritten");
            }

            let rules = RuleSet::from_config(&cfg.rules)?;
            let sequencer = if cfg.sequencer.enabled {
                Some(Sequencer::from_config(&cfg.sequencer)?)
            } else {
                None
            };

            println!("{}: starting...", cfg.relink.name);
            let gw = Arc::new(gateway::Gateway::new(
                cfg.relink.name.clone(),
                channels,
                rules,
                cfg.auth.clone(),
                sequencer,
                cfg.broadcast.clone(),
            ));
            gw.run().await?;
        }
        Commands::Status => {
            let rules = RuleSet::from_config(&cfg.rules)?;
            println!("{}: status check\n", cfg.relink.name);
            println!("Config: {}", cli.config);
            println!("Data dir: {}", config::shellexpand(&cfg.relink.data_dir));
            println!();

            println!("  allowed chats: {}", cfg.auth.allowed_chats.len());
            println!(
                "  info commands: {}",
                if cfg.auth.gate_info_commands {
                    "allowed chats only"
                } else {
                    "any chat"
                }
            );
            println!("  paywall domains: {}", rules.paywall_count());
            println!("  social mirrors: {}", rules.mirror_count());
            println!("  redirector: {}", rules.redirector_base());
            if cfg.sequencer.enabled {
                println!(
                    "  sequencer: {} sequence(s), {}s cooldown, veto day: {}",
                    cfg.sequencer.sequences.len(),
                    cfg.sequencer.cooldown_secs,
                    cfg.sequencer.veto_weekday.as_deref().unwrap_or("none")
                );
            } else {
                println!("  sequencer: disabled");
            }
            if cfg.broadcast.enabled {
                println!(
                    "  broadcast: {} every {}s",
                    config::shellexpand(&cfg.broadcast.path),
                    cfg.broadcast.interval_secs
                );
            } else {
                println!("  broadcast: disabled");
            }
            println!();

            // Check channels.
            if let Some(ref tg) = cfg.channel.telegram {
                println!(
                    "  telegram: {}",
                    if TelegramChannel::new(tg.clone()).is_configured() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                );
            } else {
                println!("  telegram: not configured");
            }
        }
        Commands::Rewrite { text } => {
            if text.is_empty() {
                anyhow::bail!("no text provided. Usage: relink rewrite <text>");
            }
            let _guard = init_logging(&cfg.relink.log_level, None);

            let text = text.join(" ");
            let rules = RuleSet::from_config(&cfg.rules)?;
            let spans = find_link_spans(&text);
            let outcome = rewrite(&rules, &text, &spans);

            println!("{}", outcome.text);
            println!();
            println!("links: {}", spans.len());
            println!("changed: {}", outcome.changed);
            println!("contains paywall: {}", outcome.contains_paywall);
        }
        Commands::Broadcast { text } => {
            if text.is_empty() {
                anyhow::bail!("no message provided. Usage: relink broadcast <text>");
            }
            let path = PathBuf::from(config::shellexpand(&cfg.broadcast.path));
            gateway::broadcast::deposit(&path, &text.join(" ")).await?;
            println!("Queued broadcast at {}", path.display());
            if !cfg.broadcast.enabled {
                println!("Note: broadcast is disabled in config; the bot will not pick it up.");
            }
        }
    }

    Ok(())
}

/// Load config under a stderr-only subscriber, since the configured level
/// and log dir are not known until the file is read.
fn load_config(path: &str) -> anyhow::Result<config::Config> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    load_config_logged(path, filter, std::io::stderr)
}

fn load_config_logged<W>(path: &str, filter: EnvFilter, writer: W) -> anyhow::Result<config::Config>
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let bootstrap = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();
    let cfg = tracing::subscriber::with_default(bootstrap, || config::load(path))?;
    Ok(cfg)
}

/// Set up tracing: `RUST_LOG` or the configured level, written to stderr and,
/// when a data dir is given, to a daily log file under `{data_dir}/logs`.
fn init_logging(level: &str, data_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match data_dir {
        Some(dir) => {
            let logs = Path::new(&config::shellexpand(dir)).join("logs");
            match RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("relink.log")
                .build(&logs)
            {
                Ok(appender) => {
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    let layer = fmt::layer().with_writer(writer).with_ansi(false);
                    (Some(layer), Some(guard))
                }
                Err(e) => {
                    eprintln!("file logging disabled, cannot open {}: {e}", logs.display());
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
