mod defaults;


pub use defaults::*;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::RelinkError;

/// Top-level Relink configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relink: RelinkConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelinkConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelinkConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Chat allow-list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Chats permitted to trigger any behavior. Everything else is ignored.
    #[serde(default)]
    pub allowed_chats: Vec<i64>,
    /// When true, `/start`, `/help` and `/chatid` are also restricted to
    /// `allowed_chats`. When false they answer anywhere.
    #[serde(default)]
    pub gate_info_commands: bool,
}

impl AuthConfig {
    /// Whether the chat with this platform ID is on the allow-list.
    pub fn is_allowed(&self, chat_id: &str) -> bool {
        chat_id
            .parse::<i64>()
            .map(|id| self.allowed_chats.contains(&id))
            .unwrap_or(false)
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            telegram: Some(TelegramConfig::default()),
        }
    }
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bot API token. Empty = read `TELEGRAM_BOT_TOKEN` at load time.
    #[serde(default)]
    pub bot_token: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: String::new(),
        }
    }
}

/// Link rewriting rule tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Bypass service; the percent-encoded original link is appended to it.
    #[serde(default = "default_redirector_base")]
    pub redirector_base: String,
    /// Display text of the styled bypass hyperlink.
    #[serde(default = "default_link_text")]
    pub link_text: String,
    /// Paywalled domains, matched on the host or any of its subdomains.
    #[serde(default = "default_paywall_domains")]
    pub paywall_domains: Vec<String>,
    /// Mirror host → original hosts it replaces (exact match only).
    #[serde(default = "default_mirrors")]
    pub mirrors: BTreeMap<String, Vec<String>>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            redirector_base: default_redirector_base(),
            link_text: default_link_text(),
            paywall_domains: default_paywall_domains(),
            mirrors: default_mirrors(),
        }
    }
}

/// One message of a sequence, followed by a pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub text: String,
    /// Pause after sending `text`, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

/// A weighted sequence of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub weight: u32,
    pub steps: Vec<SequenceStep>,
}

/// Cooldown-gated random sequencer (`/roll`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Weekday on which the sequencer refuses to run (e.g. "sunday"). None = never.
    #[serde(default = "default_veto_weekday")]
    pub veto_weekday: Option<String>,
    #[serde(default = "default_veto_message")]
    pub veto_message: String,
    #[serde(default = "default_cooldown_message")]
    pub cooldown_message: String,
    #[serde(default = "default_sequences")]
    pub sequences: Vec<SequenceConfig>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_secs: default_cooldown_secs(),
            veto_weekday: default_veto_weekday(),
            veto_message: default_veto_message(),
            cooldown_message: default_cooldown_message(),
            sequences: default_sequences(),
        }
    }
}

impl SequencerConfig {
    /// Parse the configured veto weekday.
    pub fn veto_day(&self) -> Result<Option<Weekday>, RelinkError> {
        match self.veto_weekday.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(day) => day.parse::<Weekday>().map(Some).map_err(|_| {
                RelinkError::Config(format!("invalid sequencer.veto_weekday '{day}'"))
            }),
        }
    }
}

/// Broadcast relay: fan-out of an externally deposited payload file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_broadcast_path")]
    pub path: String,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_broadcast_interval_secs")]
    pub interval_secs: u64,
    /// Pause between recipients, to stay under outbound rate limits.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_broadcast_path(),
            initial_delay_secs: default_initial_delay_secs(),
            interval_secs: default_broadcast_interval_secs(),
            send_delay_ms: default_send_delay_ms(),
        }
    }
}

impl Config {
    /// Reject configurations the runtime cannot honor.
    pub fn validate(&self) -> Result<(), RelinkError> {
        if self.sequencer.enabled {
            if self.sequencer.sequences.is_empty() {
                return Err(RelinkError::Config(
                    "sequencer is enabled but no sequences are defined".into(),
                ));
            }
            for (i, seq) in self.sequencer.sequences.iter().enumerate() {
                if seq.weight == 0 {
                    return Err(RelinkError::Config(format!(
                        "sequencer.sequences[{i}] has weight 0; weights must be positive"
                    )));
                }
                if seq.steps.is_empty() {
                    return Err(RelinkError::Config(format!(
                        "sequencer.sequences[{i}] has no steps"
                    )));
                }
            }
            self.sequencer.veto_day()?;
        }
        if self.broadcast.enabled && self.broadcast.interval_secs == 0 {
            return Err(RelinkError::Config(
                "broadcast.interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Fill an empty Telegram token from `TELEGRAM_BOT_TOKEN`.
fn apply_env_overrides(config: &mut Config) {
    if let Some(ref mut tg) = config.channel.telegram {
        if tg.bot_token.is_empty() {
            if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
                tg.bot_token = token.trim().to_string();
            }
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, RelinkError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelinkError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str::<Config>(&content)
            .map_err(|e| RelinkError::Config(format!("failed to parse config: {}", e)))?
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}
