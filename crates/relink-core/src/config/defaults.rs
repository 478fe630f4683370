//! Default value functions used by serde for config deserialization.

use super::{SequenceConfig, SequenceStep};
use std::collections::BTreeMap;

pub fn default_name() -> String {
    "Relink".to_string()
}

pub fn default_data_dir() -> String {
    "~/.relink".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_redirector_base() -> String {
    "https://12ft.io/proxy?q=".to_string()
}

pub fn default_link_text() -> String {
    "\u{1f513} Read without the paywall".to_string()
}

pub fn default_paywall_domains() -> Vec<String> {
    [
        "nytimes.com",
        "wsj.com",
        "washingtonpost.com",
        "ft.com",
        "economist.com",
        "bloomberg.com",
        "theatlantic.com",
        "newyorker.com",
        "wired.com",
        "businessinsider.com",
        "theguardian.com",
        "folha.uol.com.br",
        "estadao.com.br",
        "oglobo.globo.com",
        "valor.globo.com",
        "elpais.com",
        "lemonde.fr",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

pub fn default_mirrors() -> BTreeMap<String, Vec<String>> {
    let mut mirrors = BTreeMap::new();
    mirrors.insert(
        "fixupx.com".to_string(),
        vec!["twitter.com".to_string(), "x.com".to_string()],
    );
    mirrors.insert(
        "ddinstagram.com".to_string(),
        vec!["instagram.com".to_string()],
    );
    mirrors.insert("rxddit.com".to_string(), vec!["reddit.com".to_string()]);
    mirrors.insert("tnktok.com".to_string(), vec!["tiktok.com".to_string()]);
    mirrors.insert("fxbsky.app".to_string(), vec!["bsky.app".to_string()]);
    mirrors
}

pub fn default_cooldown_secs() -> u64 {
    30
}

pub fn default_veto_weekday() -> Option<String> {
    Some("sunday".to_string())
}

pub fn default_veto_message() -> String {
    "\u{1f6d1} The wheel rests on Sundays. Come back tomorrow.".to_string()
}

pub fn default_cooldown_message() -> String {
    "\u{23f3} Too soon! Give the wheel a moment to cool down.".to_string()
}

fn step(text: &str, delay_ms: u64) -> SequenceStep {
    SequenceStep {
        text: text.to_string(),
        delay_ms,
    }
}

pub fn default_sequences() -> Vec<SequenceConfig> {
    const SPIN: &str = "\u{1f3b0} Spinning the wheel...";
    const DICE: &str = "\u{1f3b2} Rolling the dice...";
    const ORACLE: &str = "\u{1f52e} Consulting the oracle...";
    vec![
        SequenceConfig {
            weight: 25,
            steps: vec![
                step(SPIN, 1500),
                step("\u{1f352} \u{1f34b} \u{1f349}", 1000),
                step("Nothing this time.", 0),
            ],
        },
        SequenceConfig {
            weight: 25,
            steps: vec![step(DICE, 2000), step("You rolled a 3. Meh.", 0)],
        },
        SequenceConfig {
            weight: 25,
            steps: vec![step(ORACLE, 2000), step("The oracle says: maybe.", 0)],
        },
        SequenceConfig {
            weight: 10,
            steps: vec![
                step(SPIN, 1500),
                step("\u{1f352} \u{1f352} \u{1f34b}", 1000),
                step("So close!", 0),
            ],
        },
        SequenceConfig {
            weight: 5,
            steps: vec![
                step(SPIN, 1500),
                step("7\u{fe0f}\u{20e3} 7\u{fe0f}\u{20e3} 7\u{fe0f}\u{20e3}", 1500),
                step("\u{1f389} JACKPOT! \u{1f389}", 0),
            ],
        },
        SequenceConfig {
            weight: 5,
            steps: vec![
                step(DICE, 2000),
                step("The die rolled off the table.", 1500),
                step("Nobody wins.", 0),
            ],
        },
        SequenceConfig {
            weight: 5,
            steps: vec![
                step(ORACLE, 3000),
                step("The oracle is asleep. Do not disturb.", 0),
            ],
        },
    ]
}

pub fn default_broadcast_path() -> String {
    "~/.relink/broadcast.txt".to_string()
}

pub fn default_initial_delay_secs() -> u64 {
    5
}

pub fn default_broadcast_interval_secs() -> u64 {
    5
}

pub fn default_send_delay_ms() -> u64 {
    100
}
