//! Runtime configuration for a store instance.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::db::DEFAULT_TENANT_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix applied to every storage key
    pub tenant_prefix: String,
    /// Seed the demo practice on first open; otherwise start empty
    pub seed_demo_data: bool,
    pub notification_ttl_ms: u64,
    /// Pause between reminders in a batch send
    pub reminder_pacing_ms: u64,
    pub assistant_reply_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tenant_prefix: DEFAULT_TENANT_PREFIX.to_string(),
            seed_demo_data: true,
            notification_ttl_ms: 4000,
            reminder_pacing_ms: 300,
            assistant_reply_delay_ms: 800,
        }
    }
}

impl StoreConfig {
    /// Defaults overlaid with `MEDIPLAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unparsable values are
    /// logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(prefix) = lookup("MEDIPLAN_TENANT_PREFIX") {
            if prefix.trim().is_empty() {
                warn!("MEDIPLAN_TENANT_PREFIX is empty, keeping default");
            } else {
                config.tenant_prefix = prefix.trim().to_string();
            }
        }
        if let Some(raw) = lookup("MEDIPLAN_SEED_DEMO") {
            match parse_bool(&raw) {
                Some(value) => config.seed_demo_data = value,
                None => warn!(value = %raw, "invalid MEDIPLAN_SEED_DEMO, keeping default"),
            }
        }
        overlay_ms(&lookup, "MEDIPLAN_NOTIFICATION_TTL_MS", &mut config.notification_ttl_ms);
        overlay_ms(&lookup, "MEDIPLAN_REMINDER_PACING_MS", &mut config.reminder_pacing_ms);
        overlay_ms(&lookup, "MEDIPLAN_ASSISTANT_DELAY_MS", &mut config.assistant_reply_delay_ms);

        config
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn reminder_pacing(&self) -> Duration {
        Duration::from_millis(self.reminder_pacing_ms)
    }

    pub fn assistant_reply_delay(&self) -> Duration {
        Duration::from_millis(self.assistant_reply_delay_ms)
    }
}

fn overlay_ms(lookup: &impl Fn(&str) -> Option<String>, name: &str, target: &mut u64) {
    if let Some(raw) = lookup(name) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(variable = name, value = %raw, "invalid duration, keeping default"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
