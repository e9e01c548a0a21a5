//! LinkGuard moderation decision for a single message.
//!
//! Order of checks:
//! 1. Blacklisted links are always blocked, whatever the LinkGuard state.
//! 2. LinkGuard state: channel override if set, else the server switch.
//! 3. Exempt roles bypass; restrict roles (when configured) narrow who is checked.
//! 4. Any link whose host is not whitelisted blocks the message.
//!
//! Engine and settings errors never block a message: they are logged and the
//! message is treated as clean.

use std::sync::Arc;

use crate::config::Config;
use crate::engine::DomainEngine;
use crate::error::Result;
use crate::settings::SettingsStore;
use crate::types::BlacklistHit;

/// Message facts needed for a decision
#[derive(Debug, Clone, Default)]
pub struct MessageContext<'a> {
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author_is_bot: bool,
    /// Role ids of the author, `None` when member data is unavailable
    pub member_roles: Option<&'a [u64]>,
    pub content: &'a str,
}

/// Outcome of [`LinkGuard::evaluate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// Contains a blacklisted domain or link
    Blacklisted(BlacklistHit),
    /// LinkGuard is active and these links are not whitelisted
    NotWhitelisted { urls: Vec<String> },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, Verdict::Allow)
    }
}

/// Link moderation over a [`DomainEngine`] and per-guild settings
pub struct LinkGuard {
    engine: Arc<DomainEngine>,
    settings: SettingsStore,
}

impl LinkGuard {
    pub fn new(engine: Arc<DomainEngine>, settings: SettingsStore) -> Self {
        Self { engine, settings }
    }

    /// Open the engine and settings files named in `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let engine = DomainEngine::open(config)?;
        let settings =
            SettingsStore::open(config.settings_path(), config.linkguard.enabled_by_default)?;
        Ok(Self::new(Arc::new(engine), settings))
    }

    pub fn engine(&self) -> &Arc<DomainEngine> {
        &self.engine
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Decide what to do with a message.
    pub fn evaluate(&self, msg: &MessageContext<'_>) -> Verdict {
        let Some(guild_id) = msg.guild_id else {
            return Verdict::Allow;
        };
        if msg.author_is_bot {
            return Verdict::Allow;
        }

        match self.engine.scan_message(msg.content) {
            Ok(Some(hit)) => {
                tracing::info!(
                    guild_id,
                    channel_id = msg.channel_id,
                    matched = %hit.matched,
                    kind = hit.label(),
                    "blacklisted link"
                );
                return Verdict::Blacklisted(hit);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(guild_id, error = %e, "blacklist scan failed, treating as clean");
            }
        }

        match self.is_active_for(guild_id, msg) {
            Ok(true) => {}
            Ok(false) => return Verdict::Allow,
            Err(e) => {
                tracing::warn!(guild_id, error = %e, "linkguard settings unavailable");
                return Verdict::Allow;
            }
        }

        match self.engine.non_whitelisted_urls(msg.content) {
            Ok(urls) if urls.is_empty() => Verdict::Allow,
            Ok(urls) => {
                tracing::debug!(guild_id, count = urls.len(), "non-whitelisted links");
                Verdict::NotWhitelisted { urls }
            }
            Err(e) => {
                tracing::warn!(guild_id, error = %e, "whitelist check failed, allowing");
                Verdict::Allow
            }
        }
    }

    /// Whether the whitelist filter applies to this author in this channel
    fn is_active_for(&self, guild_id: u64, msg: &MessageContext<'_>) -> Result<bool> {
        let status = self.settings.status(guild_id)?;
        let enabled = status
            .channels
            .get(&msg.channel_id)
            .copied()
            .unwrap_or(status.enabled);
        if !enabled {
            return Ok(false);
        }

        let Some(roles) = msg.member_roles else {
            return Ok(false);
        };
        if status.exempt_roles.iter().any(|r| roles.contains(r)) {
            return Ok(false);
        }
        if !status.restrict_roles.is_empty() {
            return Ok(status.restrict_roles.iter().any(|r| roles.contains(r)));
        }
        Ok(true)
    }
}
