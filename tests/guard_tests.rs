//! Integration tests for LinkGuard moderation and word similarity

use std::fs;

use orbit_linkguard::{
    Config, LinkGuard, MatchType, MessageContext, SimilarityIndex, Verdict,
};
use tempfile::TempDir;

const GUILD: u64 = 100;
const CHANNEL: u64 = 200;
const MOD_ROLE: u64 = 7;

fn setup(config_json: &str) -> (TempDir, Config, LinkGuard) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::from_json(config_json).unwrap();
    config.data_dir = dir.path().join("data");
    let guard = LinkGuard::open(&config).unwrap();
    (dir, config, guard)
}

fn message<'a>(content: &'a str, roles: &'a [u64]) -> MessageContext<'a> {
    MessageContext {
        guild_id: Some(GUILD),
        channel_id: CHANNEL,
        author_is_bot: false,
        member_roles: Some(roles),
        content,
    }
}

#[test]
fn test_open_creates_data_files() {
    let (_dir, config, _guard) = setup("{}");
    let blacklist = fs::read_to_string(config.blacklist_path()).unwrap();
    assert!(blacklist.lines().any(|l| l == "discord-nitro.ru"));
    let whitelist = fs::read_to_string(config.whitelist_path()).unwrap();
    assert!(whitelist.lines().any(|l| l == "medal.tv"));
    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.settings_path()).unwrap()).unwrap();
    assert_eq!(settings, serde_json::json!({ "guilds": {} }));
}

#[test]
fn test_enabled_by_default_from_config() {
    let (_dir, _config, guard) = setup(r#"{ "linkguard": { "enabled_by_default": true } }"#);
    assert!(guard.settings().is_server_enabled(GUILD).unwrap());
    assert!(guard
        .evaluate(&message("look https://example.com", &[]))
        .is_blocked());
}

#[test]
fn test_blacklist_then_whitelist() {
    let (_dir, _config, guard) = setup("{}");
    guard.settings().set_server_enabled(GUILD, true).unwrap();
    guard.engine().blacklist().add("scam.example/claim").unwrap();

    match guard.evaluate(&message("go to scam.example/claim/now", &[])) {
        Verdict::Blacklisted(hit) => {
            assert_eq!(hit.match_type, MatchType::Path);
            assert_eq!(hit.label(), "link");
        }
        other => panic!("expected Blacklisted, got {:?}", other),
    }

    // Not blacklisted, but not whitelisted either
    match guard.evaluate(&message("go to scam.example/other", &[])) {
        Verdict::NotWhitelisted { urls } => {
            assert_eq!(urls, vec!["https://scam.example/other".to_string()]);
        }
        other => panic!("expected NotWhitelisted, got {:?}", other),
    }

    guard.engine().whitelist().add("scam.example").unwrap();
    assert_eq!(
        guard.evaluate(&message("go to scam.example/other", &[])),
        Verdict::Allow
    );
}

#[test]
fn test_moderator_role_exempt() {
    let (_dir, _config, guard) = setup("{}");
    guard.settings().set_server_enabled(GUILD, true).unwrap();
    guard.settings().set_exempt_roles(GUILD, &[MOD_ROLE]).unwrap();

    assert_eq!(
        guard.evaluate(&message("https://example.com", &[MOD_ROLE])),
        Verdict::Allow
    );
    assert!(guard.evaluate(&message("https://example.com", &[1])).is_blocked());
}

#[test]
fn test_settings_survive_reopen() {
    let (_dir, config, guard) = setup("{}");
    guard.settings().set_channel_enabled(GUILD, CHANNEL, true).unwrap();
    drop(guard);

    let guard = LinkGuard::open(&config).unwrap();
    assert_eq!(guard.settings().channel_override(GUILD, CHANNEL).unwrap(), Some(true));
    assert!(guard.evaluate(&message("https://example.com", &[])).is_blocked());
}

#[test]
fn test_similarity_from_config() {
    let (_dir, config, _guard) = setup(r#"{ "word_blocker": { "score_threshold": 0.7 } }"#);
    fs::write(
        config.seeds_path(),
        "# known scam templates\nfree discord nitro for everyone click here\n",
    )
    .unwrap();

    let index = SimilarityIndex::from_file(config.seeds_path(), config.word_blocker.clone()).unwrap();
    assert!(index.status().enabled);
    assert_eq!(index.status().score_threshold, 0.7);

    let hit = index
        .find_similar("FREE discord nitro for everyone, click here!!")
        .unwrap();
    assert_eq!(hit.id, "seed-0");
    assert!(index.find_similar("anyone up for ranked later?").is_none());
}

#[test]
fn test_invalid_config_rejected() {
    assert!(Config::from_json(r#"{ "word_blocker": { "score_threshold": 2.0 } }"#).is_err());
    assert!(Config::from_json(r#"{ "word_blocker": { "vector_dimensions": 0 } }"#).is_err());
}
