use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = FolioConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.session_token, None);
    assert_eq!(cfg.timeouts, Timeouts::default());
}

#[test]
fn parses_overrides() {
    let cfg = FolioConfig::from_lookup(lookup(&[
        ("FOLIO_BASE_URL", "https://folio.example/"),
        ("FOLIO_SESSION_TOKEN", "abc"),
        ("FOLIO_REQUEST_TIMEOUT_SECS", "42"),
        ("FOLIO_CONNECT_TIMEOUT_SECS", "7"),
    ]))
    .unwrap();
    assert_eq!(cfg.base_url, "https://folio.example");
    assert_eq!(cfg.session_token.as_deref(), Some("abc"));
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
}

#[test]
fn blank_token_is_absent() {
    let cfg = FolioConfig::from_lookup(lookup(&[("FOLIO_SESSION_TOKEN", "  ")])).unwrap();
    assert_eq!(cfg.session_token, None);
}

#[test]
fn rejects_non_http_base_url() {
    let err = FolioConfig::from_lookup(lookup(&[("FOLIO_BASE_URL", "ftp://x")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidBaseUrl("ftp://x".into()));
}

#[test]
fn rejects_bad_timeouts() {
    for bad in ["soon", "0", "-3"] {
        let err = FolioConfig::from_lookup(lookup(&[("FOLIO_CONNECT_TIMEOUT_SECS", bad)])).unwrap_err();
        assert!(err.to_string().contains("FOLIO_CONNECT_TIMEOUT_SECS"), "{bad}: {err}");
    }
}

#[test]
fn cli_overrides_win() {
    let cfg = FolioConfig::from_lookup(lookup(&[("FOLIO_SESSION_TOKEN", "env")]))
        .unwrap()
        .with_overrides(Some("http://localhost:9999/".into()), Some("flag".into()))
        .unwrap();
    assert_eq!(cfg.base_url, "http://localhost:9999");
    assert_eq!(cfg.session_token.as_deref(), Some("flag"));

    let kept = FolioConfig::from_lookup(lookup(&[("FOLIO_SESSION_TOKEN", "env")]))
        .unwrap()
        .with_overrides(None, None)
        .unwrap();
    assert_eq!(kept.session_token.as_deref(), Some("env"));
}
