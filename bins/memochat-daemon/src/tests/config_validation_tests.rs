use crate::config::{parse_config, ConfigError};

const MINIMAL: &str = r#"
data_dir = "/tmp/memochat"

[wallet]
url = "http://127.0.0.1:8232"
"#;

#[test]
fn minimal_config_fills_defaults() {
    let cfg = parse_config(MINIMAL).expect("parse");
    assert_eq!(cfg.wallet.timeout_secs, 10);
    assert!(cfg.identity.username.is_none());
    assert_eq!(cfg.engine.poll_interval_ms, 5_000);
    assert_eq!(cfg.engine.max_notes, 54);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn full_config_round_trips() {
    let raw = r#"
data_dir = "/var/lib/memochat"

[wallet]
url = "https://node.example:8232"
rpc_user = "memo"
rpc_password = "hunter2"
timeout_secs = 30

[identity]
username = "alice"

[engine]
poll_interval_ms = 2000
result_poll_interval_ms = 3000
max_result_polls = 40
min_conf = 1
memo_width = 512
max_notes = 54
dust = 10000
fee = 10000
merge_fee = 10000
page_size = 5
category = "individual"

[engine.limits]
max_text_bytes = 400
max_username_len = 64
token_len = 32

[logging]
level = "debug"
"#;
    let cfg = parse_config(raw).expect("parse");
    assert_eq!(cfg.identity.username.as_deref(), Some("alice"));
    assert_eq!(cfg.engine.poll_interval_ms, 2000);
    assert_eq!(cfg.engine.min_conf, 1);
    assert_eq!(cfg.logging.level, "debug");
}

#[test]
fn unknown_keys_are_rejected() {
    let raw = format!("{MINIMAL}\nunknown_key = true\n");
    assert!(matches!(parse_config(&raw), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_wallet_section_is_rejected() {
    assert!(matches!(
        parse_config("data_dir = \"/tmp/x\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn non_http_wallet_url_is_rejected() {
    let raw = r#"
data_dir = "/tmp/memochat"

[wallet]
url = "zmq://nope"
"#;
    assert!(matches!(
        parse_config(raw),
        Err(ConfigError::Invalid("wallet.url"))
    ));
}

#[test]
fn blank_identity_username_is_rejected() {
    let raw = r#"
data_dir = "/tmp/memochat"

[wallet]
url = "http://127.0.0.1:8232"

[identity]
username = "  "
"#;
    assert!(matches!(
        parse_config(raw),
        Err(ConfigError::Invalid("identity.username"))
    ));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let raw = r#"
data_dir = "/tmp/memochat"

[wallet]
url = "http://127.0.0.1:8232"

[engine]
poll_interval_ms = 0
"#;
    assert!(matches!(
        parse_config(raw),
        Err(ConfigError::Invalid("engine.poll_interval_ms"))
    ));
}
