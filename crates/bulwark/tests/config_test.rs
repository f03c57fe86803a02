//! Engine configuration loading.

use bulwark::{EngineConfig, LogFormat, RequestContext, RoomId, UserId};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_load_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
bot_user_id = "@bulwark:example.org"
management_room = "!management:example.org"
request_timeout_secs = 10
sweep_interval_secs = 0
log_format = "json"
"#
    )
    .unwrap();

    let config = EngineConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.bot_user_id(), &Some(UserId::new("@bulwark:example.org")));
    assert_eq!(*config.log_format(), LogFormat::Json);
    assert_eq!(config.sweep_interval(), Duration::ZERO);

    let settings = config.engine_settings().unwrap();
    assert_eq!(
        settings.management_room(),
        &Some(RoomId::new("!management:example.org"))
    );
    assert_eq!(*settings.request_timeout(), Duration::from_secs(10));
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
}

#[test]
fn test_invalid_value_is_config_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, r#"log_format = "xml""#).unwrap();
    let err = EngineConfig::load(Some(file.path())).unwrap_err();
    assert!(err.message.contains("Failed to load engine configuration"));
}

#[test]
fn test_huge_request_timeout_means_no_deadline() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
bot_user_id = "@bulwark:example.org"
request_timeout_secs = 9223372036854775807
"#
    )
    .unwrap();

    let config = EngineConfig::load(Some(file.path())).unwrap();
    let settings = config.engine_settings().unwrap();
    let ctx = RequestContext::new().with_timeout(*settings.request_timeout());
    assert_eq!(ctx.deadline(), None);
}
