use core_runtime::config::LoggingSettings;
use core_runtime::logging::{init_logging, redact_url, LogFormat, LogLevel, LoggingConfig};

// The only test in this binary that installs a subscriber.
#[test]
fn test_subscriber_installs_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_target(true);

    init_logging(config.clone()).unwrap();
    tracing::info!(artist = "Bathory", "logging ready");

    assert!(init_logging(config).is_err());
}

#[test]
fn test_settings_section_drives_config() {
    let settings: LoggingSettings = toml::from_str(
        r#"
        level = "warn"
        format = "pretty"
        "#,
    )
    .unwrap();

    let config = settings.to_logging_config();
    assert_eq!(config.format, LogFormat::Pretty);
    assert!(config.directives().contains("core_service=warn"));
}

#[test]
fn test_bad_filter_is_rejected_before_install() {
    let config = LoggingConfig::default().with_filter("core_wall=loudest");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_lastfm_request_url_is_masked() {
    let url = "https://ws.audioscrobbler.com/2.0/?method=album.gettoptags&api_key=0123abcd&artist=Darkthrone&format=json";
    let masked = redact_url(url);

    assert!(!masked.contains("0123abcd"));
    assert!(masked.contains("artist=Darkthrone"));
    assert!(masked.ends_with("&format=json"));
}
