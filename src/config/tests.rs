use std::io::Write;

use super::*;

fn raw_cache(
    max_size: Option<i64>,
    ttl_seconds: Option<i64>,
    sweep_freq_seconds: Option<i64>,
) -> RawCacheSettings {
    RawCacheSettings {
        max_size,
        ttl_seconds,
        sweep_freq_seconds,
        negative: None,
    }
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_the_collection_api() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.pagination.default_limit, 40);
    assert_eq!(settings.pagination.max_limit, 80);
    assert_eq!(settings.server.public_url.as_str(), "http://localhost:8080/");
    assert_eq!(
        settings.cache.get(CacheKind::Account),
        CacheKind::Account.defaults()
    );
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn cache_tables_override_only_their_own_cache() {
    let mut raw = RawSettings::default();
    raw.cache
        .insert("follow_ids".to_string(), raw_cache(Some(10), Some(5), Some(0)));

    let settings = Settings::from_raw(raw).expect("valid settings");
    let follow_ids = settings.cache.get(CacheKind::FollowIds);

    assert_eq!(follow_ids.max_size, 10);
    assert_eq!(follow_ids.ttl, Duration::from_secs(5));
    assert_eq!(follow_ids.sweep_freq, Duration::ZERO);
    assert_eq!(
        settings.cache.get(CacheKind::FollowRequestIds),
        CacheKind::FollowRequestIds.defaults()
    );
}

#[test]
fn non_positive_cache_values_are_rejected() {
    for (field, settings) in [
        ("max_size", raw_cache(Some(0), None, None)),
        ("ttl_seconds", raw_cache(None, Some(-30), None)),
        ("sweep_freq_seconds", raw_cache(None, None, Some(-1))),
    ] {
        let mut raw = RawSettings::default();
        raw.cache.insert("account".to_string(), settings);

        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => {
                assert_eq!(key, format!("cache.account.{field}"))
            }
            other => panic!("expected invalid {field}, got {other:?}"),
        }
    }
}

#[test]
fn unknown_cache_names_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache
        .insert("acount".to_string(), raw_cache(Some(1), None, None));

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid { key, .. }) if key == "cache.acount"
    ));
}

#[test]
fn default_limit_cannot_exceed_max() {
    let mut raw = RawSettings::default();
    raw.pagination.default_limit = Some(100);

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid { key, .. }) if key == "pagination.default_limit"
    ));
}

#[test]
fn config_file_cache_tables_are_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    writeln!(
        file,
        r#"
[server]
public_url = "https://social.example"

[cache.status]
max_size = 50
ttl_seconds = 120
negative = false
"#
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "fedcache",
        "--config-file",
        file.path().to_str().expect("utf-8 path"),
    ]);
    let settings = load(&args).expect("valid settings");

    let status = settings.cache.get(CacheKind::Status);
    assert_eq!(status.max_size, 50);
    assert_eq!(status.ttl, Duration::from_secs(120));
    assert!(!status.negative);
    assert_eq!(settings.server.public_url.host_str(), Some("social.example"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["fedcache"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "fedcache",
        "serve",
        "--server-port",
        "9000",
        "--public-url",
        "https://social.example",
        "--log-json",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(9000));
            assert_eq!(
                serve.overrides.public_url.as_deref(),
                Some("https://social.example")
            );
            assert_eq!(serve.overrides.log_json, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
