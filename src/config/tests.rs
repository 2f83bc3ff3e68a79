use serial_test::serial;

use super::settings::Settings;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.engine.outbound_queue_capacity, 256);
    assert_eq!(settings.engine.log_level, "info");
}

#[test]
#[serial]
fn test_load_config_falls_back_to_defaults() {
    temp_env::with_vars_unset(["SERVER__HOST", "SERVER__PORT"], || {
        let settings = super::load_config().expect("load_config");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.engine.outbound_queue_capacity, 256);
    });
}

#[test]
#[serial]
fn test_environment_overrides_host() {
    temp_env::with_var("SERVER__HOST", Some("0.0.0.0"), || {
        let settings = super::load_config().expect("load_config");
        assert_eq!(settings.server.host, "0.0.0.0");
    });
}

#[test]
#[serial]
fn test_environment_overrides_multi_word_keys() {
    temp_env::with_vars(
        [
            ("ENGINE__OUTBOUND_QUEUE_CAPACITY", Some("32")),
            ("SERVER__PORT", Some("9100")),
        ],
        || {
            let settings = super::load_config().expect("load_config");
            assert_eq!(settings.engine.outbound_queue_capacity, 32);
            assert_eq!(settings.server.port, 9100);
        },
    );
}
