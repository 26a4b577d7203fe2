use campo_radio::config::Config;
use tempfile::TempDir;

#[test]
fn test_config_lifecycle() {
    // Create a temporary directory for test config
    let temp_dir = TempDir::new().unwrap();

    // Override the config path for testing
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    // Nothing saved yet: defaults
    assert!(!Config::exists().unwrap());
    let defaults = Config::load().unwrap();
    assert!(defaults.stream_url.is_empty());
    assert_eq!(defaults.initial_volume, 70);

    // Create and save a config
    let config = Config::with_stream_url("http://radio.example/campo");
    config.save().unwrap();
    assert!(Config::exists().unwrap());
    assert!(Config::config_path().unwrap().starts_with(temp_dir.path()));

    // Load and verify values
    let loaded = Config::load().unwrap();
    assert_eq!(loaded, config);

    // Test config mutation
    let mut config = Config::load().unwrap();
    config.set_value("initial_volume", "35").unwrap();
    config.set_value("bar_count", "48").unwrap();
    config.save().unwrap();

    // Verify mutations persisted
    let reloaded = Config::load().unwrap();
    assert_eq!(reloaded.initial_volume, 35);
    assert_eq!(reloaded.bar_count, 48);
    assert_eq!(reloaded.stream_url, "http://radio.example/campo");

    // Test invalid key and value
    let mut config = Config::load().unwrap();
    assert!(config.set_value("invalid_key", "value").is_err());
    assert!(config.set_value("initial_volume", "101").is_err());

    // A hand-edited file that no longer parses is reported
    std::fs::write(Config::config_path().unwrap(), "initial_volume = \"loud\"\n").unwrap();
    assert!(Config::load().is_err());
}
