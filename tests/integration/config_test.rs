//! Example configuration tests

use ticker_dash::config::Config;

#[test]
fn test_config_example_parses() {
    let toml = include_str!("../../config.toml.example");
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.feed.max_reconnect_attempts, 5);
    assert_eq!(config.feed.reconnect_delay_ms, 3000);
    assert_eq!(config.dashboard.history_capacity, 50);
    assert_eq!(config.registry().len(), 6);
}
