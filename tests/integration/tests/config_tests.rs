//! Configuration and adapter wiring tests

use feed_client::{FeedSubscriberConfig, HttpGateway};
use feed_common::{ApiConfig, AppConfig, Environment, FeedConfig};

#[test]
fn app_config_loads_from_env() {
    std::env::set_var("API_BASE_URL", "http://localhost:3000");
    std::env::set_var("FEED_WS_URL", "ws://localhost:8080/feed");
    std::env::set_var("APP_ENV", "staging");

    let config = AppConfig::from_env().unwrap();

    assert_eq!(config.api.base_url, "http://localhost:3000");
    assert_eq!(config.feed.ws_url, "ws://localhost:8080/feed");
    assert_eq!(config.app.env, Environment::Staging);
    // Defaults fill the unset knobs.
    assert_eq!(config.api.request_timeout_ms, 5000);
    assert_eq!(config.feed.buffer, 1024);
}

#[test]
fn adapters_build_from_config_sections() {
    let api = ApiConfig {
        base_url: "http://localhost:3000/".to_owned(),
        request_timeout_ms: 250,
    };
    assert!(HttpGateway::new(&api).is_ok());

    let feed = FeedConfig {
        ws_url: "ws://localhost:8080/feed".to_owned(),
        buffer: 128,
        reconnect_delay_ms: 500,
    };
    let subscriber_config = FeedSubscriberConfig::from(&feed);
    assert_eq!(subscriber_config.ws_url, feed.ws_url);
    assert_eq!(subscriber_config.broadcast_buffer, 128);
    assert_eq!(subscriber_config.reconnect_delay_ms, 500);
}
