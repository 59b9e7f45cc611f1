use super::{Config, Driver, LoaderBox, Logs};
use crate::storage::DriverKind;
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        loader: LoaderBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            ttl: Duration::from_millis(500),
            error_ttl: Some(Duration::from_secs(5)),
            driver: Some(Driver {
                kind: DriverKind::Map,
                capacity: None,
            }),
        },
    }
}
