use crate::Config;

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};

fn config_with_prefix(prefix: &str) -> Config {
    let mut config = Config::default();
    config.logging.file_prefix = prefix.into();
    config
}

#[test]
fn given_default_prefix_when_validate_then_ok() {
    // Given
    let config = Config::default();

    // When
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}

#[test]
fn given_empty_prefix_when_validate_then_error() {
    // Given
    let config = config_with_prefix("  ");

    // When
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
fn given_prefix_with_path_separator_when_validate_then_error() {
    // Given
    let unix = config_with_prefix("../escape");
    let windows = config_with_prefix("logs\\launcher");

    // When
    let unix_result = unix.validate();
    let windows_result = windows.validate();

    // Then
    assert_that!(unix_result, err(anything()));
    assert_that!(windows_result, err(anything()));
}

#[test]
fn given_plain_prefix_when_validate_then_ok() {
    // Given
    let config = config_with_prefix("prispoint-launcher");

    // When
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}
