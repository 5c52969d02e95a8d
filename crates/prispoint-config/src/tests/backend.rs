use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};
use serial_test::serial;

// =========================================================================
// Validation Tests - Backend
// =========================================================================

#[test]
#[serial]
fn given_port_below_1024_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _port = EnvGuard::set("PRISPOINT_BACKEND_PORT", "80");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_port_1024_when_validate_then_ok() {
    // Given
    let _temp = setup_config_dir();
    let _port = EnvGuard::set("PRISPOINT_BACKEND_PORT", "1024");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}

#[test]
#[serial]
fn given_public_host_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _host = EnvGuard::set("PRISPOINT_BACKEND_HOST", "0.0.0.0");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_localhost_when_validate_then_ok() {
    // Given
    let _temp = setup_config_dir();
    let _host = EnvGuard::set("PRISPOINT_BACKEND_HOST", "localhost");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}

#[test]
#[serial]
fn given_executable_with_path_separator_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _exe = EnvGuard::set("PRISPOINT_BACKEND_UNIX_EXECUTABLE", "bin/app");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_empty_windows_executable_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _exe = EnvGuard::set("PRISPOINT_BACKEND_WINDOWS_EXECUTABLE", " ");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}
