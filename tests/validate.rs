//! Integration tests for the `validate` command.
use hhbargain::cli::handle_validate_command;
use hhbargain::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/baseline")
}

/// An integration test for the `validate` command.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("HHBARGAIN_LOG_LEVEL", "off") };

    handle_validate_command(&get_model_dir(), Some(Settings::default())).unwrap();
}

/// A model in which one household has two Bobs fails validation
#[test]
fn test_handle_validate_command_invalid() {
    unsafe { std::env::set_var("HHBARGAIN_LOG_LEVEL", "off") };

    let dir = tempdir().unwrap();
    for entry in fs::read_dir(get_model_dir()).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dir.path().join(path.file_name().unwrap())).unwrap();
    }
    let members_path = dir.path().join("members.csv");
    let members = fs::read_to_string(&members_path).unwrap();
    fs::write(
        &members_path,
        members.replacen("m_0,h_0,alice", "m_0,h_0,bob", 1),
    )
    .unwrap();

    assert!(handle_validate_command(dir.path(), Some(Settings::default())).is_err());
}
