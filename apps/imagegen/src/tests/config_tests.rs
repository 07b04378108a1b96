use super::*;

use std::{
    env, fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("imagegen_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("imagegen.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let path = env::temp_dir().join("imagegen_config_test_missing/imagegen.toml");
    let settings = load_settings_with(&path, no_env).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.timeout(), Some(Duration::from_secs(60)));
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
endpoint = "https://gen.example/api/image"
refresh_url = "https://gen.example/api/usage"
timeout_seconds = "0"
surface_failures = "true"
"#,
    );

    let settings = load_settings_with(&path, no_env).expect("settings");

    assert_eq!(settings.endpoint, "https://gen.example/api/image");
    assert_eq!(
        settings.refresh_url.as_deref(),
        Some("https://gen.example/api/usage")
    );
    assert_eq!(settings.timeout(), None);
    assert!(settings.surface_failures);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_wins_over_file() {
    let path = temp_config("endpoint = \"https://file.example/api/image\"\n");
    let env = |key: &str| match key {
        "IMAGEGEN_ENDPOINT" => Some("https://legacy.example/api/image".to_string()),
        "APP__ENDPOINT" => Some("https://env.example/api/image".to_string()),
        "APP__TIMEOUT_SECONDS" => Some("15".to_string()),
        "APP__SURFACE_FAILURES" => Some("no".to_string()),
        _ => None,
    };

    let settings = load_settings_with(&path, env).expect("settings");

    assert_eq!(settings.endpoint, "https://env.example/api/image");
    assert_eq!(settings.timeout_seconds, 15);
    assert!(!settings.surface_failures);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn unparseable_env_timeout_is_ignored() {
    let path = env::temp_dir().join("imagegen_config_test_missing/imagegen.toml");
    let env = |key: &str| (key == "APP__TIMEOUT_SECONDS").then(|| "soon".to_string());
    let settings = load_settings_with(&path, env).expect("settings");
    assert_eq!(settings.timeout_seconds, 60);
}

#[test]
fn malformed_file_is_an_error() {
    let path = temp_config("timeout_seconds = \"ten\"\n");
    let err = load_settings_with(&path, no_env).expect_err("must fail");
    assert!(err.to_string().contains("failed to parse"));
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
