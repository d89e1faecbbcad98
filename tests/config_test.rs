use datavis::config::{AppConfig, ConfigManager};
use datavis::palette::Palette;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    assert_eq!(config.backend.url, "http://127.0.0.1:8000");
    assert_eq!(config.backend.upload_path, "/upload");
    assert_eq!(config.backend.timeout_secs, 0);
    assert!(!config.backend.check_on_start);
    assert_eq!(config.upload_url(), "http://127.0.0.1:8000/upload");

    assert_eq!(config.display.default_row_count, 15);
    assert_eq!(config.default_palette(), Palette::Ocean);
    assert_eq!(config.display.preview_page_size, 10);

    assert_eq!(config.export_dir(), PathBuf::from("."));
    assert_eq!((config.export.width, config.export.height), (900, 500));

    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.theme.colors.nav_active, "#38bdf8");
    assert!(config.logging.level.is_none());

    assert!(config.validate().is_ok());
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    for section in [
        "[backend]",
        "[display]",
        "[export]",
        "[performance]",
        "[theme.colors]",
        "[logging]",
    ] {
        assert!(template.contains(section), "missing {}", section);
    }

    // The template itself must load cleanly
    let parsed: AppConfig = toml::from_str(&template).expect("template parses");
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_write_default_config_refuses_overwrite() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager.write_default_config(false).unwrap();
    assert!(path.exists());

    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("--force"));

    assert!(config_manager.write_default_config(true).is_ok());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.backend.url, AppConfig::default().backend.url);
}

#[test]
fn test_user_config_overrides_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(
        config_manager.config_path("config.toml"),
        r##"
version = "0.1"

[backend]
url = "https://charts.example.com"
timeout_secs = 30

[display]
default_row_count = 40
default_palette = "violet"

[theme.colors]
primary = "#ff00aa"
"##,
    )
    .unwrap();

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.backend.url, "https://charts.example.com");
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.backend.upload_path, "/upload");
    assert_eq!(config.display.default_row_count, 40);
    assert_eq!(config.default_palette(), Palette::Violet);
    assert_eq!(config.theme.colors.primary, "#ff00aa");
    assert_eq!(config.theme.colors.error, "red");
}

#[test]
fn test_invalid_values_are_rejected() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    let path = config_manager.config_path("config.toml");

    for (content, needle) in [
        ("[backend]\nurl = \"ftp://host\"\n", "backend url"),
        ("[display]\ndefault_palette = \"plaid\"\n", "default_palette"),
        ("[theme.colors]\nprimary = \"not-a-color\"\n", "primary"),
        ("version = \"2.0\"\n", "Unsupported config version"),
    ] {
        fs::write(&path, content).unwrap();
        let err = AppConfig::load_from(&config_manager).unwrap_err();
        assert!(err.to_string().contains(needle), "{}: {}", needle, err);
    }
}

#[test]
fn test_malformed_toml_reports_path() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(config_manager.config_path("config.toml"), "[backend\nurl = ").unwrap();

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
