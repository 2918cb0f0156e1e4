use std::path::PathBuf;
use tempfile::TempDir;
use wikigap::handlers::*;
use wikigap_core::config::Settings;
use wikigap_scanner::{LengthMode, VisitPolicy};

#[test]
fn test_parse_language_list() {
    assert_eq!(parse_language_list("de,fr"), vec!["de", "fr"]);
    assert_eq!(parse_language_list(" de , FR ,,de"), vec!["de", "fr"]);
    assert!(parse_language_list("").is_empty());
}

#[test]
fn test_visit_policy_flag() {
    assert_eq!(visit_policy(false), VisitPolicy::OnDiscovery);
    assert_eq!(visit_policy(true), VisitPolicy::AfterExpansion);
}

#[test]
fn test_analysis_options_from_flags() {
    let settings = Settings::default();
    let options = analysis_options(&settings, Some("DE"), Some(3), Some("fr,it"), true);

    assert_eq!(options.reference_language, "de");
    assert_eq!(options.top_n, Some(3));
    assert_eq!(options.mode, LengthMode::Raw);
    let filter = options.language_filter.unwrap();
    assert!(filter.contains("fr"));
    assert!(filter.contains("it"));
    assert_eq!(filter.len(), 2);
}

#[test]
fn test_analysis_options_fall_back_to_settings() {
    let settings = Settings {
        reference_language: "ja".to_string(),
        ..Settings::default()
    };
    let options = analysis_options(&settings, None, None, None, false);

    assert_eq!(options.reference_language, "ja");
    assert_eq!(options.top_n, None);
    assert!(options.language_filter.is_none());
    assert_eq!(options.mode, LengthMode::Compressed);
}

#[test]
fn test_expand_config_path_keeps_plain_paths() {
    assert_eq!(
        expand_config_path("/tmp/wikigap.json"),
        PathBuf::from("/tmp/wikigap.json")
    );
    assert!(!expand_config_path("~/x.json").starts_with("~"));
}

#[test]
fn test_init_settings_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wikigap").join("config.json");

    let written = init_settings(&path, false).unwrap();
    assert_eq!(written, Settings::default());
    assert!(path.exists());

    assert!(init_settings(&path, false).is_err());
    assert!(init_settings(&path, true).is_ok());
}

#[test]
fn test_load_settings_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = load_settings(&dir.path().join("missing.json")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_load_settings_reports_bad_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "[1, 2").unwrap();

    let err = load_settings(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read settings"));
}

#[test]
fn test_write_output_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.md");

    write_output("# report\n", Some(&path)).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# report\n");
}
