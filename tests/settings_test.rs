// Test loading MSR settings from YAML and JSON files

use std::fs;

use score_msr::msr::{MsrError, MsrSettings, Score, StaffKind};

#[test]
fn test_load_yaml_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("msr.yaml");
    fs::write(
        &path,
        "parts_renaming:\n  P1: Soprano\nmax_regular_voices_per_staff: 2\nignore_redundant_clefs: true\n",
    )
    .unwrap();

    let settings = MsrSettings::load(&path).unwrap();
    assert_eq!(settings.renamed_part("P1"), Some("Soprano"));
    assert_eq!(settings.max_regular_voices_per_staff, 2);
    assert!(settings.ignore_redundant_clefs);
    // unspecified fields keep their defaults
    assert!(settings.sanity_checks);
    assert!(settings.ignore_redundant_transpositions);
}

#[test]
fn test_load_json_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("msr.json");
    fs::write(
        &path,
        r#"{
            "single_line_staves_as_rhythmic": true,
            "dispatch_policy": { "repeat_clone": ["Regular"] }
        }"#,
    )
    .unwrap();

    let settings = MsrSettings::load(&path).unwrap();
    assert!(settings.single_line_staves_as_rhythmic);

    let policy = &settings.dispatch_policy;
    assert!(policy.repeat_clone.contains(StaffKind::Regular));
    assert!(!policy.repeat_clone.contains(StaffKind::Drum));
    // other rows keep their defaults
    assert!(policy.clef_key_time.contains(StaffKind::Harmonies));
    assert!(!policy.clef_key_time.contains(StaffKind::Tablature));
}

#[test]
fn test_load_missing_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = MsrSettings::load(&dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(MsrError::Settings(_))));
}

#[test]
fn test_load_malformed_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"sanity_checks\": ").unwrap();

    let err = MsrSettings::load(&path).unwrap_err();
    assert!(matches!(err, MsrError::Settings(_)));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("JSON"));
}

#[test]
fn test_score_uses_loaded_renaming() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renaming.yml");
    fs::write(&path, "parts_renaming:\n  P2: Basso\n").unwrap();

    let mut score = Score::new(MsrSettings::load(&path).unwrap());
    score.create_part(1, "P1", None).unwrap();
    score.create_part(2, "P2", None).unwrap();

    assert_eq!(score.fetch_part_by_id("P1").unwrap().msr_name(), "Part_POne");
    assert_eq!(score.fetch_part_by_id("P2").unwrap().msr_name(), "Basso");
}
