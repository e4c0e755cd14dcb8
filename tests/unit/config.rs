use super::*;

#[test]
fn defaults_use_system_font_and_empty_catalog() {
    let cfg = EditorConfig {
        store_dir: PathBuf::from("unused"),
        ..EditorConfig::default()
    };
    assert!(matches!(cfg.font_source(), FontSource::System));
    assert!(cfg.load_catalog().unwrap().is_empty());
    let default_dir = EditorConfig::default().store_dir;
    assert!(default_dir.ends_with("mass-meme") || default_dir.ends_with(".mass-meme"));
}

#[test]
fn explicit_paths_are_honored() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    std::fs::write(
        &catalog,
        r#"{"templates":[{"id":"t1","name":"One","src":"t1.png"}]}"#,
    )
    .unwrap();

    let cfg = EditorConfig {
        store_dir: dir.path().join("store"),
        catalog_path: Some(catalog),
        font_path: Some(dir.path().join("impact.ttf")),
        style: CaptionStyle::default(),
    };
    assert!(matches!(cfg.font_source(), FontSource::File(_)));

    let editor = cfg.build_editor().unwrap();
    assert_eq!(editor.catalog().list().len(), 1);
    assert!(editor.gallery().is_empty());
    assert!(!dir.path().join("store").exists());
}

#[test]
fn missing_catalog_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = EditorConfig {
        store_dir: dir.path().to_path_buf(),
        catalog_path: Some(dir.path().join("nope.json")),
        ..EditorConfig::default()
    };
    assert!(cfg.build_editor().is_err());
}
