use super::*;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write");
}

#[test]
fn loads_tracks_and_locale_modules_from_data_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir.path().join("tracks.json"),
        r#"[{
            "title": "Rain",
            "artist": "Lay Phyu",
            "audioUrl": "/audio/rain.mp3",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }]"#,
    );
    write(
        &dir.path().join("locales/en/nav.json"),
        r#"{ "home": "Home" }"#,
    );
    write(
        &dir.path().join("locales/my/nav.json"),
        r#"{ "home": "ပင်မ" }"#,
    );
    write(&dir.path().join("locales/my/README.txt"), "ignored");

    let catalog = Catalog::load(dir.path()).expect("catalog");
    assert_eq!(catalog.tracks().len(), 1);
    assert_eq!(
        catalog.supported_locales(),
        vec![Locale::new("en"), Locale::new("my")]
    );
    let nav = catalog.module(&Locale::new("my"), "nav").expect("module");
    assert_eq!(nav["home"], "ပင်မ");
    assert_eq!(catalog.locale(&Locale::new("my")).expect("locale").len(), 1);
}

#[test]
fn missing_files_yield_empty_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = Catalog::load(dir.path()).expect("catalog");
    assert!(catalog.tracks().is_empty());
    assert!(catalog.supported_locales().is_empty());
}

#[test]
fn malformed_dictionary_is_reported_with_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("locales/en/nav.json"), "{ not json");

    let err = Catalog::load(dir.path()).expect_err("malformed");
    assert!(format!("{err:#}").contains("nav.json"));
}
