use super::*;

#[test]
fn defaults_point_at_local_data_dir() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.data_dir, PathBuf::from("./data"));
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        r#"
        bind_addr = "0.0.0.0:9000"
        data_dir = "/srv/music"
        "#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.data_dir, PathBuf::from("/srv/music"));
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_settings(&mut settings, "bind_addr = [");
    assert_eq!(settings, Settings::default());
}

#[test]
fn prefixed_env_vars_win_over_plain_ones() {
    let mut settings = Settings::default();
    let env: HashMap<&str, &str> = [
        ("SERVER_BIND", "10.0.0.1:80"),
        ("APP__BIND_ADDR", "10.0.0.2:80"),
        ("DATA_DIR", "/data"),
    ]
    .into_iter()
    .collect();
    apply_env_settings(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "10.0.0.2:80");
    assert_eq!(settings.data_dir, PathBuf::from("/data"));
}
