use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_serve_the_folder_tree_layout_locally() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.layout, Layout::FolderTree);
    assert_eq!(settings.event_buffer, DEFAULT_EVENT_CAPACITY);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn file_overrides_known_keys_and_ignores_the_rest() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
layout = "eye_button"
event_buffer = "32"
unrelated = "x"
"#,
    )
    .expect("valid file");

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.layout, Layout::EyeButton);
    assert_eq!(settings.event_buffer, 32);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn file_with_unknown_layout_is_an_error() {
    let mut settings = Settings::default();
    let err = apply_file_overrides(&mut settings, r#"layout = "scene""#).expect_err("bad layout");
    assert!(err.to_string().contains("scene"));
}

#[test]
fn prefixed_env_vars_win_over_legacy_names() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("RUST_LOG", "debug"),
            ("APP__LOG_FILTER", "control_tree=trace"),
            ("APP__LAYOUT", "nested"),
        ]),
    )
    .expect("valid env");

    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.log_filter, "control_tree=trace");
    assert_eq!(settings.layout, Layout::Nested);
}

#[test]
fn zero_event_buffer_is_rejected() {
    let mut settings = Settings::default();
    assert!(apply_env_overrides(&mut settings, env(&[("APP__EVENT_BUFFER", "0")])).is_err());
    assert!(apply_env_overrides(&mut settings, env(&[("APP__EVENT_BUFFER", "lots")])).is_err());
    assert_eq!(settings.event_buffer, DEFAULT_EVENT_CAPACITY);
}
