use super::*;

#[test]
fn eye_check_passes_for_every_layout() {
    for layout in Layout::ALL {
        let lines = eye_check(layout).expect("eye check");
        assert_eq!(lines.len(), build(layout).expect("layout").len());
    }
}

#[test]
fn eye_check_lists_display_controls_by_category() {
    let lines = eye_check(Layout::EyeButton).expect("eye check");
    assert!(lines
        .iter()
        .any(|line| line.starts_with("markdown") && line.contains("display")));
    assert!(lines
        .iter()
        .any(|line| line.starts_with("button") && line.contains("Test Button 2")));
}

#[test]
fn cli_parses_layout_names() {
    let cli = Cli::try_parse_from(["tools", "dump", "--layout", "eye-button", "--pretty"])
        .expect("args");
    assert!(matches!(
        cli.command,
        Command::Dump {
            layout: Layout::EyeButton,
            pretty: true
        }
    ));
    assert!(Cli::try_parse_from(["tools", "eye-check", "--layout", "scene"]).is_err());
}
