use std::process::Command;

fn run_databot(args: &[&str], envs: &[(&str, &std::path::Path)]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_databot"));
    cmd.args(args).env("DATABOT_ENRICH", "off");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    cmd.output().expect("failed to run databot binary")
}

#[test]
fn cli_help_lists_subcommands() {
    let out = run_databot(&["--help"], &[]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for sub in ["serve", "refresh-tags", "find", "chat"] {
        assert!(stdout.contains(sub), "missing {} in {}", sub, stdout);
    }
}

#[test]
fn cli_find_unknown_tag_fails_with_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let portals = dir.path().join("portals.json");
    let tags = dir.path().join("tags.json");
    std::fs::write(&portals, r#"{"udata_root": ["http://127.0.0.1:9"]}"#).unwrap();
    std::fs::write(&tags, r#"{"tags": ["health", "healthcare"]}"#).unwrap();

    let out = run_databot(
        &["find", "heal"],
        &[("DATABOT_PORTALS_FILE", &portals), ("DATABOT_TAGS_FILE", &tags)],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown tag 'heal'"), "stderr: {}", stderr);
    assert!(stderr.contains("health, healthcare"), "stderr: {}", stderr);
}

#[test]
fn cli_find_missing_registry_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_databot(
        &["find", "health"],
        &[
            ("DATABOT_PORTALS_FILE", &dir.path().join("none.json")),
            ("DATABOT_TAGS_FILE", &dir.path().join("tags.json")),
        ],
    );
    assert!(!out.status.success());
}
