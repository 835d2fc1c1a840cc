use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_steward"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "steward init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".steward.toml");
    assert!(config_path.exists(), ".steward.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[github]"));
    assert!(content.contains("[llm]"));
    assert!(content.contains("[resolver]"));

    // every key is commented out, so parsing yields the defaults
    let config: steward_core::StewardConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.llm.model, "llama3");
    assert!(config.resolver.infer_with_llm);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".steward.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_steward"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".steward.toml")).unwrap();
    assert_eq!(content, "# existing");
}
