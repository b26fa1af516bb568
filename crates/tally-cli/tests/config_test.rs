use predicates::prelude::*;
use tally_testing::TestWorld;

#[test]
fn test_config_show_defaults_without_file() {
    let world = TestWorld::new();

    let json = world.run_json(&["config", "show"]).unwrap();
    assert_eq!(json["aggregator"]["reduction_confirm_secs"], 5);
    assert_eq!(json["aggregator"]["silence_confirm_secs"], 5);
    assert_eq!(json["aggregator"]["min_detection_secs"], 10);
    assert_eq!(json["monitor"]["stream_id"], "default");
    assert!(!world.config_path().exists());
}

#[test]
fn test_config_init_writes_once() {
    let world = TestWorld::new();

    let first = world.run(&["config", "init"]).unwrap();
    assert!(first.success(), "{}", first.stderr());
    assert!(world.config_path().exists());

    world
        .command()
        .unwrap()
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    world
        .command()
        .unwrap()
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_show_reads_file() {
    let world = TestWorld::new().with_config("[monitor]\nstream_id = \"porch\"\n");

    let plain = world.run(&["config", "show"]).unwrap();
    assert!(plain.success());
    assert!(plain.stdout().contains("stream_id = \"porch\""));
    assert!(plain.stdout().contains("min_detection_secs = 10"));
}

#[test]
fn test_invalid_config_is_reported() {
    let world = TestWorld::new().with_config("[aggregator]\nmin_detection_secs = \"ten\"\n");

    world
        .command()
        .unwrap()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_data_dir_from_environment() {
    let world = TestWorld::new();
    let other = world.cwd().join("elsewhere");

    // --data-dir wins over TALLY_PATH
    let mut cmd = world.command().unwrap();
    cmd.env("TALLY_PATH", &other)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(world.config_path().exists());
    assert!(!other.join("config.toml").exists());
}
