//! Integration tests for rxdiskd

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn rxdiskd() -> Command {
        cargo_bin_cmd!("rxdiskd")
    }

    #[test]
    fn help_displays() {
        rxdiskd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("REST management daemon"));
    }

    #[test]
    fn version_displays() {
        rxdiskd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rxdiskd"));
    }

    #[test]
    fn rejects_malformed_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[utility\npath = ").unwrap();

        rxdiskd()
            .arg("--config")
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn rejects_unbindable_listen_address() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing.toml");

        rxdiskd()
            .arg("--config")
            .arg(&path)
            .args(["--listen", "not-an-address"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("binding"));
    }
}
