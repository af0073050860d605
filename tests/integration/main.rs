//! Integration tests for ur

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// `ur` with config and cache isolated under `home`
    fn ur(home: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("ur");
        cmd.env_remove("UR_CACHE_ROOT")
            .env_remove("UR_SKIP_CACHE")
            .env_remove("UR_DEBUG")
            .arg("--config")
            .arg(home.join("config.toml"))
            .arg("--cache-root")
            .arg(home.join("cache"));
        cmd
    }

    fn project(home: &Path) -> std::path::PathBuf {
        let dir = home.join("project");
        fs::create_dir_all(dir.join("pkg")).unwrap();
        fs::write(dir.join(".urignore"), "*.log\n").unwrap();
        fs::write(dir.join("a.py"), "print('a')\n").unwrap();
        fs::write(dir.join("pkg/b.py"), "").unwrap();
        fs::write(dir.join("pkg/debug.log"), "").unwrap();
        dir
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("ur")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("gists, GitHub and GitLab"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("ur")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ur"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        ur(home.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_masks_tokens() {
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[auth]\ngithub_token = \"ghp_secret\"\n",
        )
        .unwrap();
        ur(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("ghp_secret").not());
    }

    #[test]
    fn config_init_writes_file() {
        let home = TempDir::new().unwrap();
        ur(home.path()).args(["config", "init"]).assert().success();
        assert!(home.path().join("config.toml").is_file());
    }

    #[test]
    fn invalid_config_fails() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.toml"), "[cache\n").unwrap();
        ur(home.path())
            .args(["cache", "path"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn cache_path_follows_flag() {
        let home = TempDir::new().unwrap();
        ur(home.path())
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn cache_list_empty() {
        let home = TempDir::new().unwrap();
        ur(home.path())
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
        ur(home.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stderr(predicate::str::contains("No cached entities"));
    }

    #[test]
    fn ls_local_directory() {
        let home = TempDir::new().unwrap();
        let dir = project(home.path());
        ur(home.path())
            .arg("ls")
            .arg(&dir)
            .assert()
            .success()
            .stdout(".urignore\na.py\npkg/\n");
    }

    #[test]
    fn ls_recursive_honors_urignore() {
        let home = TempDir::new().unwrap();
        let dir = project(home.path());
        ur(home.path())
            .args(["ls", "-r"])
            .arg(&dir)
            .assert()
            .success()
            .stdout(".urignore\na.py\npkg/\npkg/b.py\n");
        ur(home.path())
            .args(["ls", "-r", "--all"])
            .arg(&dir)
            .assert()
            .success()
            .stdout(predicate::str::contains("pkg/debug.log"));
    }

    #[test]
    fn cat_local_file() {
        let home = TempDir::new().unwrap();
        let dir = project(home.path());
        ur(home.path())
            .arg("cat")
            .arg(dir.join("a.py"))
            .assert()
            .success()
            .stdout("print('a')\n");
    }

    #[test]
    fn cat_directory_fails() {
        let home = TempDir::new().unwrap();
        let dir = project(home.path());
        ur(home.path())
            .arg("cat")
            .arg(dir.join("pkg"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("it is a directory"));
    }

    #[test]
    fn resolve_local_file_as_json() {
        let home = TempDir::new().unwrap();
        let dir = project(home.path());
        ur(home.path())
            .args(["resolve", "--format", "json"])
            .arg(dir.join("a.py"))
            .assert()
            .success()
            .stdout(predicate::str::contains("\"kind\": \"file\""));
    }

    #[test]
    fn missing_local_path() {
        let home = TempDir::new().unwrap();
        ur(home.path())
            .arg("cat")
            .arg(home.path().join("nope.py"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path does not exist"));
    }

    #[test]
    fn unknown_domain_rejected() {
        let home = TempDir::new().unwrap();
        ur(home.path())
            .args(["resolve", "https://example.com/a/b"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("example.com"));
    }

    #[test]
    fn malformed_prefixed_id_rejected() {
        let home = TempDir::new().unwrap();
        ur(home.path())
            .args(["cat", "github:just-an-org"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid identifier"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("ur")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("_ur"));
    }
}
