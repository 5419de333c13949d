#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestContext {
    pub cmd: Command,
    pub db: PathBuf,
    // Removed when the test ends
    pub _home: TempDir,
}

impl TestContext {
    /// Another invocation against the same registry file
    pub fn new_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_procreg");
        let mut cmd = Command::new(bin_path);
        cmd.timeout(Duration::from_secs(30));
        cmd.env_remove("PROCREG_CONFIG");
        cmd.env_remove("PROCREG_LOG_DIR");
        cmd.arg("--db").arg(&self.db);
        cmd
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self._home.path().join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }
}

pub fn procreg() -> TestContext {
    let home = TempDir::new().expect("Failed to create temp dir");
    let db = home.path().join("registry.db");

    let bin_path = env!("CARGO_BIN_EXE_procreg");
    let mut cmd = Command::new(bin_path);
    cmd.timeout(Duration::from_secs(30));
    cmd.env_remove("PROCREG_CONFIG");
    cmd.env_remove("PROCREG_LOG_DIR");
    cmd.arg("--db").arg(&db);

    TestContext {
        cmd,
        db,
        _home: home,
    }
}
