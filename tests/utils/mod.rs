use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the osdeps binary inside the test environment.
///
/// XDG directories point into the environment so the user's own config
/// and osdeps files are never read.
pub fn run_osdeps_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let config = env.config_path();
    let output = Command::new(env!("CARGO_BIN_EXE_osdeps"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env("XDG_CONFIG_HOME", env.path().join("xdg-config"))
        .env("XDG_DATA_HOME", env.path().join("xdg-data"))
        .env("NO_COLOR", "1")
        .env_remove("OSDEPS_OS")
        .current_dir(env.path())
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
