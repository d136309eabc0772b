use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::create_dir_all(temp_dir.path().join("sources"))?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config file passed to the binary with `--config`
    pub fn config_path(&self) -> PathBuf {
        self.path().join("config").join("osdeps.toml")
    }

    /// Directory whose `*.osdeps` files the test config loads
    pub fn sources_dir(&self) -> PathBuf {
        self.path().join("sources")
    }

    /// Write an osdeps file into the sources directory
    pub fn write_source(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.sources_dir().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a config that only reads the sources directory
    pub fn write_config(&self, extra: &str) -> Result<()> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let sources = self.sources_dir().join("*.osdeps");
        let content = format!("sources = [{:?}]\n{}", sources.display().to_string(), extra);
        std::fs::write(path, content)?;
        Ok(())
    }
}
