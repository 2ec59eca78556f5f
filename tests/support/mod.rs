use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway vdir tree plus a config file pointing at it.
pub struct TestVdir {
    dir: TempDir,
}

impl TestVdir {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        fs::create_dir_all(dir.path().join("lists")).expect("lists dir");
        let vdir = Self { dir };
        vdir.write_config(&format!(
            "path = \"{root}/lists/*\"\ncache_path = \"{root}/cache.json\"\n",
            root = vdir.path().display()
        ));
        vdir
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.config_path(), contents).expect("write config");
    }

    pub fn add_list(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("lists").join(name);
        fs::create_dir_all(&path).expect("list dir");
        path
    }

    pub fn write_ics(&self, list: &str, file: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join("lists").join(list).join(file);
        fs::write(&path, contents).expect("write ics");
        path
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("vido").expect("binary");
        cmd.env("VIDO_CONFIG", self.config_path());
        cmd.env_remove("VIDO_CONFIG_DIR");
        cmd
    }
}

/// Minimal single-VTODO calendar text.
pub fn vtodo(uid: &str, summary: &str, extra_props: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\nBEGIN:VTODO\r\nUID:{uid}\r\nSUMMARY:{summary}\r\n{extra_props}END:VTODO\r\nEND:VCALENDAR\r\n"
    )
}
