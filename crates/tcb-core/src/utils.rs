use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;

use crate::Result;

// ============== Session Log ==============

/// Append-only diagnostic log of chat lines for one run.
///
/// Lines are `author: message`. The file name is derived from the start time,
/// so every run gets a fresh file.
#[derive(Clone, Debug)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Create `<dir>/session_<dd-mm-yy-HH-MM-SS>.log` (the directory is created if needed).
    pub fn create_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let name = Local::now()
            .format("session_%d-%m-%y-%H-%M-%S.log")
            .to_string();
        Self::at(dir.join(name))
    }

    pub fn at(path: PathBuf) -> Result<Self> {
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, author: &str, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = message.replace(['\r', '\n'], " ");
        writeln!(file, "{author}: {line}")?;
        Ok(())
    }
}
