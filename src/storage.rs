use std::{
    fs::OpenOptions,
    io::{BufWriter, ErrorKind, Write},
    path::PathBuf,
};

use log::debug;

/// Blob store addressed by `/`-separated keys relative to the journal root.
pub(crate) trait Storage {
    fn read(&self, key: &str) -> std::io::Result<Option<String>>;
    fn write(&self, key: &str, contents: &str) -> std::io::Result<()>;
    /// Returns whether something was removed.
    fn remove(&self, key: &str) -> std::io::Result<bool>;
    fn exists(&self, key: &str) -> bool;
    /// File names directly under `dir`. Missing directory is an empty listing.
    fn list(&self, dir: &str) -> std::io::Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub(crate) struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|c| !c.is_empty())
            .fold(self.root.clone(), |p, c| p.join(c))
    }
}

impl Storage for FsStorage {
    fn read(&self, key: &str) -> std::io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, contents: &str) -> std::io::Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }
        debug!("writing {path:?}");
        let fd = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(fd);
        writer.write_all(contents.as_bytes())?;
        writer.flush()
    }

    fn remove(&self, key: &str) -> std::io::Result<bool> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    fn list(&self, dir: &str) -> std::io::Result<Vec<String>> {
        let path = self.path(dir);
        if !path.is_dir() {
            return Ok(vec![]);
        }
        let mut names = vec![];
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.metadata()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(names)
    }
}
