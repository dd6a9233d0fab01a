//! Lookup of recorded note samples by key label

use std::io;
use std::path::{Path, PathBuf};

/// Outcome of looking up the sample for a note label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleLookup {
    Found(PathBuf),
    /// No file matched; carries the directory joined with the bare label
    Missing(PathBuf),
}

impl SampleLookup {
    pub fn path(&self) -> &Path {
        match self {
            SampleLookup::Found(path) | SampleLookup::Missing(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            SampleLookup::Found(path) | SampleLookup::Missing(path) => path,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SampleLookup::Found(_))
    }
}

/// Directory of audio files, one per note
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    dir: PathBuf,
    file_names: Vec<String>,
}

impl SampleLibrary {
    /// List `dir` once. Subdirectories and non UTF-8 names are ignored.
    pub fn open<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut file_names = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                file_names.push(name.to_string());
            }
        }

        Ok(Self::from_file_names(dir, file_names))
    }

    pub fn from_file_names<P: Into<PathBuf>>(dir: P, mut file_names: Vec<String>) -> Self {
        file_names.sort();
        Self {
            dir: dir.into(),
            file_names,
        }
    }

    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }

    /// Find the sample for `label`: a file named exactly `label` wins,
    /// otherwise the first file whose name contains it.
    pub fn lookup(&self, label: &str) -> SampleLookup {
        let exact = self
            .file_names
            .iter()
            .find(|name| Path::new(name).file_stem().and_then(|s| s.to_str()) == Some(label));

        match exact.or_else(|| self.file_names.iter().find(|name| name.contains(label))) {
            Some(name) => SampleLookup::Found(self.dir.join(name)),
            None => {
                log::warn!("No sample for note {} in {}", label, self.dir.display());
                SampleLookup::Missing(self.dir.join(label))
            }
        }
    }
}
