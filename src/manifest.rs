use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "package.json";

/// A `package.json` held as an ordered JSON object so fields this tool does
/// not know about are written back untouched.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no {MANIFEST_FILE} found at {}", .0.display())]
    Missing(PathBuf),
    #[error("reading manifest at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing manifest at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest at {} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),
    #[error("serializing manifest for {}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("writing manifest to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Manifest {
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::Missing(path));
        }

        let data = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(path, &data)
    }

    fn parse(path: PathBuf, data: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(data).map_err(|source| ManifestError::Parse {
            path: path.clone(),
            source,
        })?;

        match value {
            Value::Object(document) => Ok(Self { path, document }),
            _ => Err(ManifestError::NotAnObject(path)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.document
    }

    /// The raw `packageManager` field, when it is a string.
    pub fn declared_package_manager(&self) -> Option<&str> {
        self.document.get("packageManager").and_then(Value::as_str)
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn render(&self) -> Result<String, ManifestError> {
        let mut rendered =
            serde_json::to_string_pretty(&self.document).map_err(|source| {
                ManifestError::Serialize {
                    path: self.path.clone(),
                    source,
                }
            })?;
        rendered.push('\n');
        Ok(rendered)
    }

    /// Replaces the file on disk with the current document. A symlinked
    /// manifest keeps its link; the file it points at is replaced.
    pub fn save(&self) -> Result<(), ManifestError> {
        let write_err = |source| ManifestError::Write {
            path: self.path.clone(),
            source,
        };

        let rendered = self.render()?;
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let tmp_path = target.with_extension("json.tmp");
        fs::write(&tmp_path, rendered).map_err(write_err)?;
        if let Err(err) = fs::rename(&tmp_path, &target) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(err));
        }
        Ok(())
    }
}
