use crate::error::{Result, ValidationError};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Schema file extension, matched case-sensitively against the whole suffix
pub const SCHEMA_SUFFIX: &str = ".xsd";

/// Inspects a schema folder and lists the `*.xsd` files directly inside it
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    folder: PathBuf,
}

impl FileDiscovery {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Check that the folder exists and is a directory
    ///
    /// Whether the folder can be listed is only known once `discover_schemas` lists it,
    /// so the folder is read once per resolution.
    pub fn validate_folder(&self) -> Result<()> {
        let metadata = fs::metadata(&self.folder).map_err(|e| self.folder_error(e))?;

        if !metadata.is_dir() {
            return Err(ValidationError::PathNotADirectory {
                path: self.folder.clone(),
            });
        }

        Ok(())
    }

    /// Discover schema files in the folder (non-recursive)
    ///
    /// Files come back in directory-listing order, which is filesystem-defined. The
    /// main-schema heuristic breaks ties on this order. Listing errors map onto the same
    /// folder errors as `validate_folder`, so calling it first is optional.
    pub fn discover_schemas(&self) -> Result<Vec<PathBuf>> {
        let read_dir = fs::read_dir(&self.folder).map_err(|e| self.folder_error(e))?;

        let mut schemas = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(folder = %self.folder.display(), error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if Self::should_process(&path) && path.is_file() {
                schemas.push(path);
            }
        }

        if schemas.is_empty() {
            return Err(ValidationError::NoSchemasFound {
                path: self.folder.clone(),
            });
        }

        tracing::debug!(count = schemas.len(), folder = %self.folder.display(), "discovered schema files");
        Ok(schemas)
    }

    fn folder_error(&self, e: io::Error) -> ValidationError {
        match e.kind() {
            ErrorKind::NotFound => ValidationError::FolderNotFound {
                path: self.folder.clone(),
            },
            ErrorKind::NotADirectory => ValidationError::PathNotADirectory {
                path: self.folder.clone(),
            },
            ErrorKind::PermissionDenied => ValidationError::FolderAccessDenied {
                path: self.folder.clone(),
                source: e,
            },
            _ => ValidationError::Io(e),
        }
    }

    /// Check if a path names a schema file by its suffix
    pub fn should_process(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.len() > SCHEMA_SUFFIX.len() && name.ends_with(SCHEMA_SUFFIX))
    }
}

/// Bare file name of a discovered schema
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
