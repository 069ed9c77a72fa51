//! Per-request file lifetime.
//!
//! A [`Scope`] owns two directories named after the request id, one under
//! the upload root and one under the output root. Every file a request
//! creates is tracked with a [`FileRole`]; when the scope ends (explicitly or
//! on drop) every tracked file and both directories are removed. The one
//! exception is the promoted [`Artifact`], which takes over the output
//! directory and deletes it when the artifact itself is dropped.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use mime::Mime;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ServerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Input,
    Intermediate,
    Output,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileRole::Input => "input",
            FileRole::Intermediate => "intermediate",
            FileRole::Output => "output",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub path: PathBuf,
    pub role: FileRole,
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("failed to create request directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path is not tracked by this request: {}", .0.display())]
    NotTracked(PathBuf),

    #[error("request already promoted an artifact")]
    AlreadyPromoted,
}

/// Hands out request scopes under the configured roots.
#[derive(Debug, Clone)]
pub struct ResourceTracker {
    upload_root: PathBuf,
    output_root: PathBuf,
}

impl ResourceTracker {
    pub fn new(upload_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.upload_dir, &config.output_dir)
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Create both roots if they do not exist yet. Called once at startup.
    pub async fn ensure_roots(&self) -> Result<(), ScopeError> {
        for root in [&self.upload_root, &self.output_root] {
            tokio::fs::create_dir_all(root)
                .await
                .map_err(|source| ScopeError::CreateDir {
                    path: root.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Start a new request with fresh, uniquely named directories.
    pub async fn begin_scope(&self) -> Result<Scope, ScopeError> {
        let id = Uuid::now_v7();
        let input_dir = self.upload_root.join(id.to_string());
        let work_dir = self.output_root.join(id.to_string());

        // Constructed first so a failure on the second directory still
        // removes the first one on drop.
        let scope = Scope {
            id,
            input_dir,
            work_dir,
            files: Vec::new(),
            promoted: false,
            released: false,
        };

        for dir in [&scope.input_dir, &scope.work_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ScopeError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
        }

        debug!(request_id = %id, "Request scope started");
        Ok(scope)
    }
}

/// Every file one request owns.
#[derive(Debug)]
pub struct Scope {
    id: Uuid,
    input_dir: PathBuf,
    work_dir: PathBuf,
    files: Vec<TrackedFile>,
    promoted: bool,
    released: bool,
}

impl Scope {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Directory holding the saved upload (and tool state such as office
    /// profiles)
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory for intermediates and the final output
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn input_path(&self, name: &str) -> PathBuf {
        self.input_dir.join(name)
    }

    pub fn work_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Start owning `path`. Tracking a path twice keeps one entry with the
    /// latest role.
    pub fn track(&mut self, path: impl Into<PathBuf>, role: FileRole) {
        let path = path.into();
        match self.files.iter_mut().find(|f| f.path == path) {
            Some(existing) => existing.role = role,
            None => self.files.push(TrackedFile { path, role }),
        }
    }

    pub fn retag(&mut self, path: &Path, role: FileRole) -> Result<(), ScopeError> {
        let file = self
            .files
            .iter_mut()
            .find(|f| f.path == path)
            .ok_or_else(|| ScopeError::NotTracked(path.to_path_buf()))?;
        file.role = role;
        Ok(())
    }

    /// Stop owning `path` (it was moved or already removed).
    pub fn forget(&mut self, path: &Path) {
        self.files.retain(|f| f.path != path);
    }

    pub fn tracked(&self) -> &[TrackedFile] {
        &self.files
    }

    /// Hand `path` over to an [`Artifact`]. The request's output directory
    /// survives the scope and is removed by the artifact instead.
    pub fn promote(&mut self, path: &Path, mime: Mime) -> Result<Artifact, ScopeError> {
        if self.promoted {
            return Err(ScopeError::AlreadyPromoted);
        }
        let index = self
            .files
            .iter()
            .position(|f| f.path == path)
            .ok_or_else(|| ScopeError::NotTracked(path.to_path_buf()))?;
        self.files.remove(index);
        self.promoted = true;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "converted".to_string());

        Ok(Artifact {
            path: path.to_path_buf(),
            file_name,
            mime,
            dir: self.work_dir.clone(),
            request_id: self.id,
        })
    }

    /// Release everything still owned. Equivalent to dropping the scope.
    pub fn end(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        for file in self.files.drain(..) {
            match std::fs::remove_file(&file.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %file.path.display(), role = %file.role, "Tracked file already gone");
                }
                Err(e) => {
                    warn!(path = %file.path.display(), role = %file.role, error = %e, "Failed to remove tracked file");
                }
            }
        }

        remove_dir(&self.input_dir);
        if !self.promoted {
            remove_dir(&self.work_dir);
        }

        debug!(request_id = %self.id, promoted = self.promoted, "Request scope released");
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.release();
    }
}

fn remove_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), error = %e, "Failed to remove request directory"),
    }
}

/// The deliverable of one request. Dropping it deletes the file and the
/// request's output directory.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    file_name: String,
    mime: Mime,
    dir: PathBuf,
    request_id: Uuid,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attachment name: the basename of the output file
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &Mime {
        &self.mime
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub async fn size(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    /// Copy the artifact out of the request directory, e.g. for the CLI.
    pub async fn copy_to(&self, dest: &Path) -> io::Result<u64> {
        tokio::fs::copy(&self.path, dest).await
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove delivered artifact");
            }
        }
        remove_dir(&self.dir);
        debug!(request_id = %self.request_id, "Artifact released");
    }
}
