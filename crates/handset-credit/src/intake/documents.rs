use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use super::domain::{DocumentKind, DocumentRef, DocumentUpload};

/// Destination for uploaded proof-of-income documents.
pub trait DocumentSink: Send + Sync {
    fn store(
        &self,
        id_number: &str,
        kind: DocumentKind,
        upload: &DocumentUpload,
    ) -> Result<DocumentRef, DocumentSinkError>;

    /// Drop a document whose application was never committed.
    fn discard(&self, document: &DocumentRef) -> Result<(), DocumentSinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentSinkError {
    #[error("failed to write document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove document {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Storage key for an upload: the applicant's ID number plus a random token. The client's
/// own filename is never used.
pub fn storage_key(id_number: &str, kind: DocumentKind) -> String {
    format!("{id_number}_{}.{}", Uuid::new_v4().simple(), kind.extension())
}

/// Writes documents as files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemDocumentSink {
    root: PathBuf,
}

impl FileSystemDocumentSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, document: &DocumentRef) -> PathBuf {
        self.root.join(&document.storage_key)
    }
}

impl DocumentSink for FileSystemDocumentSink {
    fn store(
        &self,
        id_number: &str,
        kind: DocumentKind,
        upload: &DocumentUpload,
    ) -> Result<DocumentRef, DocumentSinkError> {
        let document = DocumentRef {
            storage_key: storage_key(id_number, kind),
            kind,
            size: upload.size() as u64,
        };
        let path = self.path_for(&document);

        let write = || -> std::io::Result<()> {
            fs::create_dir_all(&self.root)?;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)?;
            file.write_all(&upload.bytes)?;
            file.sync_all()
        };

        if let Err(source) = write() {
            if let Err(cleanup) = self.discard(&document) {
                warn!(error = %cleanup, "partial proof document left behind");
            }
            return Err(DocumentSinkError::Write { path, source });
        }

        Ok(document)
    }

    fn discard(&self, document: &DocumentRef) -> Result<(), DocumentSinkError> {
        let path = self.path_for(document);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DocumentSinkError::Remove { path, source }),
        }
    }
}
