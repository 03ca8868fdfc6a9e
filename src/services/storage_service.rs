use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["pdf", "doc", "docx", "rtf", "txt"];
const PDF_MAGIC: &[u8] = b"%PDF";

/// Local-filesystem blob store for résumé attachments. Keys are generated here
/// and never taken from the caller.
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn put_resume(&self, candidate_id: Uuid, file_name: &str, data: &[u8]) -> Result<String> {
        let extension = check_resume(file_name, data)?;
        let key = format!("resumes/{}/{}.{}", candidate_id, Uuid::new_v4(), extension);
        let path = self.resolve(&key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(storage_failure)?;
        }
        fs::write(&path, data).await.map_err(storage_failure)?;

        tracing::info!(%candidate_id, key = %key, bytes = data.len(), "resume stored");
        Ok(key)
    }

    /// Opens the blob for streaming.
    pub async fn open(&self, key: &str) -> Result<fs::File> {
        let path = self.resolve(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound("Resume file not found".to_string()))
            }
            Err(e) => Err(storage_failure(e)),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_failure(e)),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(Error::Validation("invalid blob key".to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn storage_failure(err: std::io::Error) -> Error {
    Error::StorageFailure(err.to_string())
}

/// Lower-cased extension, if it is one we accept.
pub fn resume_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

pub fn check_resume(file_name: &str, data: &[u8]) -> Result<String> {
    let extension = resume_extension(file_name).ok_or_else(|| {
        Error::Validation(format!(
            "resume must be one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    if data.is_empty() {
        return Err(Error::Validation("resume file is empty".to_string()));
    }
    if extension == "pdf" && !data.starts_with(PDF_MAGIC) {
        return Err(Error::Validation("resume is not a valid PDF".to_string()));
    }
    Ok(extension)
}

/// Content type served on download, derived from the stored key.
pub fn content_type_for(key: &str) -> &'static str {
    match Path::new(key).extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("rtf") => "application/rtf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("blob-store-{}", Uuid::new_v4()))
    }

    #[test]
    fn extensions_are_a_closed_set() {
        assert_eq!(resume_extension("cv.PDF").as_deref(), Some("pdf"));
        assert_eq!(resume_extension("cv.docx").as_deref(), Some("docx"));
        assert!(resume_extension("cv.exe").is_none());
        assert!(resume_extension("cv").is_none());
    }

    #[test]
    fn pdf_needs_magic_bytes() {
        assert!(check_resume("cv.pdf", b"%PDF-1.7 rest").is_ok());
        assert!(check_resume("cv.pdf", b"MZ not a pdf").is_err());
        assert!(check_resume("cv.txt", b"").is_err());
    }

    #[tokio::test]
    async fn stored_resumes_can_be_read_back() {
        let store = BlobStore::new(temp_root());
        let candidate = Uuid::new_v4();
        let key = store
            .put_resume(candidate, "curriculo.txt", b"Experiencia em UTI")
            .await
            .unwrap();
        assert!(key.starts_with(&format!("resumes/{candidate}/")));
        assert!(key.ends_with(".txt"));

        let mut stored = Vec::new();
        store
            .open(&key)
            .await
            .unwrap()
            .read_to_end(&mut stored)
            .await
            .unwrap();
        assert_eq!(stored, b"Experiencia em UTI");

        store.remove(&key).await.unwrap();
        assert!(matches!(store.open(&key).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let store = BlobStore::new(temp_root());
        assert!(matches!(store.open("../etc/passwd").await, Err(Error::Validation(_))));
        assert!(matches!(store.open("/etc/passwd").await, Err(Error::Validation(_))));
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("resumes/a/b.pdf"), "application/pdf");
        assert_eq!(content_type_for("resumes/a/b"), "application/octet-stream");
    }
}
