//! Remote object storage interface and upload validation.
//!
//! The save flow uploads cover images and attached documents to object
//! storage before writing the referencing document, so this module carries
//! two things: the [`ObjectStorage`] trait at that boundary, and the
//! [`UploadRule`] constraint checks run before any bytes leave the client.
//! Images must be JPEG or PNG up to 5 MB; attached documents must be
//! PDF, DOC/DOCX or PPT/PPTX up to 50 MB.
//!
//! Orphan cleanup when a file is replaced is best-effort only; a failed
//! delete is reported but never blocks the save.

use crate::error::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// A file selected for upload: its name, MIME type and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Original file name, used in the storage path.
    pub name: String,
    /// MIME type as reported by the picker, e.g. `image/png`.
    pub content_type: String,
    /// Raw contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Bundles a file for upload.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A type-and-size constraint applied to an upload before it starts.
#[derive(Debug, Clone)]
pub struct UploadRule {
    /// Human label used in failure messages, e.g. `"Image"`.
    pub label: &'static str,
    /// Accepted MIME types.
    pub allowed_types: &'static [&'static str],
    /// Maximum size in bytes, inclusive.
    pub max_bytes: usize,
}

const MB: usize = 1024 * 1024;

/// The rule for cover images: JPEG or PNG, at most 5 MB.
pub fn image_rule() -> UploadRule {
    UploadRule {
        label: "Image",
        allowed_types: &["image/jpeg", "image/png"],
        max_bytes: 5 * MB,
    }
}

/// The rule for attached documents: PDF, Word or PowerPoint, at most 50 MB.
pub fn document_rule() -> UploadRule {
    UploadRule {
        label: "File",
        allowed_types: &[
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ],
        max_bytes: 50 * MB,
    }
}

impl UploadRule {
    /// Checks an upload against the rule. A failure is
    /// [`Error::ValidationFailed`] with a message suitable for direct
    /// display; the caller must leave the draft untouched so the user can
    /// correct and resubmit.
    pub fn check(&self, file: &FileUpload) -> Result<()> {
        if !self.allowed_types.contains(&file.content_type.as_str()) {
            return Err(Error::validation(format!(
                "Invalid {} type. Allowed: {}",
                self.label,
                self.allowed_types.join(", ")
            )));
        }
        if file.size() > self.max_bytes {
            return Err(Error::validation(format!(
                "{} size must be less than {}MB.",
                self.label,
                self.max_bytes / MB
            )));
        }
        Ok(())
    }
}

/// The remote object storage boundary.
///
/// `upload` returns the public download URL for the stored object; `delete`
/// takes that URL back. Transport failures surface as
/// [`Error::RemoteUnavailable`].
pub trait ObjectStorage: Send + Sync {
    /// Stores the file under `path` and returns its download URL.
    fn upload(&self, path: &str, file: &FileUpload) -> Result<String>;

    /// Removes the object behind a previously returned URL.
    fn delete(&self, url: &str) -> Result<()>;
}

type UploadHook = Box<dyn Fn(&str) + Send + Sync>;

struct MemoryStorageInner {
    uploads: Mutex<Vec<(String, usize)>>,
    deletes: Mutex<Vec<String>>,
    offline: std::sync::atomic::AtomicBool,
    upload_hook: Mutex<Option<UploadHook>>,
}

/// In-memory [`ObjectStorage`] that records every upload and delete.
///
/// Tests use the recorded paths to assert what reached storage, and the
/// upload hook to interleave actions (such as cancelling a save) between an
/// upload completing and the subsequent document write.
#[derive(Clone)]
pub struct MemoryObjectStorage {
    inner: Arc<MemoryStorageInner>,
}

impl Default for MemoryObjectStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStorage {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStorageInner {
                uploads: Mutex::new(Vec::new()),
                deletes: Mutex::new(Vec::new()),
                offline: std::sync::atomic::AtomicBool::new(false),
                upload_hook: Mutex::new(None),
            }),
        }
    }

    /// Paths and sizes of every completed upload, in order.
    pub fn uploads(&self) -> Vec<(String, usize)> {
        lock(&self.inner.uploads).clone()
    }

    /// URLs passed to `delete`, in order.
    pub fn deletes(&self) -> Vec<String> {
        lock(&self.inner.deletes).clone()
    }

    /// Toggles simulated connectivity loss.
    pub fn set_offline(&self, offline: bool) {
        self.inner
            .offline
            .store(offline, std::sync::atomic::Ordering::SeqCst);
    }

    /// Registers a hook invoked with the path of each completed upload,
    /// before `upload` returns.
    pub fn set_upload_hook(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *lock(&self.inner.upload_hook) = Some(Box::new(hook));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ObjectStorage for MemoryObjectStorage {
    fn upload(&self, path: &str, file: &FileUpload) -> Result<String> {
        if self.inner.offline.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::remote("storage is offline"));
        }
        lock(&self.inner.uploads).push((path.to_string(), file.size()));
        if let Some(hook) = lock(&self.inner.upload_hook).as_ref() {
            hook(path);
        }
        Ok(format!("memory://{path}"))
    }

    fn delete(&self, url: &str) -> Result<()> {
        if self.inner.offline.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::remote("storage is offline"));
        }
        lock(&self.inner.deletes).push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(size: usize) -> FileUpload {
        FileUpload::new("cover.png", "image/png", vec![0; size])
    }

    #[test]
    fn test_image_rule_accepts_jpeg_and_png() {
        let rule = image_rule();
        assert!(rule.check(&png(1024)).is_ok());
        assert!(rule
            .check(&FileUpload::new("c.jpg", "image/jpeg", vec![0; 10]))
            .is_ok());
    }

    #[test]
    fn test_image_rule_rejects_wrong_type() {
        let err = image_rule()
            .check(&FileUpload::new("c.gif", "image/gif", vec![0; 10]))
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
        assert!(err.to_string().contains("Invalid Image type"));
    }

    #[test]
    fn test_size_boundary_is_inclusive() {
        let rule = image_rule();
        assert!(rule.check(&png(5 * MB)).is_ok(), "exactly at the limit passes");
        let err = rule.check(&png(5 * MB + 1)).unwrap_err();
        assert_eq!(err.to_string(), "Image size must be less than 5MB.");
    }

    #[test]
    fn test_document_rule_covers_office_types() {
        let rule = document_rule();
        for ty in [
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ] {
            assert!(rule.check(&FileUpload::new("f", ty, vec![0; 10])).is_ok());
        }
        assert!(rule
            .check(&FileUpload::new("f.zip", "application/zip", vec![0; 10]))
            .is_err());
        assert!(rule
            .check(&FileUpload::new("f.pdf", "application/pdf", vec![0; 50 * MB + 1]))
            .is_err());
    }

    #[test]
    fn test_memory_storage_records_and_reports() {
        let storage = MemoryObjectStorage::new();
        let url = storage.upload("publications/1_cover.png", &png(9)).unwrap();
        assert_eq!(url, "memory://publications/1_cover.png");
        storage.delete(&url).unwrap();
        assert_eq!(storage.uploads(), vec![("publications/1_cover.png".to_string(), 9)]);
        assert_eq!(storage.deletes(), vec![url]);
    }

    #[test]
    fn test_memory_storage_offline() {
        let storage = MemoryObjectStorage::new();
        storage.set_offline(true);
        assert!(matches!(
            storage.upload("p", &png(1)),
            Err(Error::RemoteUnavailable(_))
        ));
        assert!(matches!(
            storage.delete("memory://p"),
            Err(Error::RemoteUnavailable(_))
        ));
    }

    #[test]
    fn test_upload_hook_fires_before_return() {
        let storage = MemoryObjectStorage::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        storage.set_upload_hook(move |path| sink.lock().unwrap().push(path.to_string()));
        storage.upload("a/b.png", &png(1)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["a/b.png".to_string()]);
    }
}
