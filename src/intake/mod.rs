//! Image intake: upload validation and persistence.
//!
//! Uploads are accepted only when the filename carries one of the allowed
//! image extensions. The client-supplied filename is sanitized before it
//! is used as a storage key, so path traversal and shell-unfriendly
//! characters never reach the filesystem. Nothing is written for a
//! rejected upload.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::IntakeError;

/// Filename extensions accepted for upload (lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An upload that passed validation and was written to storage.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Sanitized filename, usable as a URL path segment
    pub filename: String,

    /// Full path of the stored file
    pub path: PathBuf,

    /// The raw bytes, kept so downstream stages need not re-read the file
    pub bytes: Bytes,
}

/// Check whether a filename carries an allowed image extension.
///
/// The comparison is case-insensitive; a filename without a `.` is
/// rejected.
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Reduce a client-supplied filename to a safe storage key.
///
/// Directory components are dropped, anything outside
/// `[A-Za-z0-9._-]` becomes `_`, and leading dots are stripped so the
/// result can never escape the upload directory or hide as a dotfile.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

/// Validates uploads and writes them to the configured storage area.
#[derive(Debug, Clone)]
pub struct ImageIntake {
    upload_dir: PathBuf,
}

impl ImageIntake {
    /// Create an intake writing into `upload_dir`.
    ///
    /// The directory is expected to exist (created at startup).
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// The storage area this intake writes into.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate an upload and persist its bytes.
    ///
    /// Rejects empty filenames and disallowed extensions without writing
    /// anything. On success the file lands under the sanitized name,
    /// overwriting any previous upload with the same name, and the bytes
    /// are handed back for the classification stage.
    pub async fn validate_and_store(
        &self,
        filename: &str,
        bytes: Bytes,
    ) -> Result<StoredImage, IntakeError> {
        if filename.is_empty() {
            return Err(IntakeError::NoFileSelected);
        }

        if !allowed_file(filename) {
            return Err(IntakeError::InvalidFileType {
                filename: filename.to_string(),
            });
        }

        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            return Err(IntakeError::NoFileSelected);
        }

        let path = self.upload_dir.join(&sanitized);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| IntakeError::Io(e.to_string()))?;

        Ok(StoredImage {
            filename: sanitized,
            path,
            bytes,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
