use thiserror::Error;

/// Errors from the credential store.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// Registration attempted with a username that already exists
    #[error("Username already exists: {username}")]
    DuplicateUsername { username: String },

    /// Unknown username or password hash mismatch
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing or hash parsing failed
    #[error("Password hash error: {0}")]
    Hash(String),

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(String),
}

/// Errors from image intake validation and persistence.
#[derive(Debug, Clone, Error)]
pub enum IntakeError {
    /// The request carried no file, or an empty filename
    #[error("No selected file")]
    NoFileSelected,

    /// The filename extension is not one of the allowed image types
    #[error("Invalid file type: {filename} (allowed: png, jpg, jpeg)")]
    InvalidFileType { filename: String },

    /// Failed to write the uploaded bytes to the storage area
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors from the inference engine.
#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    /// The classifier failed to construct at startup and stays down
    /// for the rest of the process
    #[error("Model not loaded: {reason}")]
    Unavailable { reason: String },

    /// The uploaded bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The model rejected the input or produced an unusable output
    #[error("Inference error: {0}")]
    Inference(String),
}

/// Errors from report generation.
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    /// PDF assembly failed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Failed to write the report to the storage area
    #[error("I/O error: {0}")]
    Io(String),
}
