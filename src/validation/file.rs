//! File validation functionality
//!
//! Checks a selected file against the upload limits before it is sent.
//! Only metadata is inspected; file contents are read at upload time.

use std::path::{Path, PathBuf};

use super::ValidationError;

/// Default upload limit (100 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

pub const MIME_CSV: &str = "text/csv";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME types accepted for upload by default
pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 3] = [MIME_CSV, MIME_XLS, MIME_XLSX];

/// Map a file extension to the MIME type the backend expects
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "csv" => Some(MIME_CSV),
        "xls" => Some(MIME_XLS),
        "xlsx" => Some(MIME_XLSX),
        _ => None,
    }
}

/// Where the bytes of a candidate file come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
    pub mime: Option<String>,
    pub source: FileSource,
}

impl FileCandidate {
    /// Describe a file on disk
    ///
    /// Size comes from the file metadata and the MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = path
            .extension()
            .and_then(|ext| mime_for_extension(&ext.to_string_lossy()))
            .map(str::to_string);

        Ok(Self {
            name,
            size: metadata.len(),
            mime,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Describe an in-memory file
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>, mime: Option<String>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime,
            source: FileSource::Bytes(bytes),
        }
    }

    /// Override the detected MIME type
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read the file contents
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Validator for file uploads with size and type checking
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_size: u64,
    allowed_mime_types: Vec<String>,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_UPLOAD_BYTES,
            DEFAULT_ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        )
    }
}

impl FileValidator {
    pub fn new(max_size: u64, allowed_mime_types: Vec<String>) -> Self {
        Self {
            max_size,
            allowed_mime_types,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Validate presence, size and MIME type, in that order
    pub fn validate(&self, file: Option<&FileCandidate>) -> Result<(), ValidationError> {
        let file = file.ok_or(ValidationError::MissingFile)?;

        if file.size > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size,
                limit_mb: self.max_size / (1024 * 1024),
            });
        }

        let allowed = file
            .mime
            .as_deref()
            .is_some_and(|mime| self.allowed_mime_types.iter().any(|m| m == mime));
        if !allowed {
            return Err(ValidationError::InvalidFileType {
                mime: file.mime.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(size: u64, mime: Option<&str>) -> FileCandidate {
        FileCandidate {
            name: "data.csv".to_string(),
            size,
            mime: mime.map(str::to_string),
            source: FileSource::Bytes(Vec::new()),
        }
    }

    #[test]
    fn test_missing_file() {
        let validator = FileValidator::default();
        assert_eq!(validator.validate(None), Err(ValidationError::MissingFile));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let validator = FileValidator::default();
        let at_limit = candidate(DEFAULT_MAX_UPLOAD_BYTES, Some(MIME_CSV));
        assert!(validator.validate(Some(&at_limit)).is_ok());

        let over = candidate(DEFAULT_MAX_UPLOAD_BYTES + 1, Some(MIME_CSV));
        let err = validator.validate(Some(&over)).unwrap_err();
        assert_eq!(err.to_string(), "File size exceeds 100MB limit");
    }

    #[test]
    fn test_size_checked_before_type() {
        let validator = FileValidator::default();
        let file = candidate(DEFAULT_MAX_UPLOAD_BYTES * 2, Some("application/pdf"));
        assert!(matches!(
            validator.validate(Some(&file)),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_invalid_mime() {
        let validator = FileValidator::default();
        let pdf = candidate(10, Some("application/pdf"));
        let err = validator.validate(Some(&pdf)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file type. Please upload a CSV or Excel file"
        );

        let unknown = candidate(10, None);
        assert!(validator.validate(Some(&unknown)).is_err());
    }

    #[test]
    fn test_excel_types_accepted() {
        let validator = FileValidator::default();
        assert!(validator.validate(Some(&candidate(10, Some(MIME_XLS)))).is_ok());
        assert!(validator.validate(Some(&candidate(10, Some(MIME_XLSX)))).is_ok());
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("CSV"), Some(MIME_CSV));
        assert_eq!(mime_for_extension("xlsx"), Some(MIME_XLSX));
        assert_eq!(mime_for_extension("json"), None);
    }

    #[test]
    fn test_from_bytes_size() {
        let file = FileCandidate::from_bytes("a.csv", b"id\n1\n".to_vec(), Some(MIME_CSV.into()));
        assert_eq!(file.size, 5);
    }
}
