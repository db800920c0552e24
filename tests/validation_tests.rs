//! File validation and client configuration tests

use std::fs::File;
use std::path::Path;

use data_alchemy_sdk::validation::file::{MIME_CSV, MIME_XLSX};
use data_alchemy_sdk::{ClientConfig, FileCandidate, FileValidator, ValidationError};

fn sparse_file(dir: &Path, name: &str, size: u64) -> FileCandidate {
    let path = dir.join(name);
    File::create(&path).unwrap().set_len(size).unwrap();
    FileCandidate::from_path(&path).unwrap()
}

mod file_validation_tests {
    use super::*;

    #[test]
    fn test_csv_under_limit_passes() {
        let dir = tempfile::tempdir().unwrap();
        let file = sparse_file(dir.path(), "sales.csv", 50 * 1024 * 1024);
        assert_eq!(file.mime.as_deref(), Some(MIME_CSV));
        assert!(FileValidator::default().validate(Some(&file)).is_ok());
    }

    #[test]
    fn test_file_at_limit_passes() {
        let dir = tempfile::tempdir().unwrap();
        let file = sparse_file(dir.path(), "exact.xlsx", 100 * 1024 * 1024);
        assert_eq!(file.mime.as_deref(), Some(MIME_XLSX));
        assert!(FileValidator::default().validate(Some(&file)).is_ok());
    }

    #[test]
    fn test_file_over_limit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = sparse_file(dir.path(), "huge.csv", 150 * 1024 * 1024);
        let err = FileValidator::default().validate(Some(&file)).unwrap_err();
        assert_eq!(err.to_string(), "File size exceeds 100MB limit");
    }

    #[test]
    fn test_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = sparse_file(dir.path(), "report.pdf", 1024);
        assert_eq!(file.mime, None);
        let err = FileValidator::default().validate(Some(&file)).unwrap_err();
        assert_eq!(err, ValidationError::InvalidFileType { mime: None });
        assert_eq!(
            err.to_string(),
            "Invalid file type. Please upload a CSV or Excel file"
        );
    }

    #[test]
    fn test_size_checked_before_type() {
        let dir = tempfile::tempdir().unwrap();
        let file = sparse_file(dir.path(), "huge.pdf", 150 * 1024 * 1024);
        let err = FileValidator::default().validate(Some(&file)).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = FileValidator::default().validate(None).unwrap_err();
        assert_eq!(err.to_string(), "No file provided");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileCandidate::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_mime_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = sparse_file(dir.path(), "export.dat", 10).with_mime(MIME_CSV);
        assert!(FileValidator::default().validate(Some(&file)).is_ok());
    }

    #[tokio::test]
    async fn test_read_bytes_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.csv");
        std::fs::write(&path, "id,name\n1,Ada\n").unwrap();
        let file = FileCandidate::from_path(&path).unwrap();
        assert_eq!(file.size, 14);
        assert_eq!(file.read_bytes().await.unwrap(), b"id,name\n1,Ada\n");
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_configured_limit_applies() {
        let config = ClientConfig::default().with_max_upload_bytes(1024 * 1024);
        let validator = config.file_validator();
        let file = FileCandidate::from_bytes("a.csv", vec![0; 2 * 1024 * 1024], Some(MIME_CSV.into()));
        let err = validator.validate(Some(&file)).unwrap_err();
        assert_eq!(err.to_string(), "File size exceeds 1MB limit");
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_base_url("localhost:8000").validate().is_err());
        assert!(ClientConfig::default().with_poll_interval_ms(0).validate().is_err());
        assert!(ClientConfig::default().with_page_size(0).validate().is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            "base_url = \"https://data.example.com/api/v1\"\npoll_interval_ms = 2000\n",
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "https://data.example.com/api/v1");
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_load_missing_config_file() {
        let err = ClientConfig::load("/nonexistent/client.toml").unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }
}
