//! Font-file validation
//!
//! A shallow sanity check, not a font parser: existence, extension, size,
//! filename safety, lock state, and a four-byte magic-number sniff.

use crate::locks::is_locked;
use crate::name::INVALID_FILENAME_CHARS;
use fontsync_types::{Error, Result, ValidationReport};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Size above which a font produces a warning (not an error)
pub const MAX_FONT_SIZE_MB: f64 = 100.0;

/// Known OpenType/TrueType header signatures
const FONT_MAGIC_NUMBERS: [&[u8]; 4] = [b"OTTO", b"\x00\x01\x00\x00", b"true", b"typ1"];

/// Validate a font file before installation
///
/// Fatal problems (missing file, non-file, bad extension, empty file,
/// unsafe filename) fail with a validation error carrying a remediation
/// hint. Oversized files, unrecognized headers, and lock contention are
/// reported as warnings on the returned report instead.
pub async fn validate_font<P: AsRef<Path>>(path: P) -> Result<ValidationReport> {
    let path = path.as_ref();
    let mut report = ValidationReport {
        valid: true,
        ..ValidationReport::default()
    };

    if !path.exists() {
        return Err(Error::validation(
            format!("font file does not exist: {}", path.display()),
            Some("check the file path"),
        ));
    }

    if !path.is_file() {
        return Err(Error::validation(
            format!("not a regular file: {}", path.display()),
            Some("specify a font file, not a directory"),
        ));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    if !extension.eq_ignore_ascii_case("otf") && !extension.eq_ignore_ascii_case("ttf") {
        return Err(Error::validation(
            format!("unsupported file format: .{extension}"),
            Some("supported formats: .otf, .ttf"),
        ));
    }

    let metadata = fs::metadata(path)
        .await
        .map_err(|e| Error::from_io(path, e))?;
    let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
    report.size_mb = (size_mb * 100.0).round() / 100.0;

    if metadata.len() == 0 {
        return Err(Error::validation(
            format!("file is empty: {}", path.display()),
            Some("the file may be corrupted"),
        ));
    }

    if size_mb > MAX_FONT_SIZE_MB {
        report
            .warnings
            .push(format!("file is unusually large ({size_mb:.1} MB)"));
    }

    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if file_name.contains(&INVALID_FILENAME_CHARS[..]) {
        return Err(Error::validation(
            format!("file name contains invalid characters: {file_name}"),
            Some("rename the file to remove special characters"),
        ));
    }

    if is_locked(path) {
        report.locked = true;
        report
            .warnings
            .push("file is in use by another application".to_string());
    }

    match read_header(path).await {
        Ok(header) => {
            if !FONT_MAGIC_NUMBERS.iter().any(|m| header.starts_with(m)) {
                report
                    .warnings
                    .push("unrecognized font file header".to_string());
            }
        }
        Err(_) => {
            report
                .warnings
                .push("failed to read file header".to_string());
        }
    }

    Ok(report)
}

async fn read_header(path: &Path) -> std::io::Result<[u8; 4]> {
    let mut file = fs::File::open(path).await?;
    let mut header = [0u8; 4];
    file.read_exact(&mut header).await?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontsync_types::ErrorKind;
    use tempfile::TempDir;

    async fn expect_validation_error(path: &Path) -> Error {
        let err = validate_font(path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FontValidation);
        err
    }

    #[tokio::test]
    async fn test_valid_otf_passes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Font.otf");
        std::fs::write(&path, b"OTTO rest of the font data").unwrap();

        let report = validate_font(&path).await.unwrap();
        assert!(report.valid);
        assert!(report.warnings.is_empty());
        assert!(!report.locked);
    }

    #[tokio::test]
    async fn test_valid_ttf_magic_numbers() {
        let dir = TempDir::new().unwrap();
        for (name, header) in [
            ("a.ttf", &b"\x00\x01\x00\x00rest"[..]),
            ("b.ttf", &b"true..."[..]),
            ("c.ttf", &b"typ1..."[..]),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, header).unwrap();
            let report = validate_font(&path).await.unwrap();
            assert!(report.warnings.is_empty(), "{name}: {:?}", report.warnings);
        }
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let err = expect_validation_error(Path::new("/no/such/Font.otf")).await;
        assert!(err.hint().is_some());
    }

    #[tokio::test]
    async fn test_directory_fails() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("fonts.otf");
        std::fs::create_dir(&sub).unwrap();
        expect_validation_error(&sub).await;
    }

    #[tokio::test]
    async fn test_wrong_extension_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Font.woff");
        std::fs::write(&path, b"wOFF").unwrap();
        let err = expect_validation_error(&path).await;
        assert_eq!(err.hint(), Some("supported formats: .otf, .ttf"));
    }

    #[tokio::test]
    async fn test_mixed_case_extension_allowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Font.OTF");
        std::fs::write(&path, b"OTTO data").unwrap();
        assert!(validate_font(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Font.otf");
        std::fs::write(&path, b"").unwrap();
        expect_validation_error(&path).await;
    }

    #[tokio::test]
    async fn test_unknown_header_warns_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Font.otf");
        std::fs::write(&path, b"XXXX not a font").unwrap();

        let report = validate_font(&path).await.unwrap();
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("header"));
    }

    #[tokio::test]
    async fn test_invalid_characters_in_name_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Bad?Font.otf");
        // The filesystem may refuse such a name; only assert when it exists
        if std::fs::write(&path, b"OTTO").is_ok() {
            let err = expect_validation_error(&path).await;
            assert!(err.hint().unwrap().contains("rename"));
        }
    }
}
