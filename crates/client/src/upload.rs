use std::path::Path;

use thiserror::Error;

/// Largest source file the backend accepts (16 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("No se seleccionó archivo")]
    MissingName,
    #[error("Tipo de archivo no válido. Use Excel (.xlsx, .xls) o JSON (.json)")]
    UnsupportedType { file_name: String },
    #[error("El archivo es demasiado grande (máx. 16MB)")]
    TooLarge { size: u64 },
}

/// Accepted source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Xlsx,
    Xls,
    Json,
}

impl SourceKind {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(SourceKind::Xlsx),
            "xls" => Some(SourceKind::Xls),
            "json" => Some(SourceKind::Json),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceKind::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            SourceKind::Xls => "application/vnd.ms-excel",
            SourceKind::Json => "application/json",
        }
    }
}

/// Checks name and size; runs before any bytes go on the wire.
pub fn validate_upload(file_name: &str, size: u64) -> Result<SourceKind, UploadRejection> {
    if file_name.trim().is_empty() {
        return Err(UploadRejection::MissingName);
    }

    let kind = SourceKind::from_file_name(file_name).ok_or_else(|| UploadRejection::UnsupportedType {
        file_name: file_name.to_string(),
    })?;

    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge { size });
    }

    Ok(kind)
}

/// A source file that passed [`validate_upload`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadRejection> {
        let file_name = file_name.into();
        let kind = validate_upload(&file_name, bytes.len() as u64)?;
        Ok(Self {
            file_name,
            kind,
            bytes,
        })
    }

    /// Reads a file from disk. The size is checked from metadata first so an
    /// oversized file is never loaded.
    pub async fn from_path(path: &Path) -> Result<Self, crate::ApiError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let size = tokio::fs::metadata(path).await?.len();
        let kind = validate_upload(&file_name, size)?;
        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            file_name,
            kind,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Human-readable size, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let k = 1024f64;
    let value = bytes as f64;
    let i = ((value.ln() / k.ln()).floor() as usize).min(UNITS.len() - 1);
    let scaled = (value / k.powi(i as i32) * 100.0).round() / 100.0;
    format!("{} {}", scaled, UNITS[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_extensions() {
        assert_eq!(validate_upload("datos.xlsx", 10), Ok(SourceKind::Xlsx));
        assert_eq!(validate_upload("DATOS.XLS", 10), Ok(SourceKind::Xls));
        assert_eq!(validate_upload("carga.json", 10), Ok(SourceKind::Json));
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let err = validate_upload("notas.csv", 10).unwrap_err();
        assert!(matches!(err, UploadRejection::UnsupportedType { .. }));
        assert!(validate_upload("sin_extension", 10).is_err());
        assert_eq!(validate_upload("  ", 10), Err(UploadRejection::MissingName));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate_upload("a.json", MAX_UPLOAD_BYTES).is_ok());
        assert_eq!(
            validate_upload("a.json", MAX_UPLOAD_BYTES + 1),
            Err(UploadRejection::TooLarge { size: MAX_UPLOAD_BYTES + 1 })
        );
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(16 * 1024 * 1024), "16 MB");
    }
}
