use serde::Serialize;

pub const PDF_MIME: &str = "application/pdf";

/// Rendered transcript waiting to be saved by the user
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatus {
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub size: usize,
    pub warning: Option<String>,
}

impl ExportStatus {
    pub fn ready(export: &PdfExport) -> Self {
        Self {
            filename: Some(export.filename.clone()),
            mime: Some(PDF_MIME.to_string()),
            size: export.bytes.len(),
            warning: None,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            filename: None,
            mime: None,
            size: 0,
            warning: Some(msg.into()),
        }
    }
}
