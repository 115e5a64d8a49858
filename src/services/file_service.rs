use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use crate::error::{AppError, AppResult};

pub fn get_app_data_dir() -> AppResult<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::config("Could not find data directory"))?
        .join("CaseRoleplay");

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Pull the text out of an uploaded case file.
///
/// PDFs have their pages concatenated, plain text is decoded leniently, and
/// any other file type yields an empty string.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> AppResult<String> {
    let lower = file_name.to_lowercase();

    if lower.ends_with(".pdf") {
        let text = extract_pdf_text(bytes)
            .map_err(|e| AppError::Extraction(format!("{}: {}", file_name, e)))?;
        // pdf-extract separates pages with form feeds
        let joined: String = text.split('\x0c').collect();
        Ok(joined.trim().to_string())
    } else if lower.ends_with(".txt") {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    } else {
        tracing::debug!("Unsupported case file type: {}", file_name);
        Ok(String::new())
    }
}

/// pdf-extract panics on some malformed content streams (a `Tj` with no font
/// selected, a missing `/Font` resource) instead of returning an error.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => {
            tracing::warn!("PDF parser panicked on malformed content");
            Err("unreadable PDF content".to_string())
        }
    }
}

pub fn read_case_file(path: &Path) -> AppResult<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = fs::read(path)?;
    tracing::info!("Read case file {} ({} bytes)", file_name, bytes.len());
    extract_text(&file_name, &bytes)
}
