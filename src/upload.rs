//! Reading multipart uploads from the browser before they are passed on to Odoo.

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;
use crate::odoo::OdooFile;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "txt",
];
/// Text fields are small; anything larger is not a form value.
const MAX_FIELD_BYTES: usize = 16 * 1024;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._ -]").unwrap();
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn into_odoo_file(self, field: &str) -> OdooFile {
        OdooFile {
            field: field.to_string(),
            filename: self.filename,
            content_type: self.content_type,
            bytes: self.bytes,
        }
    }
}

/// A fully read multipart body: text fields and file parts by field name.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub async fn read(mut payload: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
            let disposition = field.content_disposition();
            let name = disposition.get_name().unwrap_or_default().to_string();
            let filename = disposition.get_filename().map(str::to_string);
            let content_type = field
                .content_type()
                .map(|mime| mime.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let limit = if filename.is_some() { MAX_UPLOAD_BYTES } else { MAX_FIELD_BYTES };
            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(multipart_error)?;
                if bytes.len() + chunk.len() > limit {
                    return Err(AppError::BadRequest(match filename {
                        Some(_) => format!("File exceeds the maximum size of {} MB", MAX_UPLOAD_BYTES / (1024 * 1024)),
                        None => format!("Form field '{}' is too large", name),
                    }));
                }
                bytes.extend_from_slice(&chunk);
            }

            match filename {
                Some(filename) => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let value = String::from_utf8(bytes)
                        .map_err(|_| AppError::BadRequest(format!("Form field '{}' is not valid text", name)))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn required_field(&self, name: &str) -> Result<&str, AppError> {
        self.field(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Field '{}' is required", name)))
    }

    /// Takes the file part `name`, checking it against the upload rules.
    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        let mut file = self
            .files
            .remove(name)
            .ok_or_else(|| AppError::BadRequest(format!("File '{}' is required", name)))?;
        check_upload(&file.filename, file.bytes.len())?;
        file.filename = sanitize_filename(&file.filename);
        Ok(file)
    }
}

fn multipart_error(error: actix_multipart::MultipartError) -> AppError {
    log::warn!("Malformed multipart body: {}", error);
    AppError::BadRequest(format!("Invalid multipart body: {}", error))
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension allow-list, non-empty and at most `MAX_UPLOAD_BYTES`.
pub fn check_upload(filename: &str, size: usize) -> Result<(), AppError> {
    match extension(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(AppError::BadRequest(format!(
                "File type not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )))
        }
    }
    if size == 0 {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "File exceeds the maximum size of {} MB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Drops any path the browser sent along and characters Odoo would choke on.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    UNSAFE_FILENAME_CHARS.replace_all(base, "_").into_owned()
}
