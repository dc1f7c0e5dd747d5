use serde::{Deserialize, Serialize};

/// An `ir.attachment` linked to the employee record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeDocument {
    pub id: i32,
    pub filename: String,
    #[serde(default)]
    pub document_type: Option<String>,
    /// `%Y-%m-%d %H:%M:%S` in UTC, as Odoo formats it.
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Raw answer of the connector's upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OdooUploadResponse {
    pub message: Option<String>,
    pub attachment_id: Option<i32>,
    pub filename: Option<String>,
    pub document_type: Option<String>,
    pub employee_id: Option<i32>,
}

/// The attachment Odoo created, as echoed back by the connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedAttachment {
    pub attachment_id: i32,
    pub filename: String,
    pub document_type: String,
    pub employee_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUploadResponse {
    pub message: String,
    pub document: Option<UploadedAttachment>,
}

impl DocumentUploadResponse {
    /// `document` is only present when Odoo reports the new attachment id; missing
    /// fields fall back to what was sent.
    pub fn from_odoo(upload: OdooUploadResponse, sent: &UploadedAttachment) -> Self {
        let document = upload.attachment_id.map(|attachment_id| UploadedAttachment {
            attachment_id,
            filename: upload.filename.unwrap_or_else(|| sent.filename.clone()),
            document_type: upload
                .document_type
                .unwrap_or_else(|| sent.document_type.clone()),
            employee_id: upload.employee_id.unwrap_or(sent.employee_id),
        });
        Self {
            message: upload
                .message
                .unwrap_or_else(|| "Document processed by Odoo.".to_string()),
            document,
        }
    }
}
