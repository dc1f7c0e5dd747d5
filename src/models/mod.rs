pub mod api_token;
pub mod attendance;
pub mod document;
pub mod expense;
pub mod leave;
pub mod odoo_config;
pub mod payslip;
pub mod tenant;
pub mod user;

use serde::{Deserialize, Serialize};

pub use api_token::{ApiLogEntry, ApiToken, ApiTokenCreate, ApiTokenView};
pub use attendance::{AttendanceRecord, AttendanceState, AttendanceStatus, TodayLog};
pub use document::{DocumentUploadResponse, EmployeeDocument, OdooUploadResponse, UploadedAttachment};
pub use expense::{ExpenseForm, ExpenseSubmitResponse};
pub use leave::{LeaveRequestInput, LeaveSubmitResponse, LeaveType, NextDayOff, PendingLeavesCount};
pub use odoo_config::{OdooConfigDisplay, OdooConfigUpdate, OdooCredential};
pub use payslip::Payslip;
pub use tenant::{Pagination, Tenant, TenantCreate, TenantStatusUpdate};
pub use user::{AdminUserCreate, AdminUserListItem, AdminUserUpdate, OdooEmployee, User, UserProfile};

/// Body of endpoints that only report what happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
