use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    CheckedIn,
    CheckedOut,
    /// The account is not linked to an Odoo employee.
    Unknown,
    /// Odoo could not be asked.
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceStatus {
    pub status: AttendanceState,
    #[serde(default)]
    pub last_action_time: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AttendanceStatus {
    pub fn with_message(status: AttendanceState, message: &str) -> Self {
        Self {
            status,
            last_action_time: None,
            message: Some(message.to_string()),
        }
    }
}

/// One `hr.attendance` line of today, times in the employee's timezone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub id: i32,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub worked_hours: Option<f64>,
}

/// Body of `GET /attendance/today-log`. `message` is set only when the log
/// could not be produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodayLog {
    pub employee_id: Option<i32>,
    pub attendance_log: Vec<AttendanceRecord>,
    pub message: Option<String>,
}

impl TodayLog {
    pub fn for_employee(employee_id: i32, attendance_log: Vec<AttendanceRecord>) -> Self {
        Self {
            employee_id: Some(employee_id),
            attendance_log,
            message: None,
        }
    }

    pub fn unavailable(employee_id: Option<i32>, message: &str) -> Self {
        Self {
            employee_id,
            attendance_log: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

/// Answer of check-in and check-out; Odoo's body is passed through.
pub type AttendanceActionResponse = serde_json::Value;
