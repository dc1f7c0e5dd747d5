use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// An `hr.leave.type` entry offered in the leave request form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaveType {
    pub id: i32,
    pub name: String,
}

/// Payload of `POST /leave-request`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_leave_dates"))]
pub struct LeaveRequestInput {
    pub leave_type_id: i32,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

fn validate_leave_dates(input: &LeaveRequestInput) -> Result<(), ValidationError> {
    if input.to_date < input.from_date {
        let mut error = ValidationError::new("date_range");
        error.message = Some("to_date must not be before from_date".into());
        return Err(error);
    }
    Ok(())
}

/// Body forwarded to the connector's `/ess/api/leave`.
#[derive(Debug, Serialize)]
pub struct OdooLeavePayload<'a> {
    pub employee_id: i32,
    pub leave_type_id: i32,
    pub from_date: String,
    pub to_date: String,
    pub note: Option<&'a str>,
}

impl<'a> OdooLeavePayload<'a> {
    pub fn new(employee_id: i32, input: &'a LeaveRequestInput) -> Self {
        Self {
            employee_id,
            leave_type_id: input.leave_type_id,
            from_date: input.from_date.format("%Y-%m-%d").to_string(),
            to_date: input.to_date.format("%Y-%m-%d").to_string(),
            note: input.note.as_deref(),
        }
    }
}

/// What Odoo answers after creating the `hr.leave` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveSubmitResponse {
    pub message: String,
    #[serde(default, alias = "leave_id")]
    pub odoo_leave_id: Option<i32>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingLeavesCount {
    pub employee_id: i32,
    pub pending_leave_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextDayOff {
    pub employee_id: i32,
    #[serde(default)]
    pub next_day_off: Option<String>,
    #[serde(default)]
    pub leave_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NextDayOff {
    pub fn unavailable(employee_id: i32, message: &str) -> Self {
        Self {
            employee_id,
            next_day_off: None,
            leave_name: None,
            message: Some(message.to_string()),
        }
    }
}
