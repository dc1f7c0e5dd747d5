use serde::{Deserialize, Serialize};

/// A done or paid `hr.payslip`, as listed by the connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payslip {
    pub id: i32,
    /// The payslip name, which usually carries the period.
    pub month: String,
    pub total: f64,
    pub status: String,
    #[serde(default)]
    pub pdf_available: bool,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}
