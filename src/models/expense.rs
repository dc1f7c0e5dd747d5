use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Text fields of the `POST /expenses` multipart form. The receipt arrives as a file part.
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
}

impl ExpenseForm {
    /// Builds the form from raw multipart values, rejecting blank descriptions
    /// and non-positive amounts.
    pub fn parse(description: Option<&str>, amount: Option<&str>, date: Option<&str>) -> Result<Self, String> {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| "Description is required".to_string())?;
        let amount: f64 = amount
            .ok_or_else(|| "Amount is required".to_string())?
            .trim()
            .parse()
            .map_err(|_| "Amount must be a number".to_string())?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err("Amount must be greater than zero".into());
        }
        let date = date
            .ok_or_else(|| "Date is required".to_string())?
            .trim()
            .parse::<NaiveDate>()
            .map_err(|_| "Date must be formatted as YYYY-MM-DD".to_string())?;
        Ok(Self {
            description: description.to_string(),
            amount,
            date,
        })
    }
}

/// Odoo's answer once the `hr.expense` record exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSubmitResponse {
    pub message: String,
    #[serde(default, alias = "expense_id")]
    pub odoo_expense_id: Option<i32>,
    #[serde(default)]
    pub state: Option<String>,
}
