use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A SaaS account as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub tenant_id: i32,
    /// The `hr.employee` id in the tenant's Odoo, once the account is linked.
    pub odoo_employee_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The profile shown on the employee's "My profile" page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub email: String,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub is_admin: bool,
    pub odoo_employee_id: Option<i32>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            job_title: user.job_title.clone(),
            phone: user.phone.clone(),
            address: None,
            department: None,
            is_admin: user.is_admin,
            odoo_employee_id: user.odoo_employee_id,
        }
    }
}

/// The `hr.employee` fields the connector returns for a single employee.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OdooEmployee {
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
}

impl UserProfile {
    /// Odoo values win where present; SaaS values fill the gaps.
    pub fn merge_odoo(mut self, employee: OdooEmployee) -> Self {
        if employee.name.is_some() {
            self.full_name = employee.name;
        }
        if employee.job_title.is_some() {
            self.job_title = employee.job_title;
        }
        if let Some(phone) = employee.work_phone.or(employee.mobile_phone) {
            self.phone = Some(phone);
        }
        self.address = employee.address;
        self.department = employee.department;
        self
    }
}

/// Row shape of the admin user list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserListItem {
    pub id: i32,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub tenant_id: i32,
    pub odoo_employee_id: Option<i32>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
}

impl From<User> for AdminUserListItem {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_admin: user.is_admin,
            is_active: user.is_active,
            tenant_id: user.tenant_id,
            odoo_employee_id: user.odoo_employee_id,
            job_title: user.job_title,
            phone: user.phone,
        }
    }
}

/// Payload of `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUserCreate {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    pub tenant_id: i32,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub odoo_employee_id: Option<i32>,
    #[validate(length(max = 200))]
    pub job_title: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Distinguishes "field absent" (`None`) from "explicitly null" (`Some(None)`).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Payload of `PUT /admin/user/{id}`. Only the fields present in the body change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminUserUpdate {
    #[validate(email)]
    pub email: Option<String>,
    pub password: Option<String>,
    pub tenant_id: Option<i32>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub odoo_employee_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phone: Option<Option<String>>,
}

impl AdminUserUpdate {
    /// Applies the provided fields to `user`. The password is handled by the caller.
    pub fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(tenant_id) = self.tenant_id {
            user.tenant_id = tenant_id;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(odoo_employee_id) = self.odoo_employee_id {
            user.odoo_employee_id = odoo_employee_id;
        }
        if let Some(job_title) = &self.job_title {
            user.job_title = job_title.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = phone.clone();
        }
    }

    /// Password supplied in the update, ignoring empty strings.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// Minimum length for passwords set by admins or through a reset.
pub const MIN_PASSWORD_LEN: usize = 8;

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: 7,
        email: "jane@acme.test".into(),
        hashed_password: "$2b$12$invalid".into(),
        full_name: Some("Jane Doe".into()),
        job_title: Some("Engineer".into()),
        phone: Some("555-0100".into()),
        is_active: true,
        is_admin: false,
        tenant_id: 1,
        odoo_employee_id: Some(42),
        created_at: Utc::now(),
        updated_at: None,
    }
}
