use crate::error::AppError;
use crate::models::user::MIN_PASSWORD_LEN;
use bcrypt::{hash, verify};

const BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// A malformed stored hash counts as a mismatch rather than a server error.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    match verify(password, hashed_password) {
        Ok(matches) => Ok(matches),
        Err(bcrypt::BcryptError::InvalidHash(_)) | Err(bcrypt::BcryptError::InvalidPrefix(_)) => {
            log::warn!("Stored password hash is malformed");
            Ok(false)
        }
        Err(e) => Err(AppError::InternalServerError(format!(
            "Failed to verify password: {}",
            e
        ))),
    }
}

/// Rejects passwords set by admins or through a reset that are too short.
pub fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
