use crate::server::response::ApiError;

const MAX_USERNAME_LEN: usize = 64;
const MAX_BILL_NAME_LEN: usize = 100;
const MAX_PASSWORD_LEN: usize = 512;

fn is_valid_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

pub fn validate_username(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::bad_request("Username cannot be empty"));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if !name.chars().all(is_valid_username_char) {
        return Err(ApiError::bad_request(
            "Username can only contain alphanumeric characters, hyphens, and underscores",
        ));
    }
    if name.starts_with('-') || name.starts_with('_') {
        return Err(ApiError::bad_request(
            "Username cannot start with a hyphen or underscore",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password cannot exceed {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_bill_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Bill name cannot be empty"));
    }
    if name.len() > MAX_BILL_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Bill name cannot exceed {MAX_BILL_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::bad_request(
            "Amount must be a non-negative number",
        ));
    }
    Ok(())
}

/// Due and payroll days are 1-indexed days of the month.
pub fn validate_day_of_month(day: i32) -> Result<(), ApiError> {
    if !(1..=31).contains(&day) {
        return Err(ApiError::bad_request("Day must be between 1 and 31"));
    }
    Ok(())
}

/// Override months are 0-indexed, matching the stored wire format.
pub fn validate_month(month: i32) -> Result<(), ApiError> {
    if !(0..=11).contains(&month) {
        return Err(ApiError::bad_request("Month must be between 0 and 11"));
    }
    Ok(())
}
