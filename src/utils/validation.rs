use validator::{Validate, ValidationError};

use crate::errors::AppError;
use crate::utils::datetime::parse_hire_datetime;

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate()
        .map_err(|err| AppError::BadRequest(err.to_string()))
}

pub fn validate_hire_datetime(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("hire datetime cannot be empty"));
    }
    parse_hire_datetime(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("hire datetime must be ISO-8601"))
}
