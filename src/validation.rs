//! Pre-submission field checks. A form that fails here never reaches the
//! backend.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CourseFormData, CourseSelection, RegistrationForm, StudentFormData};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("all fields are required (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("select a course to continue")]
    NoCourseSelected,
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

fn missing(fields: &[(&'static str, bool)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

/// Password checks run first so a mismatch is reported even on an otherwise
/// incomplete form.
pub fn validate_registration(form: &RegistrationForm) -> Result<(), ValidationError> {
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    missing(&[
        ("fullName", required(&form.full_name)),
        ("email", required(&form.email)),
    ])?;
    if !is_email(&form.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_course(form: &CourseFormData) -> Result<(), ValidationError> {
    missing(&[
        ("name", required(&form.name)),
        ("description", required(&form.description)),
        ("startDate", form.start_date.is_some()),
    ])
}

pub fn validate_student(form: &StudentFormData) -> Result<(), ValidationError> {
    missing(&[
        ("fullName", required(&form.full_name)),
        ("email", required(&form.email)),
        ("password", !form.password.is_empty()),
        ("programId", required(&form.program_id)),
    ])?;
    if !is_email(&form.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_selection(selection: &CourseSelection) -> Result<(), ValidationError> {
    if required(&selection.program_id) {
        Ok(())
    } else {
        Err(ValidationError::NoCourseSelected)
    }
}
