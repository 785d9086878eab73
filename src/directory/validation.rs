//! Structural validation of directory inputs.
//!
//! Each validator either returns a normalised, fully-populated value or the
//! complete list of field defects found, never just the first one.

use regex::Regex;
use std::sync::OnceLock;

use crate::auth::responses::{LoginRequest, RegisterRequest};
use crate::models::{AddMemberRequest, CreateOrganisationRequest, FieldError};

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganisation {
    pub name: String,
    pub description: Option<String>,
}

fn required_text(
    value: Option<&str>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

/// Passwords are kept byte-for-byte; only emptiness is checked.
fn required_password(value: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        Some(password) if !password.is_empty() => Some(password.to_string()),
        _ => {
            errors.push(FieldError::new("password", "password is required"));
            None
        }
    }
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn email(value: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    let email = required_text(value, "email", errors)?;
    if email_regex().is_match(&email) {
        Some(email)
    } else {
        errors.push(FieldError::new("email", "email must be a valid email address"));
        None
    }
}

pub fn validate_registration(request: &RegisterRequest) -> Result<Registration, Vec<FieldError>> {
    let mut errors = Vec::new();
    let first_name = required_text(request.first_name.as_deref(), "firstName", &mut errors);
    let last_name = required_text(request.last_name.as_deref(), "lastName", &mut errors);
    let email = email(request.email.as_deref(), &mut errors);
    let password = required_password(request.password.as_deref(), &mut errors);
    let phone = optional_text(request.phone.as_deref());

    match (first_name, last_name, email, password) {
        (Some(first_name), Some(last_name), Some(email), Some(password)) => {
            Ok(Registration {
                first_name,
                last_name,
                email,
                password,
                phone,
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_login(request: &LoginRequest) -> Result<Credentials, Vec<FieldError>> {
    let mut errors = Vec::new();
    let email = required_text(request.email.as_deref(), "email", &mut errors);
    let password = required_password(request.password.as_deref(), &mut errors);

    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials { email, password }),
        _ => Err(errors),
    }
}

pub fn validate_new_organisation(
    request: &CreateOrganisationRequest,
) -> Result<NewOrganisation, Vec<FieldError>> {
    let mut errors = Vec::new();
    match required_text(request.name.as_deref(), "name", &mut errors) {
        Some(name) => Ok(NewOrganisation {
            name,
            description: optional_text(request.description.as_deref()),
        }),
        None => Err(errors),
    }
}

/// Only presence is checked here. An id that does not parse names no user, so
/// it is resolved after the organisation and membership checks.
pub fn validate_add_member(request: &AddMemberRequest) -> Result<String, Vec<FieldError>> {
    let mut errors = Vec::new();
    required_text(request.user_id.as_deref(), "userId", &mut errors).ok_or(errors)
}
