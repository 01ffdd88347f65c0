//! Form payloads submitted from the admin views.

use crate::domain::errors::ValidationError;
use shared_types::RoleId;

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn email(value: &str) -> Result<(), ValidationError> {
    required(value, "Email")?;
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidEmail(trimmed.to_string())),
    }
}

/// Blank optional input becomes `None`.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSupervisor {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub faculty_id: Option<String>,
    pub department_id: Option<String>,
    pub role_ids: Vec<RoleId>,
}

impl NewSupervisor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required(&self.full_name, "Full name")?;
        email(&self.email)?;
        required(&self.password, "Password")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorUpdate {
    pub full_name: String,
    pub faculty_id: Option<String>,
    pub department_id: Option<String>,
    /// Defaults to active.
    pub status: Option<String>,
    /// Replaces the supervisor's role links when non-empty.
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub student_number: String,
    pub department_id: Option<String>,
    pub program_template_id: Option<String>,
    pub enrollment_date: Option<String>,
    pub supervisor_id: Option<String>,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required(&self.full_name, "Full name")?;
        email(&self.email)?;
        required(&self.password, "Password")?;
        required(&self.student_number, "Student ID number")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentUpdate {
    pub full_name: String,
    pub student_number: String,
    pub department_id: Option<String>,
    pub program_template_id: Option<String>,
    pub enrollment_date: Option<String>,
    /// Defaults to active.
    pub status: Option<String>,
    pub supervisor_id: Option<String>,
}

impl StudentUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required(&self.full_name, "Full name")?;
        required(&self.student_number, "Student ID number")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_supervisor_requires_fields() {
        let mut form = NewSupervisor {
            full_name: "Dr Reed".into(),
            email: "reed@uni.example".into(),
            password: "pw".into(),
            ..NewSupervisor::default()
        };
        assert!(form.validate().is_ok());

        form.password = " ".into();
        assert_eq!(form.validate(), Err(ValidationError::Required("Password")));

        form.email = "not-an-email".into();
        assert!(matches!(form.validate(), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_student_forms() {
        let update = StudentUpdate {
            full_name: "Ana Diaz".into(),
            ..StudentUpdate::default()
        };
        assert_eq!(
            update.validate(),
            Err(ValidationError::Required("Student ID number"))
        );

        let new = NewStudent {
            full_name: "Ana Diaz".into(),
            email: "ana@uni.example".into(),
            password: "pw".into(),
            student_number: "S-1".into(),
            ..NewStudent::default()
        };
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" 3 ".into())), Some("3".into()));
    }
}
