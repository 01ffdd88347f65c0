//! # Admin View Models
//!
//! Typed rows built from backend records. Each `from_row` tolerates missing
//! joins and falls back to placeholder text the way the tables display it.

use sc_01_backend_client::{lookup_path, text_at, Row};
use serde::Serialize;
use serde_json::Value;
use shared_types::{display_name_from, Metadata, RoleId, UserId};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NOT_ASSIGNED: &str = "Not assigned";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_SUSPENDED: &str = "suspended";
pub const STATUS_NEEDS_ATTENTION: &str = "needs_attention";

/// Cap on the student list.
pub const STUDENT_LIST_LIMIT: usize = 50;

fn metadata_at(row: &Row, path: &str) -> Metadata {
    lookup_path(row, path)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Status an active record toggles to, and back.
pub fn toggled_status(current: &str) -> &'static str {
    if current == STATUS_ACTIVE {
        STATUS_SUSPENDED
    } else {
        STATUS_ACTIVE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Department {
    pub id: String,
    pub name: String,
}

impl Department {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: text_at(row, "id")?,
            name: text_at(row, "name")?,
        })
    }

    pub fn parse_all(rows: &[Row]) -> Vec<Self> {
        rows.iter().filter_map(Self::from_row).collect()
    }
}

/// Reference list used when the organization has no departments of its own.
pub fn default_departments() -> Vec<Department> {
    [
        ("1", "Computer Science"),
        ("2", "Engineering"),
        ("3", "Business"),
        ("4", "Arts & Humanities"),
        ("5", "Sciences"),
    ]
    .into_iter()
    .map(|(id, name)| Department {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOption {
    pub id: RoleId,
    pub name: String,
}

impl RoleOption {
    pub fn parse_all(rows: &[Row]) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| {
                Some(Self {
                    id: RoleId::new(text_at(row, "id")?),
                    name: text_at(row, "name").unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramTemplate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub department_id: Option<String>,
    pub duration_months: Option<u64>,
}

impl ProgramTemplate {
    pub fn parse_all(rows: &[Row]) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| {
                Some(Self {
                    id: text_at(row, "id")?,
                    name: text_at(row, "name").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    description: text_at(row, "description"),
                    department_id: text_at(row, "department_id"),
                    duration_months: row.get("duration_months").and_then(Value::as_u64),
                })
            })
            .collect()
    }
}

/// An active supervisor offered in assignment selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorOption {
    pub id: String,
    pub user_id: String,
    pub name: String,
}

impl SupervisorOption {
    /// Parse and sort by name.
    pub fn parse_all(rows: &[Row]) -> Vec<Self> {
        let mut options: Vec<Self> = rows
            .iter()
            .filter_map(|row| {
                let id = text_at(row, "id")?;
                let user_id = text_at(row, "user_id").unwrap_or_default();
                let name = display_name_from(&metadata_at(row, "users.raw_user_meta_data"))
                    .unwrap_or_else(|| format!("User ID: {user_id}"));
                Some(Self { id, user_id, name })
            })
            .collect();
        options.sort_by(|a, b| a.name.cmp(&b.name));
        options
    }
}

/// Reference data loaded once per activation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupData {
    pub roles: Vec<RoleOption>,
    pub departments: Vec<Department>,
    pub program_templates: Vec<ProgramTemplate>,
    pub supervisors: Vec<SupervisorOption>,
}

impl LookupData {
    pub fn department_name(&self, id: &str) -> Option<&str> {
        self.departments
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.as_str())
    }

    pub fn supervisor_name(&self, id: &str) -> Option<&str> {
        self.supervisors
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    pub fn template(&self, id: &str) -> Option<&ProgramTemplate> {
        self.program_templates.iter().find(|t| t.id == id)
    }
}

/// Headline counts for the organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverviewStats {
    pub supervisors: u64,
    pub students: u64,
    pub needs_attention: u64,
    /// Meetings from one day ago to seven days ahead.
    pub upcoming_meetings: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorRow {
    pub id: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub faculty_id: String,
    pub department: String,
    pub status: String,
    /// `None` when the link table could not be counted.
    pub student_count: Option<u64>,
}

impl SupervisorRow {
    pub fn from_row(row: &Row, lookups: &LookupData) -> Option<Self> {
        let email = text_at(row, "users.email");
        let name = display_name_from(&metadata_at(row, "users.raw_user_meta_data"))
            .or_else(|| email.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let department = text_at(row, "departments.name")
            .or_else(|| {
                text_at(row, "department_id")
                    .and_then(|id| lookups.department_name(&id).map(str::to_string))
            })
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Some(Self {
            id: text_at(row, "id")?,
            user_id: UserId::new(text_at(row, "user_id").unwrap_or_default()),
            name,
            email: email.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            faculty_id: text_at(row, "faculty_id").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            department,
            status: text_at(row, "status").unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            student_count: None,
        })
    }

    pub fn student_count_label(&self) -> String {
        self.student_count
            .map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string())
    }

    /// Case-insensitive match on name, email, faculty id or department.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || [&self.name, &self.email, &self.faculty_id, &self.department]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRow {
    pub id: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub student_number: String,
    pub department: String,
    pub program: String,
    pub supervisor_name: String,
    pub enrollment_date: Option<String>,
    pub expected_completion_date: Option<String>,
    pub status: String,
}

impl StudentRow {
    pub fn from_row(row: &Row, lookups: &LookupData) -> Option<Self> {
        let metadata = metadata_at(row, "users.raw_user_meta_data");
        let email = text_at(row, "users.email");
        let name = display_name_from(&metadata)
            .or_else(|| email.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let student_number = text_at(row, "student_id")
            .or_else(|| {
                metadata
                    .get("student_id_number")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let department = text_at(row, "departments.name")
            .or_else(|| {
                text_at(row, "department_id")
                    .and_then(|id| lookups.department_name(&id).map(str::to_string))
            })
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let program = text_at(row, "programs.name")
            .or_else(|| text_at(row, "program_name"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let supervisor_name = text_at(row, "supervisor_id")
            .and_then(|id| lookups.supervisor_name(&id).map(str::to_string))
            .unwrap_or_else(|| NOT_ASSIGNED.to_string());

        Some(Self {
            id: text_at(row, "id")?,
            user_id: UserId::new(text_at(row, "user_id").unwrap_or_default()),
            name,
            email: email.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            student_number,
            department,
            program,
            supervisor_name,
            enrollment_date: text_at(row, "enrollment_date"),
            expected_completion_date: text_at(row, "expected_completion_date"),
            status: text_at(row, "status").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
    }

    /// `2024-09-01 to 2027-08-31`, with `N/A` for missing ends.
    pub fn enrollment_window(&self) -> String {
        let day = |d: &Option<String>| {
            d.as_deref()
                .map(|s| s.split('T').next().unwrap_or(s).to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        format!(
            "{} to {}",
            day(&self.enrollment_date),
            day(&self.expected_completion_date)
        )
    }

    /// Case-insensitive match on name, email, student number or program.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || [&self.name, &self.email, &self.student_number, &self.program]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A supervisor opened for editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorDetails {
    pub id: String,
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub faculty_id: Option<String>,
    pub department_id: Option<String>,
    pub status: String,
    pub role_ids: Vec<RoleId>,
}

impl SupervisorDetails {
    pub fn from_row(row: &Row, role_ids: Vec<RoleId>) -> Option<Self> {
        let metadata = metadata_at(row, "users.raw_user_meta_data");
        Some(Self {
            id: text_at(row, "id")?,
            user_id: UserId::new(text_at(row, "user_id")?),
            full_name: display_name_from(&metadata).unwrap_or_default(),
            email: text_at(row, "users.email").unwrap_or_default(),
            faculty_id: text_at(row, "faculty_id"),
            department_id: text_at(row, "department_id"),
            status: text_at(row, "status").unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            role_ids,
        })
    }
}

/// A student opened for editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentDetails {
    pub id: String,
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub student_number: String,
    pub department_id: Option<String>,
    pub program_template_id: Option<String>,
    pub enrollment_date: Option<String>,
    pub status: String,
    pub supervisor_id: Option<String>,
}

impl StudentDetails {
    pub fn from_row(row: &Row, linked_supervisor: Option<String>) -> Option<Self> {
        let metadata = metadata_at(row, "users.raw_user_meta_data");
        let student_number = text_at(row, "student_id")
            .or_else(|| {
                metadata
                    .get("student_id_number")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_default();
        Some(Self {
            id: text_at(row, "id")?,
            user_id: UserId::new(text_at(row, "user_id")?),
            full_name: display_name_from(&metadata).unwrap_or_default(),
            email: text_at(row, "users.email").unwrap_or_default(),
            student_number,
            department_id: text_at(row, "department_id"),
            program_template_id: text_at(row, "program_template_id"),
            enrollment_date: text_at(row, "enrollment_date")
                .map(|d| d.split('T').next().unwrap_or(&d).to_string()),
            status: text_at(row, "status").unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            supervisor_id: linked_supervisor.or_else(|| text_at(row, "supervisor_id")),
        })
    }
}

/// Non-fatal problems met while completing a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    pub warnings: Vec<String>,
}

impl MutationOutcome {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_supervisor_row_fallbacks() {
        let lookups = LookupData {
            departments: default_departments(),
            ..LookupData::default()
        };
        let parsed = SupervisorRow::from_row(
            &row(json!({
                "id": 4,
                "user_id": "u4",
                "department_id": "2",
                "users": {"email": "s@uni.example", "raw_user_meta_data": {}}
            })),
            &lookups,
        )
        .unwrap();
        assert_eq!(parsed.name, "s@uni.example");
        assert_eq!(parsed.department, "Engineering");
        assert_eq!(parsed.faculty_id, NOT_AVAILABLE);
        assert_eq!(parsed.student_count_label(), NOT_AVAILABLE);
    }

    #[test]
    fn test_student_row_joins() {
        let lookups = LookupData {
            supervisors: vec![SupervisorOption {
                id: "9".into(),
                user_id: "u9".into(),
                name: "Dr Reed".into(),
            }],
            ..LookupData::default()
        };
        let parsed = StudentRow::from_row(
            &row(json!({
                "id": 1,
                "user_id": "u1",
                "supervisor_id": 9,
                "program_name": "PhD Physics",
                "enrollment_date": "2024-09-01T00:00:00Z",
                "status": "active",
                "users": {"email": "x@uni.example", "raw_user_meta_data": {"first_name": "Ana", "last_name": "Diaz", "student_id_number": "S-77"}}
            })),
            &lookups,
        )
        .unwrap();
        assert_eq!(parsed.name, "Ana Diaz");
        assert_eq!(parsed.student_number, "S-77");
        assert_eq!(parsed.supervisor_name, "Dr Reed");
        assert_eq!(parsed.program, "PhD Physics");
        assert_eq!(parsed.enrollment_window(), "2024-09-01 to N/A");
        assert!(parsed.matches("diaz"));
        assert!(!parsed.matches("chemistry"));
    }

    #[test]
    fn test_unassigned_student() {
        let parsed = StudentRow::from_row(&row(json!({"id": 2})), &LookupData::default()).unwrap();
        assert_eq!(parsed.supervisor_name, NOT_ASSIGNED);
        assert_eq!(parsed.name, NOT_AVAILABLE);
    }

    #[test]
    fn test_supervisor_options_sorted_with_fallback_name() {
        let options = SupervisorOption::parse_all(&[
            row(json!({"id": 1, "user_id": "zz", "users": {"raw_user_meta_data": {"full_name": "Zoe Hart"}}})),
            row(json!({"id": 2, "user_id": "ab"})),
            row(json!({"id": 3, "user_id": "cd", "users": {"raw_user_meta_data": {"full_name": "Ben Ode"}}})),
        ]);
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Ben Ode", "User ID: ab", "Zoe Hart"]);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(toggled_status("active"), "suspended");
        assert_eq!(toggled_status("suspended"), "active");
        assert_eq!(toggled_status("needs_attention"), "active");
    }
}
