//! # Admin Service
//!
//! Organization-scoped reads and multi-step mutations behind the admin
//! dashboard. Every request is awaited in order. A failing step stops the
//! mutation and is reported as a [`MutationError`]; earlier steps stay
//! applied.
//!
//! ## Tables
//!
//! | Table | Used for |
//! |-------|----------|
//! | `supervisors`, `students` | list rows, status, assignment |
//! | `student_supervisors` | student counts, assignment links |
//! | `user_roles` | role links per organization |
//! | `roles`, `departments`, `program_templates` | lookups |
//! | `meetings` | overview count |

use crate::domain::forms::non_blank;
use crate::domain::{
    default_departments, progress_trend, status_distribution, ActionError, Department,
    LookupData, MutationError, MutationOutcome, MutationStep, NewStudent, NewSupervisor,
    OverviewStats, ProgramTemplate, ProgressChart, RoleOption, StatusChart, StudentDetails,
    StudentRow, StudentUpdate, SupervisorDetails, SupervisorOption, SupervisorRow,
    SupervisorUpdate, NOT_AVAILABLE, STATUS_ACTIVE, STATUS_NEEDS_ATTENTION, STUDENT_LIST_LIMIT,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sc_01_backend_client::{
    text_at, BackendClient, BackendError, Direction, Embed, NewIdentity, Query, Row,
};
use serde_json::{json, Value};
use shared_types::{Metadata, OrganizationId, RoleId, RoleKind, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SUPERVISORS: &str = "supervisors";
const STUDENTS: &str = "students";
const STUDENT_SUPERVISORS: &str = "student_supervisors";
const STUDENT_MILESTONES: &str = "student_milestones";
const USER_ROLES: &str = "user_roles";
const USERS: &str = "users";
const LAST_NAME: &str = "users.raw_user_meta_data.last_name";

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn users_embed() -> Embed {
    Embed::to_one("users", USERS, "user_id", "id")
}

/// Admin data access for one organization.
pub struct AdminService {
    client: Arc<dyn BackendClient>,
    org: OrganizationId,
}

impl AdminService {
    pub fn new(client: Arc<dyn BackendClient>, org: OrganizationId) -> Self {
        Self { client, org }
    }

    pub fn organization(&self) -> &OrganizationId {
        &self.org
    }

    fn scoped(&self, table: &str) -> Query {
        Query::from(table).eq("organization_id", &self.org)
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub async fn load_lookups(&self) -> Result<LookupData, BackendError> {
        let roles = self.client.select(&self.scoped("roles").select(&["id", "name"])).await?;
        let departments = self.departments().await;
        let templates = self
            .client
            .select(&self.scoped("program_templates").select(&[
                "id",
                "name",
                "description",
                "department_id",
                "duration_months",
            ]))
            .await?;
        let supervisors = self.supervisor_options().await?;

        Ok(LookupData {
            roles: RoleOption::parse_all(&roles),
            departments,
            program_templates: ProgramTemplate::parse_all(&templates),
            supervisors,
        })
    }

    async fn departments(&self) -> Vec<Department> {
        match self.client.select(&self.scoped("departments")).await {
            Ok(rows) if !rows.is_empty() => Department::parse_all(&rows),
            Ok(_) => default_departments(),
            Err(e) => {
                debug!(error = %e, "Using default departments");
                default_departments()
            }
        }
    }

    /// Active supervisors, sorted by display name.
    pub async fn supervisor_options(&self) -> Result<Vec<SupervisorOption>, BackendError> {
        let rows = self
            .client
            .select(
                &self
                    .scoped(SUPERVISORS)
                    .select(&["id", "user_id"])
                    .eq("status", STATUS_ACTIVE)
                    .embed(users_embed()),
            )
            .await?;
        Ok(SupervisorOption::parse_all(&rows))
    }

    // =========================================================================
    // OVERVIEW AND CHARTS
    // =========================================================================

    pub async fn overview_stats(&self, now: DateTime<Utc>) -> Result<OverviewStats, BackendError> {
        let supervisors = self.client.count(&self.scoped(SUPERVISORS)).await?;
        let students = self.client.count(&self.scoped(STUDENTS)).await?;
        let needs_attention = self
            .client
            .count(&self.scoped(STUDENTS).eq("status", STATUS_NEEDS_ATTENTION))
            .await?;
        let upcoming_meetings = self
            .client
            .count(
                &self
                    .scoped("meetings")
                    .gte("meeting_date", timestamp(now - Duration::days(1)))
                    .lte("meeting_date", timestamp(now + Duration::days(7))),
            )
            .await?;
        Ok(OverviewStats {
            supervisors,
            students,
            needs_attention,
            upcoming_meetings,
        })
    }

    pub async fn status_chart(&self) -> Result<StatusChart, BackendError> {
        let rows = self
            .client
            .select(&self.scoped(STUDENTS).select(&["status"]))
            .await?;
        Ok(status_distribution(&rows))
    }

    pub async fn progress_chart(&self) -> Result<ProgressChart, BackendError> {
        let rows = self
            .client
            .select(
                &self
                    .scoped(STUDENTS)
                    .select(&["progress", "updated_at"])
                    .order_by("updated_at", Direction::Descending)
                    .limit(100),
            )
            .await?;
        Ok(progress_trend(&rows))
    }

    // =========================================================================
    // LISTS
    // =========================================================================

    /// Supervisors ordered by last name, with student counts when available.
    pub async fn list_supervisors(
        &self,
        lookups: &LookupData,
    ) -> Result<Vec<SupervisorRow>, BackendError> {
        let rows = self
            .client
            .select(
                &self
                    .scoped(SUPERVISORS)
                    .embed(users_embed())
                    .embed(Embed::to_one("departments", "departments", "department_id", "id"))
                    .order_by(LAST_NAME, Direction::Ascending),
            )
            .await?;
        let supervisors: Vec<SupervisorRow> = rows
            .iter()
            .filter_map(|row| SupervisorRow::from_row(row, lookups))
            .collect();
        let ids: Vec<&str> = supervisors.iter().map(|s| s.id.as_str()).collect();
        let counts = self.student_counts(&ids).await;

        Ok(supervisors
            .into_iter()
            .map(|mut supervisor| {
                supervisor.student_count = counts
                    .as_ref()
                    .map(|c| c.get(&supervisor.id).copied().unwrap_or(0));
                supervisor
            })
            .collect())
    }

    /// Link counts for the given supervisors only.
    async fn student_counts(&self, supervisor_ids: &[&str]) -> Option<HashMap<String, u64>> {
        if supervisor_ids.is_empty() {
            return Some(HashMap::new());
        }
        let links = match self
            .client
            .select(
                &Query::from(STUDENT_SUPERVISORS)
                    .select(&["supervisor_id"])
                    .in_("supervisor_id", supervisor_ids.iter().copied()),
            )
            .await
        {
            Ok(links) => links,
            Err(e) => {
                warn!(error = %e, "Student counts unavailable");
                return None;
            }
        };
        let mut counts = HashMap::new();
        for link in &links {
            if let Some(id) = text_at(link, "supervisor_id") {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        Some(counts)
    }

    /// First students by last name, with display joins resolved.
    pub async fn list_students(
        &self,
        lookups: &LookupData,
    ) -> Result<Vec<StudentRow>, BackendError> {
        let rows = self
            .client
            .select(
                &self
                    .scoped(STUDENTS)
                    .embed(users_embed())
                    .embed(Embed::to_one("programs", "programs", "program_id", "id"))
                    .embed(Embed::to_one("departments", "departments", "department_id", "id"))
                    .order_by(LAST_NAME, Direction::Ascending)
                    .limit(STUDENT_LIST_LIMIT),
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| StudentRow::from_row(row, lookups))
            .collect())
    }

    // =========================================================================
    // SHARED MUTATION STEPS
    // =========================================================================

    async fn user_of(&self, table: &str, id: &str) -> Result<(UserId, Row), MutationError> {
        let row = self
            .client
            .select_single(&self.scoped(table).eq("id", id))
            .await
            .map_err(MutationError::at(MutationStep::LookupRecord))?;
        let user_id = text_at(&row, "user_id").ok_or_else(|| MutationError {
            step: MutationStep::LookupRecord,
            message: format!("{table} record {id} has no user"),
        })?;
        Ok((UserId::new(user_id), row))
    }

    fn user_roles_of(&self, user_id: &UserId) -> Query {
        Query::from(USER_ROLES)
            .eq("user_id", user_id)
            .eq("organization_id", &self.org)
    }

    async fn insert_role_links(
        &self,
        user_id: &UserId,
        role_ids: &[RoleId],
    ) -> Result<(), BackendError> {
        if role_ids.is_empty() {
            return Ok(());
        }
        let rows = role_ids
            .iter()
            .map(|role_id| {
                object(json!({
                    "user_id": user_id,
                    "role_id": role_id,
                    "organization_id": &self.org,
                }))
            })
            .collect();
        self.client.insert(USER_ROLES, rows).await.map(|_| ())
    }

    async fn remove_role_links(&self, user_id: &UserId, outcome: &mut MutationOutcome) {
        if let Err(e) = self.client.delete(&self.user_roles_of(user_id)).await {
            warn!(user_id = %user_id, error = %e, "Role links not removed");
            outcome.warn(format!("Role links were not removed: {e}"));
        }
    }

    async fn delete_identity(&self, user_id: &UserId) -> Result<(), MutationError> {
        match self.client.delete_user(user_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_user_not_found() => {
                debug!(user_id = %user_id, "Identity already gone");
                Ok(())
            }
            Err(e) => Err(MutationError::at(MutationStep::DeleteIdentity)(e)),
        }
    }

    async fn set_status(&self, table: &str, id: &str, status: &str) -> Result<(), MutationError> {
        let patch = object(json!({
            "status": status,
            "updated_at": timestamp(Utc::now()),
        }));
        self.client
            .update(&self.scoped(table).eq("id", id), patch)
            .await
            .map_err(MutationError::at(MutationStep::UpdateStatus))?;
        info!(table, id, status, "Status changed");
        Ok(())
    }

    // =========================================================================
    // SUPERVISORS
    // =========================================================================

    pub async fn supervisor_for_edit(&self, id: &str) -> Result<SupervisorDetails, BackendError> {
        let row = self
            .client
            .select_single(&self.scoped(SUPERVISORS).eq("id", id).embed(users_embed()))
            .await?;
        let user_id = UserId::new(text_at(&row, "user_id").unwrap_or_default());
        let role_ids = self
            .client
            .select(&self.user_roles_of(&user_id).select(&["role_id"]))
            .await?
            .iter()
            .filter_map(|r| text_at(r, "role_id").map(RoleId::new))
            .collect();
        SupervisorDetails::from_row(&row, role_ids).ok_or_else(|| BackendError::NotFound {
            what: format!("supervisor {id}"),
        })
    }

    pub async fn create_supervisor(
        &self,
        form: &NewSupervisor,
    ) -> Result<MutationOutcome, ActionError> {
        form.validate()?;
        let mut outcome = MutationOutcome::default();
        let faculty_id = non_blank(&form.faculty_id);

        let mut metadata = Metadata::new();
        metadata.insert("full_name".into(), json!(form.full_name.trim()));
        metadata.insert("faculty_id".into(), json!(faculty_id));
        metadata.insert("organization_id".into(), json!(&self.org));
        let user = self
            .client
            .create_user(NewIdentity {
                email: form.email.trim().to_string(),
                password: form.password.clone(),
                email_confirmed: true,
                metadata,
            })
            .await
            .map_err(MutationError::at(MutationStep::CreateIdentity))?;

        let now = timestamp(Utc::now());
        self.client
            .insert(
                SUPERVISORS,
                vec![object(json!({
                    "user_id": &user.id,
                    "organization_id": &self.org,
                    "department_id": non_blank(&form.department_id),
                    "faculty_id": faculty_id,
                    "status": STATUS_ACTIVE,
                    "created_at": now,
                    "updated_at": now,
                }))],
            )
            .await
            .map_err(MutationError::at(MutationStep::InsertRow))?;

        if let Err(e) = self.insert_role_links(&user.id, &form.role_ids).await {
            warn!(user_id = %user.id, error = %e, "Supervisor created without role links");
            outcome.warn(format!("Supervisor created, but roles were not assigned: {e}"));
        }
        info!(user_id = %user.id, "Supervisor created");
        Ok(outcome)
    }

    pub async fn update_supervisor(
        &self,
        id: &str,
        form: &SupervisorUpdate,
    ) -> Result<(), MutationError> {
        let (user_id, _) = self.user_of(SUPERVISORS, id).await?;
        let faculty_id = non_blank(&form.faculty_id);

        let mut metadata = Metadata::new();
        if !form.full_name.trim().is_empty() {
            metadata.insert("full_name".into(), json!(form.full_name.trim()));
        }
        if let Some(faculty) = &faculty_id {
            metadata.insert("faculty_id".into(), json!(faculty));
        }
        if !metadata.is_empty() {
            self.client
                .update_user_metadata(&user_id, metadata)
                .await
                .map_err(MutationError::at(MutationStep::UpdateMetadata))?;
        }

        let patch = object(json!({
            "department_id": non_blank(&form.department_id),
            "faculty_id": faculty_id,
            "status": non_blank(&form.status).unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            "updated_at": timestamp(Utc::now()),
        }));
        self.client
            .update(&self.scoped(SUPERVISORS).eq("id", id), patch)
            .await
            .map_err(MutationError::at(MutationStep::UpdateRow))?;

        if !form.role_ids.is_empty() {
            self.client
                .delete(&self.user_roles_of(&user_id))
                .await
                .map_err(MutationError::at(MutationStep::ReplaceRoleLinks))?;
            self.insert_role_links(&user_id, &form.role_ids)
                .await
                .map_err(MutationError::at(MutationStep::ReplaceRoleLinks))?;
        }
        info!(supervisor_id = id, "Supervisor updated");
        Ok(())
    }

    pub async fn set_supervisor_status(&self, id: &str, status: &str) -> Result<(), MutationError> {
        self.set_status(SUPERVISORS, id, status).await
    }

    /// Unlink students, clear assignments, then remove the record, its role
    /// links and its identity.
    pub async fn delete_supervisor(&self, id: &str) -> Result<MutationOutcome, MutationError> {
        let mut outcome = MutationOutcome::default();
        let (user_id, _) = self.user_of(SUPERVISORS, id).await?;

        self.client
            .delete(&Query::from(STUDENT_SUPERVISORS).eq("supervisor_id", id))
            .await
            .map_err(MutationError::at(MutationStep::UnlinkSupervisors))?;
        self.client
            .update(
                &self.scoped(STUDENTS).eq("supervisor_id", id),
                object(json!({"supervisor_id": null})),
            )
            .await
            .map_err(MutationError::at(MutationStep::ClearStudentAssignments))?;
        self.client
            .delete(&self.scoped(SUPERVISORS).eq("id", id))
            .await
            .map_err(MutationError::at(MutationStep::DeleteRow))?;
        self.remove_role_links(&user_id, &mut outcome).await;
        self.delete_identity(&user_id).await?;

        info!(supervisor_id = id, "Supervisor deleted");
        Ok(outcome)
    }

    // =========================================================================
    // STUDENTS
    // =========================================================================

    pub async fn student_for_edit(&self, id: &str) -> Result<StudentDetails, BackendError> {
        let row = self
            .client
            .select_single(&self.scoped(STUDENTS).eq("id", id).embed(users_embed()))
            .await?;
        let linked = self
            .client
            .select(
                &Query::from(STUDENT_SUPERVISORS)
                    .select(&["supervisor_id"])
                    .eq("student_id", id)
                    .limit(1),
            )
            .await
            .unwrap_or_else(|e| {
                debug!(error = %e, "Falling back to direct supervisor assignment");
                Vec::new()
            })
            .first()
            .and_then(|link| text_at(link, "supervisor_id"));
        StudentDetails::from_row(&row, linked).ok_or_else(|| BackendError::NotFound {
            what: format!("student {id}"),
        })
    }

    fn program_name(&self, lookups: &LookupData, template_id: Option<&str>) -> Option<String> {
        template_id
            .and_then(|t| lookups.template(t))
            .map(|t| t.name.clone())
    }

    pub async fn create_student(
        &self,
        form: &NewStudent,
        lookups: &LookupData,
    ) -> Result<MutationOutcome, ActionError> {
        form.validate()?;
        let mut outcome = MutationOutcome::default();
        let department_id = non_blank(&form.department_id);
        let template_id = non_blank(&form.program_template_id);

        let mut metadata = Metadata::new();
        metadata.insert("full_name".into(), json!(form.full_name.trim()));
        metadata.insert("student_id_number".into(), json!(form.student_number.trim()));
        metadata.insert("department_id".into(), json!(department_id));
        metadata.insert("organization_id".into(), json!(&self.org));
        let user = self
            .client
            .create_user(NewIdentity {
                email: form.email.trim().to_string(),
                password: form.password.clone(),
                email_confirmed: true,
                metadata,
            })
            .await
            .map_err(MutationError::at(MutationStep::CreateIdentity))?;

        let now = timestamp(Utc::now());
        let program_name = self
            .program_name(lookups, template_id.as_deref())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        self.client
            .insert(
                STUDENTS,
                vec![object(json!({
                    "user_id": &user.id,
                    "organization_id": &self.org,
                    "student_id": form.student_number.trim(),
                    "department_id": department_id,
                    "program_template_id": template_id,
                    "program_name": program_name,
                    "enrollment_date": non_blank(&form.enrollment_date),
                    "supervisor_id": non_blank(&form.supervisor_id),
                    "status": STATUS_ACTIVE,
                    "created_at": now,
                    "updated_at": now,
                }))],
            )
            .await
            .map_err(MutationError::at(MutationStep::InsertRow))?;

        let student_role = lookups
            .roles
            .iter()
            .find(|r| RoleKind::Student.matches(&r.name))
            .map(|r| r.id.clone());
        match student_role {
            Some(role_id) => {
                if let Err(e) = self.insert_role_links(&user.id, &[role_id]).await {
                    warn!(user_id = %user.id, error = %e, "Student created without role link");
                    outcome.warn(format!("Student created, but the student role was not assigned: {e}"));
                }
            }
            None => {
                warn!(org = %self.org, "No student role in organization");
                outcome.warn("Student created, but no student role exists in this organization");
            }
        }
        info!(user_id = %user.id, "Student created");
        Ok(outcome)
    }

    pub async fn update_student(
        &self,
        id: &str,
        form: &StudentUpdate,
        lookups: &LookupData,
    ) -> Result<(), ActionError> {
        form.validate()?;
        let (user_id, existing) = self.user_of(STUDENTS, id).await?;
        let department_id = non_blank(&form.department_id);
        let template_id = non_blank(&form.program_template_id);

        let mut metadata = Metadata::new();
        metadata.insert("full_name".into(), json!(form.full_name.trim()));
        metadata.insert("student_id_number".into(), json!(form.student_number.trim()));
        metadata.insert("department_id".into(), json!(department_id));
        self.client
            .update_user_metadata(&user_id, metadata)
            .await
            .map_err(MutationError::at(MutationStep::UpdateMetadata))?;

        let program_name = self
            .program_name(lookups, template_id.as_deref())
            .or_else(|| text_at(&existing, "program_name"));
        let patch = object(json!({
            "student_id": form.student_number.trim(),
            "department_id": department_id,
            "program_template_id": template_id,
            "program_name": program_name,
            "enrollment_date": non_blank(&form.enrollment_date),
            "status": non_blank(&form.status).unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            "supervisor_id": non_blank(&form.supervisor_id),
            "updated_at": timestamp(Utc::now()),
        }));
        self.client
            .update(&self.scoped(STUDENTS).eq("id", id), patch)
            .await
            .map_err(MutationError::at(MutationStep::UpdateRow))?;
        info!(student_id = id, "Student updated");
        Ok(())
    }

    pub async fn set_student_status(&self, id: &str, status: &str) -> Result<(), MutationError> {
        self.set_status(STUDENTS, id, status).await
    }

    /// Unlink supervisors and milestones, then remove the record, its role
    /// links and its identity.
    pub async fn delete_student(&self, id: &str) -> Result<MutationOutcome, MutationError> {
        let mut outcome = MutationOutcome::default();
        let (user_id, _) = self.user_of(STUDENTS, id).await?;

        self.client
            .delete(&Query::from(STUDENT_SUPERVISORS).eq("student_id", id))
            .await
            .map_err(MutationError::at(MutationStep::UnlinkSupervisors))?;
        match self
            .client
            .delete(&Query::from(STUDENT_MILESTONES).eq("student_id", id))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_missing_relation() => debug!("No milestones table"),
            Err(e) => return Err(MutationError::at(MutationStep::DeleteMilestones)(e)),
        }
        self.client
            .delete(&self.scoped(STUDENTS).eq("id", id))
            .await
            .map_err(MutationError::at(MutationStep::DeleteRow))?;
        self.remove_role_links(&user_id, &mut outcome).await;
        self.delete_identity(&user_id).await?;

        info!(student_id = id, "Student deleted");
        Ok(outcome)
    }
}
