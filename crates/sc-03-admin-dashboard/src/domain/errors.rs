//! Admin action errors.

use sc_01_backend_client::BackendError;
use std::fmt;
use thiserror::Error;

/// Form input rejected before any backend request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// One request in a multi-step mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationStep {
    LookupRecord,
    CreateIdentity,
    UpdateMetadata,
    InsertRow,
    UpdateRow,
    UpdateStatus,
    ReplaceRoleLinks,
    UnlinkSupervisors,
    DeleteMilestones,
    ClearStudentAssignments,
    DeleteRow,
    DeleteIdentity,
}

impl fmt::Display for MutationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LookupRecord => "record lookup",
            Self::CreateIdentity => "identity creation",
            Self::UpdateMetadata => "profile update",
            Self::InsertRow => "record insert",
            Self::UpdateRow => "record update",
            Self::UpdateStatus => "status update",
            Self::ReplaceRoleLinks => "role assignment",
            Self::UnlinkSupervisors => "supervisor unlinking",
            Self::DeleteMilestones => "milestone removal",
            Self::ClearStudentAssignments => "student reassignment",
            Self::DeleteRow => "record delete",
            Self::DeleteIdentity => "identity delete",
        })
    }
}

/// A mutation stopped at `step`. Earlier steps are not rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} failed: {message}")]
pub struct MutationError {
    pub step: MutationStep,
    pub message: String,
}

impl MutationError {
    pub fn at(step: MutationStep) -> impl FnOnce(BackendError) -> Self {
        move |e| Self {
            step,
            message: e.to_string(),
        }
    }
}

/// Why a dashboard action did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Dashboard has not been initialized")]
    NotLoaded,

    #[error("Unknown record: {0}")]
    UnknownRecord(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_error_names_step() {
        let err = MutationError::at(MutationStep::InsertRow)(BackendError::request(
            "students",
            "duplicate key",
        ));
        assert_eq!(err.step, MutationStep::InsertRow);
        assert!(err.to_string().starts_with("record insert failed"));
    }
}
