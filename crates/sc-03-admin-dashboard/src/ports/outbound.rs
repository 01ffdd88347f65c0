//! # Admin View Port
//!
//! Everything the admin dashboard draws goes through [`AdminView`]. The
//! controller checks the required [`ElementId`]s once, when it is built.

use crate::domain::{
    LookupData, OverviewStats, PageModel, ProgressChart, StatusChart, StudentDetails, StudentRow,
    SupervisorDetails, SupervisorRow,
};
use shared_bus::NotificationLevel;

/// Page elements the admin dashboard renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    OverviewPanel,
    SupervisorTable,
    SupervisorPagination,
    StudentTable,
    StudentPagination,
    SupervisorForm,
    StudentForm,
    StatusChart,
    ProgressChart,
}

impl ElementId {
    /// Elements without which the dashboard cannot start.
    pub const REQUIRED: [ElementId; 5] = [
        Self::OverviewPanel,
        Self::SupervisorTable,
        Self::StudentTable,
        Self::SupervisorForm,
        Self::StudentForm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverviewPanel => "admin-overview",
            Self::SupervisorTable => "supervisors-table-body",
            Self::SupervisorPagination => "supervisors-pagination",
            Self::StudentTable => "students-table-body",
            Self::StudentPagination => "students-pagination",
            Self::SupervisorForm => "supervisor-form",
            Self::StudentForm => "student-form",
            Self::StatusChart => "student-status-chart",
            Self::ProgressChart => "progress-trends-chart",
        }
    }
}

/// Rendering surface of the admin page.
pub trait AdminView: Send + Sync {
    fn has_element(&self, element: ElementId) -> bool;

    fn show_loading(&self, loading: bool);

    fn render_lookups(&self, lookups: &LookupData);

    fn render_overview(&self, stats: &OverviewStats);

    fn render_supervisors(&self, rows: &[SupervisorRow], page: &PageModel);

    fn render_students(&self, rows: &[StudentRow], page: &PageModel);

    fn render_status_chart(&self, chart: &StatusChart);

    fn render_progress_chart(&self, chart: &ProgressChart);

    fn fill_supervisor_form(&self, details: &SupervisorDetails);

    fn fill_student_form(&self, details: &StudentDetails);

    /// Ask the operator to confirm. `false` cancels the action.
    fn confirm(&self, message: &str) -> bool;

    /// Transient message.
    fn notify(&self, level: NotificationLevel, message: &str);
}
