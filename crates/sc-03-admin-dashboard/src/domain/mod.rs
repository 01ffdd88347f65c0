//! Admin dashboard domain.

pub mod charts;
pub mod errors;
pub mod format;
pub mod forms;
pub mod models;
pub mod pagination;

pub use charts::{progress_trend, status_distribution, ProgressChart, ProgressPoint, StatusChart};
pub use errors::{ActionError, MutationError, MutationStep, ValidationError};
pub use format::{capitalize, format_roles, status_label};
pub use forms::{NewStudent, NewSupervisor, StudentUpdate, SupervisorUpdate};
pub use models::*;
pub use pagination::{PageItem, PageModel, MAX_VISIBLE_PAGES, PAGE_SIZE};
