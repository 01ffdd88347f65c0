//! Admin view that keeps the last rendered frame of every element.

use crate::domain::{
    LookupData, OverviewStats, PageModel, ProgressChart, StatusChart, StudentDetails, StudentRow,
    SupervisorDetails, SupervisorRow,
};
use crate::ports::{AdminView, ElementId};
use parking_lot::RwLock;
use shared_bus::NotificationLevel;
use std::collections::HashSet;
use tracing::debug;

#[derive(Default)]
struct Frame {
    loading: bool,
    lookups: Option<LookupData>,
    overview: Option<OverviewStats>,
    supervisors: Vec<SupervisorRow>,
    supervisor_page: Option<PageModel>,
    students: Vec<StudentRow>,
    student_page: Option<PageModel>,
    status_chart: Option<StatusChart>,
    progress_chart: Option<ProgressChart>,
    supervisor_form: Option<SupervisorDetails>,
    student_form: Option<StudentDetails>,
    confirmations: Vec<String>,
    notifications: Vec<(NotificationLevel, String)>,
}

/// In-memory [`AdminView`]. Confirmations are answered with a preset reply.
pub struct RecordingAdminView {
    missing: HashSet<ElementId>,
    confirm_answer: RwLock<bool>,
    frame: RwLock<Frame>,
}

impl Default for RecordingAdminView {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAdminView {
    /// Every element present; confirmations accepted.
    pub fn new() -> Self {
        Self::without(&[])
    }

    /// A page lacking `missing` elements.
    pub fn without(missing: &[ElementId]) -> Self {
        Self {
            missing: missing.iter().copied().collect(),
            confirm_answer: RwLock::new(true),
            frame: RwLock::new(Frame::default()),
        }
    }

    pub fn answer_confirm(&self, answer: bool) {
        *self.confirm_answer.write() = answer;
    }

    pub fn is_loading(&self) -> bool {
        self.frame.read().loading
    }

    pub fn lookups(&self) -> Option<LookupData> {
        self.frame.read().lookups.clone()
    }

    pub fn overview(&self) -> Option<OverviewStats> {
        self.frame.read().overview
    }

    pub fn supervisor_rows(&self) -> Vec<SupervisorRow> {
        self.frame.read().supervisors.clone()
    }

    pub fn supervisor_pagination(&self) -> Option<PageModel> {
        self.frame.read().supervisor_page.clone()
    }

    pub fn student_rows(&self) -> Vec<StudentRow> {
        self.frame.read().students.clone()
    }

    pub fn student_pagination(&self) -> Option<PageModel> {
        self.frame.read().student_page.clone()
    }

    pub fn status_chart(&self) -> Option<StatusChart> {
        self.frame.read().status_chart.clone()
    }

    pub fn progress_chart(&self) -> Option<ProgressChart> {
        self.frame.read().progress_chart.clone()
    }

    pub fn supervisor_form(&self) -> Option<SupervisorDetails> {
        self.frame.read().supervisor_form.clone()
    }

    pub fn student_form(&self) -> Option<StudentDetails> {
        self.frame.read().student_form.clone()
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.frame.read().confirmations.clone()
    }

    pub fn notifications(&self) -> Vec<(NotificationLevel, String)> {
        self.frame.read().notifications.clone()
    }
}

impl AdminView for RecordingAdminView {
    fn has_element(&self, element: ElementId) -> bool {
        !self.missing.contains(&element)
    }

    fn show_loading(&self, loading: bool) {
        self.frame.write().loading = loading;
    }

    fn render_lookups(&self, lookups: &LookupData) {
        self.frame.write().lookups = Some(lookups.clone());
    }

    fn render_overview(&self, stats: &OverviewStats) {
        self.frame.write().overview = Some(*stats);
    }

    fn render_supervisors(&self, rows: &[SupervisorRow], page: &PageModel) {
        let mut frame = self.frame.write();
        frame.supervisors = rows.to_vec();
        frame.supervisor_page = Some(page.clone());
    }

    fn render_students(&self, rows: &[StudentRow], page: &PageModel) {
        let mut frame = self.frame.write();
        frame.students = rows.to_vec();
        frame.student_page = Some(page.clone());
    }

    fn render_status_chart(&self, chart: &StatusChart) {
        self.frame.write().status_chart = Some(chart.clone());
    }

    fn render_progress_chart(&self, chart: &ProgressChart) {
        self.frame.write().progress_chart = Some(chart.clone());
    }

    fn fill_supervisor_form(&self, details: &SupervisorDetails) {
        self.frame.write().supervisor_form = Some(details.clone());
    }

    fn fill_student_form(&self, details: &StudentDetails) {
        self.frame.write().student_form = Some(details.clone());
    }

    fn confirm(&self, message: &str) -> bool {
        self.frame.write().confirmations.push(message.to_string());
        *self.confirm_answer.read()
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        debug!(?level, message, "Notification");
        self.frame
            .write()
            .notifications
            .push((level, message.to_string()));
    }
}
