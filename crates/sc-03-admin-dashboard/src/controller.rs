//! # Admin Dashboard Controller
//!
//! Activates the admin page for an authenticated admin and drives every
//! operator action afterwards. Loaded lists are kept so search and paging
//! re-render without touching the backend.

use crate::domain::{
    toggled_status, ActionError, LookupData, MutationOutcome, NewStudent, NewSupervisor,
    PageModel, StudentDetails, StudentRow, StudentUpdate, SupervisorDetails, SupervisorRow,
    SupervisorUpdate, PAGE_SIZE, STATUS_ACTIVE,
};
use crate::ports::{AdminView, ElementId};
use crate::service::AdminService;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sc_01_backend_client::{BackendError, ClientAccessor};
use sc_02_session::SessionManager;
use shared_bus::{EventPublisher, NotificationLevel, SystemEvent};
use shared_types::{DashboardController, DashboardInitError, PageKind, RoleKind, Session};
use std::sync::Arc;
use tracing::{info, warn};

const PAGE: PageKind = PageKind::AdminDashboard;

/// Loaded page data plus the operator's list filters.
struct AdminState {
    service: Arc<AdminService>,
    lookups: LookupData,
    supervisors: Vec<SupervisorRow>,
    students: Vec<StudentRow>,
    supervisor_search: String,
    student_search: String,
    supervisor_page: usize,
    student_page: usize,
}

/// Which loaded list an action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lists {
    Supervisors,
    Students,
    Both,
}

/// Controller for the admin dashboard page.
pub struct AdminDashboard {
    sessions: SessionManager,
    accessor: ClientAccessor,
    bus: Arc<dyn EventPublisher>,
    view: Arc<dyn AdminView>,
    bindings: Result<(), DashboardInitError>,
    state: Mutex<Option<AdminState>>,
}

impl AdminDashboard {
    /// Bind to `view`. Missing required elements are reported on activation.
    pub fn new(
        sessions: SessionManager,
        accessor: ClientAccessor,
        bus: Arc<dyn EventPublisher>,
        view: Arc<dyn AdminView>,
    ) -> Self {
        let bindings = match ElementId::REQUIRED
            .iter()
            .find(|element| !view.has_element(**element))
        {
            Some(element) => Err(DashboardInitError::MissingBinding {
                element: element.as_str().to_string(),
            }),
            None => Ok(()),
        };
        Self {
            sessions,
            accessor,
            bus,
            view,
            bindings,
            state: Mutex::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn lookups(&self) -> Option<LookupData> {
        self.state.lock().as_ref().map(|s| s.lookups.clone())
    }

    pub fn supervisors(&self) -> Vec<SupervisorRow> {
        self.state
            .lock()
            .as_ref()
            .map(|s| s.supervisors.clone())
            .unwrap_or_default()
    }

    pub fn students(&self) -> Vec<StudentRow> {
        self.state
            .lock()
            .as_ref()
            .map(|s| s.students.clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    fn data_error(&self, what: &str, message: String) -> DashboardInitError {
        warn!(what, error = %message, "Admin data load failed");
        self.bus.publish(SystemEvent::DashboardDataError {
            page: PAGE,
            message: message.clone(),
        });
        DashboardInitError::Data {
            what: what.to_string(),
            message,
        }
    }

    async fn load(&self, service: Arc<AdminService>) -> Result<(), DashboardInitError> {
        let lookups = service
            .load_lookups()
            .await
            .map_err(|e| self.data_error("lookup data", e.to_string()))?;
        self.view.render_lookups(&lookups);

        match service.overview_stats(Utc::now()).await {
            Ok(stats) => self.view.render_overview(&stats),
            Err(e) => warn!(error = %e, "Overview counts unavailable"),
        }

        let supervisors = service
            .list_supervisors(&lookups)
            .await
            .map_err(|e| self.data_error("supervisors", e.to_string()))?;
        let students = service
            .list_students(&lookups)
            .await
            .map_err(|e| self.data_error("students", e.to_string()))?;
        let counts = (supervisors.len(), students.len());

        *self.state.lock() = Some(AdminState {
            service: service.clone(),
            lookups,
            supervisors,
            students,
            supervisor_search: String::new(),
            student_search: String::new(),
            supervisor_page: 1,
            student_page: 1,
        });
        self.render_lists(Lists::Both);
        self.render_charts(&service).await;

        self.bus.publish(SystemEvent::AdminDataLoaded {
            supervisors: counts.0,
            students: counts.1,
        });
        Ok(())
    }

    async fn render_charts(&self, service: &AdminService) {
        if self.view.has_element(ElementId::StatusChart) {
            match service.status_chart().await {
                Ok(chart) => self.view.render_status_chart(&chart),
                Err(e) => warn!(error = %e, "Status chart unavailable"),
            }
        }
        if self.view.has_element(ElementId::ProgressChart) {
            match service.progress_chart().await {
                Ok(chart) => self.view.render_progress_chart(&chart),
                Err(e) => warn!(error = %e, "Progress chart unavailable"),
            }
        }
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    fn render_lists(&self, lists: Lists) {
        if lists != Lists::Students {
            if let Some((rows, page)) = self.supervisor_page() {
                self.view.render_supervisors(&rows, &page);
            }
        }
        if lists != Lists::Supervisors {
            if let Some((rows, page)) = self.student_page() {
                self.view.render_students(&rows, &page);
            }
        }
    }

    /// Filtered rows on the current supervisor page.
    pub fn supervisor_page(&self) -> Option<(Vec<SupervisorRow>, PageModel)> {
        let mut guard = self.state.lock();
        let state = guard.as_mut()?;
        let filtered: Vec<&SupervisorRow> = state
            .supervisors
            .iter()
            .filter(|row| row.matches(&state.supervisor_search))
            .collect();
        let page = PageModel::new(state.supervisor_page, filtered.len(), PAGE_SIZE);
        let rows = filtered[page.range(PAGE_SIZE)]
            .iter()
            .map(|row| (*row).clone())
            .collect();
        state.supervisor_page = page.current;
        Some((rows, page))
    }

    /// Filtered rows on the current student page.
    pub fn student_page(&self) -> Option<(Vec<StudentRow>, PageModel)> {
        let mut guard = self.state.lock();
        let state = guard.as_mut()?;
        let filtered: Vec<&StudentRow> = state
            .students
            .iter()
            .filter(|row| row.matches(&state.student_search))
            .collect();
        let page = PageModel::new(state.student_page, filtered.len(), PAGE_SIZE);
        let rows = filtered[page.range(PAGE_SIZE)]
            .iter()
            .map(|row| (*row).clone())
            .collect();
        state.student_page = page.current;
        Some((rows, page))
    }

    pub fn search_supervisors(&self, needle: &str) {
        if let Some(state) = self.state.lock().as_mut() {
            state.supervisor_search = needle.to_string();
            state.supervisor_page = 1;
        }
        self.render_lists(Lists::Supervisors);
    }

    pub fn search_students(&self, needle: &str) {
        if let Some(state) = self.state.lock().as_mut() {
            state.student_search = needle.to_string();
            state.student_page = 1;
        }
        self.render_lists(Lists::Students);
    }

    pub fn go_to_supervisor_page(&self, page: usize) {
        if let Some(state) = self.state.lock().as_mut() {
            state.supervisor_page = page;
        }
        self.render_lists(Lists::Supervisors);
    }

    pub fn go_to_student_page(&self, page: usize) {
        if let Some(state) = self.state.lock().as_mut() {
            state.student_page = page;
        }
        self.render_lists(Lists::Students);
    }

    // =========================================================================
    // ACTION PLUMBING
    // =========================================================================

    fn loaded(&self) -> Result<(Arc<AdminService>, LookupData), ActionError> {
        self.state
            .lock()
            .as_ref()
            .map(|s| (s.service.clone(), s.lookups.clone()))
            .ok_or(ActionError::NotLoaded)
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        self.view.notify(level, message);
        self.bus.publish(SystemEvent::NotificationShown {
            level,
            message: message.to_string(),
        });
    }

    /// Surface a failed action to the operator and hand it back.
    fn report<T>(&self, result: Result<T, ActionError>) -> Result<T, ActionError> {
        if let Err(e) = &result {
            warn!(error = %e, "Admin action failed");
            self.notify(NotificationLevel::Error, &e.to_string());
        }
        result
    }

    fn succeed(&self, message: &str, outcome: &MutationOutcome) {
        self.notify(NotificationLevel::Success, message);
        for warning in &outcome.warnings {
            self.notify(NotificationLevel::Warning, warning);
        }
    }

    async fn refetch(&self, lists: Lists) {
        let Ok((service, mut lookups)) = self.loaded() else {
            return;
        };
        if let Err(e) = self.refetch_with(&service, &mut lookups, lists).await {
            warn!(error = %e, "List refresh failed");
            self.notify(NotificationLevel::Warning, &format!("Could not refresh the list: {e}"));
        }
        self.render_lists(lists);
    }

    async fn refetch_with(
        &self,
        service: &AdminService,
        lookups: &mut LookupData,
        lists: Lists,
    ) -> Result<(), BackendError> {
        if lists != Lists::Students {
            lookups.supervisors = service.supervisor_options().await?;
            let rows = service.list_supervisors(lookups).await?;
            if let Some(state) = self.state.lock().as_mut() {
                state.lookups.supervisors = lookups.supervisors.clone();
                state.supervisors = rows;
            }
            self.view.render_lookups(lookups);
        }
        if lists != Lists::Supervisors {
            let rows = service.list_students(lookups).await?;
            if let Some(state) = self.state.lock().as_mut() {
                state.students = rows;
            }
        }
        Ok(())
    }

    fn status_of(&self, lists: Lists, id: &str) -> Result<String, ActionError> {
        let guard = self.state.lock();
        let state = guard.as_ref().ok_or(ActionError::NotLoaded)?;
        let status = match lists {
            Lists::Students => state.students.iter().find(|r| r.id == id).map(|r| &r.status),
            _ => state.supervisors.iter().find(|r| r.id == id).map(|r| &r.status),
        };
        status
            .cloned()
            .ok_or_else(|| ActionError::UnknownRecord(id.to_string()))
    }

    // =========================================================================
    // SUPERVISOR ACTIONS
    // =========================================================================

    pub async fn open_supervisor(&self, id: &str) -> Result<SupervisorDetails, ActionError> {
        let (service, _) = self.report(self.loaded())?;
        let result = service.supervisor_for_edit(id).await.map_err(ActionError::from);
        let details = self.report(result)?;
        self.view.fill_supervisor_form(&details);
        Ok(details)
    }

    pub async fn create_supervisor(
        &self,
        form: &NewSupervisor,
    ) -> Result<MutationOutcome, ActionError> {
        let (service, _) = self.report(self.loaded())?;
        let result = service.create_supervisor(form).await;
        let outcome = self.report(result)?;
        self.succeed("Supervisor created successfully.", &outcome);
        self.refetch(Lists::Supervisors).await;
        Ok(outcome)
    }

    pub async fn save_supervisor(&self, id: &str, form: &SupervisorUpdate) -> Result<(), ActionError> {
        let (service, _) = self.report(self.loaded())?;
        let result = service.update_supervisor(id, form).await.map_err(ActionError::from);
        self.report(result)?;
        self.succeed("Supervisor updated successfully.", &MutationOutcome::default());
        self.refetch(Lists::Supervisors).await;
        Ok(())
    }

    /// Flip between active and suspended after confirmation. `Ok(false)`
    /// means the operator cancelled.
    pub async fn toggle_supervisor_status(&self, id: &str) -> Result<bool, ActionError> {
        let current = self.report(self.status_of(Lists::Supervisors, id))?;
        let next = toggled_status(&current);
        let (verb, done) = status_words(next);
        if !self
            .view
            .confirm(&format!("Are you sure you want to {verb} this supervisor?"))
        {
            return Ok(false);
        }
        let (service, _) = self.report(self.loaded())?;
        let result = service.set_supervisor_status(id, next).await.map_err(ActionError::from);
        self.report(result)?;
        self.succeed(
            &format!("Supervisor {done} successfully."),
            &MutationOutcome::default(),
        );
        self.refetch(Lists::Supervisors).await;
        Ok(true)
    }

    pub async fn delete_supervisor(&self, id: &str) -> Result<bool, ActionError> {
        if !self.view.confirm(
            "Are you sure you want to delete this supervisor? Their students will be unassigned.",
        ) {
            return Ok(false);
        }
        let (service, _) = self.report(self.loaded())?;
        let result = service.delete_supervisor(id).await.map_err(ActionError::from);
        let outcome = self.report(result)?;
        self.succeed("Supervisor deleted successfully.", &outcome);
        self.refetch(Lists::Both).await;
        Ok(true)
    }

    // =========================================================================
    // STUDENT ACTIONS
    // =========================================================================

    pub async fn open_student(&self, id: &str) -> Result<StudentDetails, ActionError> {
        let (service, _) = self.report(self.loaded())?;
        let result = service.student_for_edit(id).await.map_err(ActionError::from);
        let details = self.report(result)?;
        self.view.fill_student_form(&details);
        Ok(details)
    }

    pub async fn create_student(&self, form: &NewStudent) -> Result<MutationOutcome, ActionError> {
        let (service, lookups) = self.report(self.loaded())?;
        let result = service.create_student(form, &lookups).await;
        let outcome = self.report(result)?;
        self.succeed("Student created successfully.", &outcome);
        self.refetch(Lists::Students).await;
        Ok(outcome)
    }

    pub async fn save_student(&self, id: &str, form: &StudentUpdate) -> Result<(), ActionError> {
        let (service, lookups) = self.report(self.loaded())?;
        let result = service.update_student(id, form, &lookups).await;
        self.report(result)?;
        self.succeed("Student updated successfully.", &MutationOutcome::default());
        self.refetch(Lists::Students).await;
        Ok(())
    }

    pub async fn toggle_student_status(&self, id: &str) -> Result<bool, ActionError> {
        let current = self.report(self.status_of(Lists::Students, id))?;
        let next = toggled_status(&current);
        let (verb, done) = status_words(next);
        if !self
            .view
            .confirm(&format!("Are you sure you want to {verb} this student?"))
        {
            return Ok(false);
        }
        let (service, _) = self.report(self.loaded())?;
        let result = service.set_student_status(id, next).await.map_err(ActionError::from);
        self.report(result)?;
        self.succeed(
            &format!("Student {done} successfully."),
            &MutationOutcome::default(),
        );
        self.refetch(Lists::Students).await;
        Ok(true)
    }

    pub async fn delete_student(&self, id: &str) -> Result<bool, ActionError> {
        if !self
            .view
            .confirm("Are you sure you want to delete this student? This cannot be undone.")
        {
            return Ok(false);
        }
        let (service, _) = self.report(self.loaded())?;
        let result = service.delete_student(id).await.map_err(ActionError::from);
        let outcome = self.report(result)?;
        self.succeed("Student deleted successfully.", &outcome);
        self.refetch(Lists::Students).await;
        Ok(true)
    }
}

fn status_words(next: &str) -> (&'static str, &'static str) {
    if next == STATUS_ACTIVE {
        ("activate", "activated")
    } else {
        ("suspend", "suspended")
    }
}

#[async_trait]
impl DashboardController for AdminDashboard {
    fn page(&self) -> PageKind {
        PAGE
    }

    async fn initialize(&self, session: Arc<Session>) -> Result<(), DashboardInitError> {
        self.bindings.clone()?;
        if !self.sessions.require_role(&[RoleKind::Admin], None).await {
            return Err(DashboardInitError::Unauthorized {
                required: RoleKind::Admin,
            });
        }
        let org = session
            .active_organization()
            .map(|o| o.id.clone())
            .ok_or(DashboardInitError::NoOrganization)?;

        let client = self
            .accessor
            .acquire()
            .await
            .map_err(|e| self.data_error("backend client", e.to_string()))?;

        self.bus.publish(SystemEvent::DashboardDataLoading { page: PAGE });
        self.view.show_loading(true);
        let loaded = self.load(Arc::new(AdminService::new(client, org.clone()))).await;
        self.view.show_loading(false);
        loaded?;

        self.bus.publish(SystemEvent::DashboardDataLoaded { page: PAGE });
        info!(org = %org, "Admin dashboard loaded");
        Ok(())
    }
}
