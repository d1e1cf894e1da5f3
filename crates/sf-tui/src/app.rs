use sf_core::models::{SiteHealth, SiteListing};
use sf_core::services::lifecycle::slugify;

/// The active mode determines which UI is shown and how keys are dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    SiteList,
    CreateDialog,
    RenameDialog,
    ConfirmDialog {
        message: String,
        action: ConfirmAction,
    },
    HelpDialog,
    Loading(String),
}

/// What a confirmed dialog action should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteSite(String),
    Quit,
}

// ─── Forms ─────────────────────────────────────────────────────────────

/// Form state for the create-site dialog.
#[derive(Debug, Default)]
pub struct CreateSiteForm {
    pub name: String,
}

impl CreateSiteForm {
    /// The id the typed name would produce, or why it is rejected.
    pub fn preview(&self) -> Result<String, String> {
        slugify(&self.name).map_err(|e| e.to_string())
    }
}

/// Form state for the rename dialog.
#[derive(Debug, Default)]
pub struct RenameSiteForm {
    pub from: String,
    pub name: String,
}

impl RenameSiteForm {
    pub fn for_site(id: &str) -> Self {
        Self {
            from: id.to_string(),
            name: String::new(),
        }
    }

    pub fn preview(&self) -> Result<String, String> {
        let id = slugify(&self.name).map_err(|e| e.to_string())?;
        if id == self.from {
            return Err(format!("'{id}' is the current name"));
        }
        Ok(id)
    }
}

// ─── Main App State ────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
    pub mode: Mode,
    pub sites: Vec<SiteListing>,
    pub selected_index: usize,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub create_form: CreateSiteForm,
    pub rename_form: RenameSiteForm,
    /// Set while a list refresh is in flight so ticks don't pile up.
    pub refreshing: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            mode: Mode::SiteList,
            sites: Vec::new(),
            selected_index: 0,
            should_quit: false,
            status_message: None,
            create_form: CreateSiteForm::default(),
            rename_form: RenameSiteForm::default(),
            refreshing: false,
        }
    }

    pub fn selected_site(&self) -> Option<&SiteListing> {
        self.sites.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if !self.sites.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.sites.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.sites.is_empty() {
            if self.selected_index == 0 {
                self.selected_index = self.sites.len() - 1;
            } else {
                self.selected_index -= 1;
            }
        }
    }

    /// Replace the listing, keeping the selection on the same site id when it
    /// still exists.
    pub fn set_sites(&mut self, sites: Vec<SiteListing>) {
        let selected = self.selected_site().map(|s| s.record.id.clone());
        self.sites = sites;
        self.selected_index = selected
            .and_then(|id| self.sites.iter().position(|s| s.record.id == id))
            .unwrap_or(self.selected_index)
            .min(self.sites.len().saturating_sub(1));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Counts shown in the table title: (online, total).
    pub fn online_count(&self) -> (usize, usize) {
        let online = self
            .sites
            .iter()
            .filter(|s| s.health() == SiteHealth::Online)
            .count();
        (online, self.sites.len())
    }
}
