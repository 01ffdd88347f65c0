//! # Outbound Ports
//!
//! The browser-location side of the console. Guards and the bootstrapper
//! read the current location and issue redirects through [`Navigator`].

/// Where the console is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Scheme, host and port, e.g. `https://console.example`.
    pub origin: String,
    /// Path component, e.g. `/admin.html`.
    pub path: String,
    /// Query including the leading `?`, or empty.
    pub search: String,
}

impl Location {
    pub fn new(origin: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            search: String::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.path, self.search)
    }
}

/// Reads the current location and navigates away from it.
pub trait Navigator: Send + Sync {
    fn location(&self) -> Location;

    /// Leave the current page for `target` (path plus optional query).
    fn redirect(&self, target: &str);
}
