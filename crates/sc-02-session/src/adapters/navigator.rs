//! Navigator that records redirects instead of performing them.

use crate::ports::{Location, Navigator};
use parking_lot::RwLock;
use tracing::info;

/// Holds a location and a redirect log. A redirect also moves the location,
/// so later reads see the page the console navigated to.
pub struct RecordingNavigator {
    location: RwLock<Location>,
    redirects: RwLock<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(location: Location) -> Self {
        Self {
            location: RwLock::new(location),
            redirects: RwLock::new(Vec::new()),
        }
    }

    pub fn at(origin: &str, path_and_query: &str) -> Self {
        let (path, search) = match path_and_query.find('?') {
            Some(i) => path_and_query.split_at(i),
            None => (path_and_query, ""),
        };
        Self::new(Location::new(origin, path).with_search(search))
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().clone()
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.redirects.read().last().cloned()
    }

    /// Move without recording, as a user following a link would.
    pub fn visit(&self, path_and_query: &str) {
        let origin = self.location.read().origin.clone();
        *self.location.write() = Self::at(&origin, path_and_query).location();
    }
}

impl Navigator for RecordingNavigator {
    fn location(&self) -> Location {
        self.location.read().clone()
    }

    fn redirect(&self, target: &str) {
        info!(target, "Redirecting");
        self.redirects.write().push(target.to_string());
        self.visit(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_moves_location() {
        let nav = RecordingNavigator::at("https://c.example", "/admin.html");
        assert_eq!(nav.location().path, "/admin.html");

        nav.redirect("/login.html?redirect=%2Fadmin.html");
        let location = nav.location();
        assert_eq!(location.path, "/login.html");
        assert_eq!(location.search, "?redirect=%2Fadmin.html");
        assert_eq!(nav.redirects().len(), 1);
    }
}
