//! Guard redirect targets.

use shared_types::RoleKind;
use url::form_urlencoded::byte_serialize;

/// Append `key=value` to `base`, percent-encoding the value.
pub fn append_query(base: &str, key: &str, value: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    let encoded: String = byte_serialize(value.as_bytes()).collect();
    format!("{base}{separator}{key}={encoded}")
}

/// Login page carrying the page to return to.
pub fn login_redirect(login_path: &str, return_to: &str) -> String {
    append_query(login_path, "redirect", return_to)
}

/// Unauthorized page naming the roles that would have granted access.
pub fn unauthorized_redirect(unauthorized_path: &str, required: &[RoleKind]) -> String {
    let names: Vec<&str> = required.iter().map(RoleKind::as_str).collect();
    append_query(unauthorized_path, "requiredRole", &names.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_path_and_query() {
        assert_eq!(
            login_redirect("/login.html", "/admin.html"),
            "/login.html?redirect=%2Fadmin.html"
        );
        assert_eq!(
            login_redirect("/login.html", "/student.html?tab=2"),
            "/login.html?redirect=%2Fstudent.html%3Ftab%3D2"
        );
    }

    #[test]
    fn test_unauthorized_uses_existing_query() {
        assert_eq!(
            unauthorized_redirect(
                "/login.html?error=unauthorized",
                &[RoleKind::Admin, RoleKind::Committee]
            ),
            "/login.html?error=unauthorized&requiredRole=admin%2Ccommittee"
        );
        assert_eq!(
            unauthorized_redirect("/denied.html", &[RoleKind::Marker]),
            "/denied.html?requiredRole=marker"
        );
    }
}
