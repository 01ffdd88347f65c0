//! # Core Domain Entities
//!
//! Identity and authorization entities shared across the console.
//!
//! ## Clusters
//!
//! - **Identifiers**: `UserId`, `OrganizationId`, `RoleId`
//! - **Identity**: `UserIdentity`, `AuthSession`
//! - **Authorization**: `Role`, `RoleKind`, `Organization`, `Session`

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Free-form metadata bag attached to identities and rows.
pub type Metadata = Map<String, Value>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Declares a string identifier that also accepts numeric JSON keys, since
/// backend tables mix integer and UUID primary keys.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&$name> for Value {
            fn from(id: &$name) -> Self {
                Value::String(id.0.clone())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match Value::deserialize(deserializer)? {
                    Value::String(s) => Ok(Self(s)),
                    Value::Number(n) => Ok(Self(n.to_string())),
                    other => Err(D::Error::custom(format!(
                        "invalid {}: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

string_id!(
    /// Identity-provider user identifier.
    UserId
);
string_id!(
    /// Organization (tenant) identifier.
    OrganizationId
);
string_id!(
    /// Role record identifier.
    RoleId
);

// =============================================================================
// IDENTITY
// =============================================================================

/// A user identity as issued by the identity provider.
///
/// Treated as a value type: the console never mutates it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "raw_user_meta_data", alias = "user_metadata")]
    pub metadata: Metadata,
}

impl UserIdentity {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Display name from metadata, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name_from(&self.metadata).unwrap_or_else(|| self.email.clone())
    }
}

/// Build "first last" (or `full_name`) from an identity metadata bag.
#[must_use]
pub fn display_name_from(metadata: &Metadata) -> Option<String> {
    let text = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let first = text("first_name").or_else(|| text("full_name")).unwrap_or("");
    let last = text("last_name").unwrap_or("");
    let name = format!("{first} {last}").trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// An authenticated session as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserIdentity,
    #[serde(default)]
    pub access_token: String,
}

impl AuthSession {
    pub fn for_user(user: UserIdentity) -> Self {
        Self {
            user,
            access_token: String::new(),
        }
    }
}

/// Kinds of identity-provider session-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthChangeKind {
    /// Notifications that carry (or restore) a live session.
    #[must_use]
    pub fn refreshes_session(&self) -> bool {
        !matches!(self, Self::SignedOut)
    }
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// The closed set of roles the console routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Admin,
    Student,
    Supervisor,
    Committee,
    Marker,
}

impl RoleKind {
    /// All roles in default-dashboard priority order.
    pub const PRIORITY: [RoleKind; 5] = [
        Self::Admin,
        Self::Student,
        Self::Supervisor,
        Self::Committee,
        Self::Marker,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
            Self::Supervisor => "supervisor",
            Self::Committee => "committee",
            Self::Marker => "marker",
        }
    }

    /// Case-insensitive match against a stored role name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for role names outside [`RoleKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for RoleKind {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PRIORITY
            .into_iter()
            .find(|kind| kind.matches(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A role record scoped to an organization membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The routed role this record names, if any.
    #[must_use]
    pub fn kind(&self) -> Option<RoleKind> {
        self.name.parse().ok()
    }
}

/// An organization the user belongs to, with the roles held in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    roles: Vec<Role>,
}

impl Organization {
    pub fn new(id: impl Into<OrganizationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Builder form of [`Organization::add_role`].
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.add_role(role);
        self
    }

    /// Add a role unless one with the same id is already present.
    ///
    /// Returns `true` when the role was added.
    pub fn add_role(&mut self, role: Role) -> bool {
        if self.roles.iter().any(|r| r.id == role.id) {
            return false;
        }
        self.roles.push(role);
        true
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: RoleKind) -> bool {
        self.roles.iter().any(|r| role.matches(&r.name))
    }
}

/// The current identity plus its organizations and aggregated roles.
///
/// INVARIANT: `roles` is the id-deduplicated union of the roles of
/// `organizations`. Fields are private; every constructor recomputes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    user: Option<UserIdentity>,
    organizations: Vec<Organization>,
    roles: Vec<Role>,
}

impl Session {
    /// The signed-out session.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A session for `user` holding `organizations`.
    #[must_use]
    pub fn signed_in(user: UserIdentity, organizations: Vec<Organization>) -> Self {
        let mut roles: Vec<Role> = Vec::new();
        for role in organizations.iter().flat_map(Organization::roles) {
            if !roles.iter().any(|r| r.id == role.id) {
                roles.push(role.clone());
            }
        }
        Self {
            user: Some(user),
            organizations,
            roles,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    /// The designated active organization (the first membership).
    #[must_use]
    pub fn active_organization(&self) -> Option<&Organization> {
        self.organizations.first()
    }

    /// Aggregated roles across all organizations.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Role held in `org_id`, or in the active organization when `None`.
    #[must_use]
    pub fn has_role(&self, role: RoleKind, org_id: Option<&OrganizationId>) -> bool {
        let target = match org_id {
            Some(id) => self.organizations.iter().find(|o| &o.id == id),
            None => self.active_organization(),
        };
        target.is_some_and(|org| org.has_role(role))
    }

    /// Role held in any organization.
    #[must_use]
    pub fn has_any_role(&self, role: RoleKind) -> bool {
        self.roles.iter().any(|r| role.matches(&r.name))
    }

    /// True if any of `roles` is held (OR semantics).
    #[must_use]
    pub fn has_any_of(&self, roles: &[RoleKind]) -> bool {
        roles.iter().any(|role| self.has_any_role(*role))
    }

    /// First routed role in priority order.
    #[must_use]
    pub fn primary_role(&self) -> Option<RoleKind> {
        RoleKind::PRIORITY
            .into_iter()
            .find(|role| self.has_any_role(*role))
    }

    #[must_use]
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn org(id: &str, roles: &[(&str, &str)]) -> Organization {
        roles.iter().fold(Organization::new(id, id), |org, (rid, name)| {
            org.with_role(Role::new(*rid, *name))
        })
    }

    #[test]
    fn test_roles_are_union_of_organizations() {
        let session = Session::signed_in(
            UserIdentity::new("u1", "a@b.c"),
            vec![
                org("o1", &[("1", "admin"), ("2", "supervisor")]),
                org("o2", &[("2", "supervisor"), ("3", "marker")]),
            ],
        );
        let ids: Vec<&str> = session.roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_organization_dedups_roles_by_id() {
        let mut org = Organization::new("o1", "Uni");
        assert!(org.add_role(Role::new("1", "admin")));
        assert!(!org.add_role(Role::new("1", "admin")));
        assert_eq!(org.roles().len(), 1);
    }

    #[test]
    fn test_has_any_role_case_insensitive() {
        let session = Session::signed_in(
            UserIdentity::new("u1", "a@b.c"),
            vec![org("o1", &[("1", "ADMIN")])],
        );
        assert!(session.has_any_role(RoleKind::Admin));
        assert!(!session.has_any_role(RoleKind::Student));
    }

    #[test]
    fn test_empty_session_has_no_roles() {
        let session = Session::empty();
        assert!(!session.is_authenticated());
        assert!(!session.has_any_role(RoleKind::Admin));
        assert!(!session.has_role(RoleKind::Admin, None));
        assert_eq!(session.primary_role(), None);
    }

    #[test]
    fn test_has_role_scoped_to_organization() {
        let session = Session::signed_in(
            UserIdentity::new("u1", "a@b.c"),
            vec![org("o1", &[("2", "student")]), org("o2", &[("1", "admin")])],
        );
        // Active organization is the first membership.
        assert!(!session.has_role(RoleKind::Admin, None));
        assert!(session.has_role(RoleKind::Admin, Some(&OrganizationId::from("o2"))));
        assert!(!session.has_role(RoleKind::Admin, Some(&OrganizationId::from("missing"))));
        assert!(session.has_any_role(RoleKind::Admin));
    }

    #[test]
    fn test_primary_role_follows_priority() {
        let session = Session::signed_in(
            UserIdentity::new("u1", "a@b.c"),
            vec![org("o1", &[("5", "marker"), ("3", "supervisor")])],
        );
        assert_eq!(session.primary_role(), Some(RoleKind::Supervisor));
    }

    #[test]
    fn test_role_kind_parse() {
        assert_eq!(" Committee ".parse::<RoleKind>(), Ok(RoleKind::Committee));
        assert!("dean".parse::<RoleKind>().is_err());
        assert_eq!(Role::new("9", "dean").kind(), None);
    }

    #[test]
    fn test_ids_accept_numbers() {
        let role: Role = serde_json::from_value(json!({"id": 7, "name": "admin"})).unwrap();
        assert_eq!(role.id.as_str(), "7");
    }

    #[test]
    fn test_identity_metadata_alias_and_display_name() {
        let user: UserIdentity = serde_json::from_value(json!({
            "id": "u1",
            "email": "jo@uni.edu",
            "raw_user_meta_data": {"first_name": "Jo", "last_name": "Park"}
        }))
        .unwrap();
        assert_eq!(user.display_name(), "Jo Park");
        assert_eq!(UserIdentity::new("u2", "x@y.z").display_name(), "x@y.z");
    }
}
