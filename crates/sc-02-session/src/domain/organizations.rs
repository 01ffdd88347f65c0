//! Assemble organizations from user/organization/role link rows.

use sc_01_backend_client::Row;
use serde::Deserialize;
use serde_json::Value;
use shared_types::{Organization, OrganizationId, Role, RoleId};
use tracing::debug;

/// Link table joining users to organizations and roles.
pub const MEMBERSHIP_TABLE: &str = "user_organization_roles";

#[derive(Debug, Deserialize)]
struct NamedRef<Id> {
    id: Id,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    organizations: Option<NamedRef<OrganizationId>>,
    roles: Option<NamedRef<RoleId>>,
}

/// Group link rows by organization, first-seen order, roles deduplicated by
/// id. Rows missing either side of the join are skipped.
pub fn organizations_from_links(rows: Vec<Row>) -> Vec<Organization> {
    let mut organizations: Vec<Organization> = Vec::new();
    for row in rows {
        let link: LinkRow = match serde_json::from_value(Value::Object(row)) {
            Ok(link) => link,
            Err(e) => {
                debug!(error = %e, "Skipping malformed membership row");
                continue;
            }
        };
        let (Some(org), Some(role)) = (link.organizations, link.roles) else {
            continue;
        };
        let role = Role::new(role.id, role.name);
        match organizations.iter_mut().find(|o| o.id == org.id) {
            Some(existing) => {
                existing.add_role(role);
            }
            None => organizations.push(Organization::new(org.id, org.name).with_role(role)),
        }
    }
    organizations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::RoleKind;

    fn link(org: Value, role: Value) -> Row {
        json!({"organizations": org, "roles": role})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_groups_and_dedups() {
        let rows = vec![
            link(json!({"id": "o1", "name": "North"}), json!({"id": 1, "name": "admin"})),
            link(json!({"id": "o1", "name": "North"}), json!({"id": 1, "name": "admin"})),
            link(json!({"id": "o1", "name": "North"}), json!({"id": 2, "name": "Supervisor"})),
            link(json!({"id": "o2", "name": "South"}), json!({"id": 3, "name": "student"})),
        ];
        let orgs = organizations_from_links(rows);
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].roles().len(), 2);
        assert!(orgs[0].has_role(RoleKind::Supervisor));
        assert!(orgs[1].has_role(RoleKind::Student));
    }

    #[test]
    fn test_skips_incomplete_rows() {
        let rows = vec![
            link(Value::Null, json!({"id": 1, "name": "admin"})),
            json!({"unexpected": true}).as_object().cloned().unwrap(),
        ];
        assert!(organizations_from_links(rows).is_empty());
    }
}
