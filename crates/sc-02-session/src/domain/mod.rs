//! Session domain: errors, organization assembly and redirect targets.

pub mod errors;
pub mod organizations;
pub mod redirects;

pub use errors::{AccountError, AuthInitError, RoleDataFetchError};
pub use organizations::{organizations_from_links, MEMBERSHIP_TABLE};
pub use redirects::{append_query, login_redirect, unauthorized_redirect};
