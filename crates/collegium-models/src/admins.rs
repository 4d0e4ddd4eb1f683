use crate::ids::{AdminId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const DEFAULT_DEPARTMENT: &str = "Administration";

/// Every permission an admin can hold; also the default grant.
pub const ALL_PERMISSIONS: [&str; 8] = [
    "manage_users",
    "manage_students",
    "manage_faculty",
    "manage_courses",
    "manage_branches",
    "manage_events",
    "view_reports",
    "manage_settings",
];

pub fn default_permissions() -> Vec<String> {
    ALL_PERMISSIONS.iter().map(|p| p.to_string()).collect()
}

pub fn is_known_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Admin {
    pub id: AdminId,
    pub user_id: UserId,
    pub admin_id: String,
    pub department: String,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert an admin sub-profile.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub admin_id: String,
    pub department: String,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permissions_is_full_set() {
        let perms = default_permissions();
        assert_eq!(perms.len(), 8);
        assert!(perms.iter().all(|p| is_known_permission(p)));
        assert!(!is_known_permission("delete_everything"));
    }
}
