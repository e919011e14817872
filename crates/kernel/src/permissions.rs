//! Current-user context and permission checks.

use uuid::Uuid;

/// Permission that grants every capability.
pub const ADMINISTER_SITE: &str = "administer site";

/// Capability to edit drafts created by other users in a section.
pub fn edit_peer_drafts_permission(section_id: Uuid) -> String {
    format!("edit peer entry drafts:{section_id}")
}

/// User context for the current request.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// User ID (Uuid::nil() for anonymous).
    pub id: Uuid,
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Cached permissions for the user.
    pub permissions: Vec<String>,
}

impl UserContext {
    /// Create context for anonymous user.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            authenticated: false,
            permissions: Vec::new(),
        }
    }

    /// Create context for authenticated user.
    pub fn authenticated(id: Uuid, permissions: Vec<String>) -> Self {
        Self {
            id,
            authenticated: true,
            permissions,
        }
    }

    /// Check if user has a specific permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Check if user is admin.
    pub fn is_admin(&self) -> bool {
        self.has_permission(ADMINISTER_SITE)
    }

    /// Check a capability, granting everything to admins.
    pub fn can(&self, capability: &str) -> bool {
        self.is_admin() || self.has_permission(capability)
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Answers who is acting and what they may do.
pub trait PermissionOracle: Send + Sync {
    /// The authenticated user, if any.
    fn current_user(&self) -> Option<&UserContext>;

    /// Check a capability for the current user.
    fn user_can(&self, capability: &str) -> bool {
        self.current_user().is_some_and(|u| u.can(capability))
    }
}

/// Permission oracle for one request's user.
#[derive(Debug, Clone, Default)]
pub struct SessionPermissions {
    user: Option<UserContext>,
}

impl SessionPermissions {
    /// Permissions for an authenticated user.
    ///
    /// Anonymous contexts are treated as no user at all.
    pub fn for_user(user: UserContext) -> Self {
        Self {
            user: user.authenticated.then_some(user),
        }
    }

    /// Permissions for a request without a user (cron, CLI, anonymous).
    pub fn none() -> Self {
        Self::default()
    }
}

impl PermissionOracle for SessionPermissions {
    fn current_user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }
}
