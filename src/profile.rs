//! User profiles and roles.
//!
//! Roles are a closed set dispatched through a single capability check
//! ([`Role::allows`]) instead of string comparisons at every call site.

use serde::{Deserialize, Serialize};

use crate::auth::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    #[default]
    Standard,
    Mentor,
    Admin,
}

/// What a role may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    LogEntries,
    ViewMentorDashboard,
}

impl Role {
    pub fn allows(self, cap: Capability) -> bool {
        match cap {
            Capability::LogEntries => true,
            Capability::ViewMentorDashboard => matches!(self, Role::Mentor | Role::Admin),
        }
    }

    /// Human label shown next to the user's name.
    pub fn label(self) -> &'static str {
        match self {
            Role::Standard => "Devotee",
            Role::Mentor => "Mentor",
            Role::Admin => "Admin",
        }
    }
}

/// Unknown or legacy values (e.g. `"user"`) map to `Standard`.
impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "mentor" => Role::Mentor,
            "admin" => Role::Admin,
            _ => Role::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    /// Default profile created on first sign-in. Roles are raised out of band.
    pub fn bootstrap(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            role: Role::Standard,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn can(&self, cap: Capability) -> bool {
        self.role.allows(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_mentors_and_admins_see_the_mentor_dashboard() {
        assert!(!Role::Standard.allows(Capability::ViewMentorDashboard));
        assert!(Role::Mentor.allows(Capability::ViewMentorDashboard));
        assert!(Role::Admin.allows(Capability::ViewMentorDashboard));
        for r in [Role::Standard, Role::Mentor, Role::Admin] {
            assert!(r.allows(Capability::LogEntries));
        }
    }

    #[test]
    fn legacy_role_strings_deserialize() {
        let r: Role = serde_json::from_value(json!("user")).unwrap();
        assert_eq!(r, Role::Standard);
        let r: Role = serde_json::from_value(json!("Mentor")).unwrap();
        assert_eq!(r, Role::Mentor);
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
    }

    #[test]
    fn bootstrap_profile_is_standard() {
        let id = Identity {
            user_id: "u-42".into(),
            email: Some("devotee@example.org".into()),
            display_name: Some("Devotee".into()),
            photo_url: None,
        };
        let p = UserProfile::bootstrap(&id);
        assert_eq!(p.role, Role::Standard);
        assert_eq!(p.user_id, "u-42");
        assert!(!p.can(Capability::ViewMentorDashboard));

        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["displayName"], json!("Devotee"));
        assert_eq!(v["role"], json!("standard"));
        assert!(v.get("photoUrl").is_none());
    }
}
