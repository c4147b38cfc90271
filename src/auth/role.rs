use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account roles. Stored in `users.role` using the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    KindergartenAdmin,
    Teacher,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::KindergartenAdmin, Role::Teacher];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::KindergartenAdmin => "KindergartenAdmin",
            Role::Teacher => "Teacher",
        }
    }

    /// SuperAdmins are not bound to a kindergarten.
    pub fn is_system(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Role sets used by the admin route groups.
pub mod access {
    use super::Role;

    /// System console: kindergartens, users, system dashboard.
    pub const ROOT: &[Role] = &[Role::SuperAdmin];

    /// Site configuration and the content only administrators curate.
    pub const ADMIN: &[Role] = &[Role::SuperAdmin, Role::KindergartenAdmin];

    /// Day-to-day content teachers may publish.
    pub const EDITOR: &[Role] = &[Role::SuperAdmin, Role::KindergartenAdmin, Role::Teacher];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("KINDERGARTENADMIN".parse::<Role>().unwrap(), Role::KindergartenAdmin);
        assert_eq!(" Teacher ".parse::<Role>().unwrap(), Role::Teacher);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn teachers_are_editors_only() {
        assert!(access::EDITOR.contains(&Role::Teacher));
        assert!(!access::ADMIN.contains(&Role::Teacher));
        assert!(!access::ROOT.contains(&Role::KindergartenAdmin));
    }

    #[test]
    fn serializes_as_variant_name() {
        assert_eq!(serde_json::to_value(Role::KindergartenAdmin).unwrap(), "KindergartenAdmin");
    }
}
