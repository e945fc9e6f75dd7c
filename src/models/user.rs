use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Dashboard role of a signed-in identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(Role::User)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Authenticated identity as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// Name shown in the dashboard header
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Role record keyed by identity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: String, // Stored as TEXT, use Role enum for type safety
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Default record written on first sign-in
    pub fn new(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            role: Role::User.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Get the role as an enum
    pub fn role_enum(&self) -> Role {
        Role::from_str(&self.role).unwrap_or(Role::User)
    }

    /// Check if the record grants admin rights
    pub fn is_admin(&self) -> bool {
        self.role_enum() == Role::Admin
    }
}
