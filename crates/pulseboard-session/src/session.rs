//! Session types: who is logged in, and what state the session is in.
//!
//! The credential service describes users in its own vocabulary
//! ([`RemoteUser`]). The rest of the client only ever sees the canonical
//! [`User`]; [`RemoteUser::into_user`] is the one place the two meet.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Where the session is persisted.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Storage key holding the opaque credential.
    pub token_key: String,

    /// Storage key holding the JSON-serialized [`User`].
    pub user_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: "pulseboard.token".to_string(),
            user_key: "pulseboard.user".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The canonical user record.
///
/// This is what gets persisted under [`SessionConfig::user_key`], so its
/// serialized shape is a storage format: field names are camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Free-form. Compared case-insensitively against `"admin"`.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl User {
    /// Whether this user holds the admin role (case-insensitive).
    pub fn is_admin(&self) -> bool {
        crate::gate::is_admin_role(&self.role)
    }
}

/// A user as the credential service sends it.
///
/// The service speaks Spanish (`nombre`, `correo`, `rol`, ...) and uses
/// `_id` for identifiers, which may be strings or numbers. English
/// spellings are accepted as aliases so a service-side rename does not
/// break login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteUser {
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "correo", alias = "email", default)]
    pub email: String,
    #[serde(rename = "nombre", alias = "name", alias = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "apellido", alias = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(rename = "rol", alias = "role", default)]
    pub role: String,
    #[serde(rename = "nacionalidad", alias = "nationality", default)]
    pub nationality: Option<String>,
    #[serde(rename = "emailVerificado", alias = "emailVerified", default)]
    pub email_verified: Option<bool>,
}

impl RemoteUser {
    /// Maps the service's shape onto the canonical [`User`].
    pub fn into_user(self) -> User {
        let name = match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => {
                format!("{} {last}", self.first_name.trim())
            }
            _ => self.first_name.trim().to_string(),
        };

        User {
            id: self.id,
            email: self.email.trim().to_string(),
            name,
            role: self.role.trim().to_string(),
            nationality: self.nationality.filter(|n| !n.is_empty()),
            email_verified: self.email_verified,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The in-memory session: at most one per client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
///   Uninitialized ──initialize()──→ Initializing ──→ Unauthenticated
///                                        │                 ↑   │
///                                        ▼        (failure)│   │login()
///                                   Authenticated ←────────┼── Authenticating
///                                        │        (success)│
///                                        └──logout/forced──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `initialize()` has not run yet.
    Uninitialized,
    /// `initialize()` is restoring the persisted session.
    Initializing,
    /// No user.
    Unauthenticated,
    /// A login call is in flight.
    Authenticating,
    /// A user is logged in.
    Authenticated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Authenticated => write!(f, "Authenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// A read-only copy of everything observers need, published by the
/// manager after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub user: Option<User>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Uninitialized,
            user: None,
            is_loading: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_user_spanish_fields_map_to_canonical() {
        let remote: RemoteUser = serde_json::from_str(
            r#"{
                "_id": "64f1",
                "correo": " ana@example.com ",
                "nombre": "Ana",
                "apellido": "Pérez",
                "rol": "Admin",
                "nacionalidad": "CL",
                "emailVerificado": true
            }"#,
        )
        .unwrap();

        let user = remote.into_user();

        assert_eq!(
            user,
            User {
                id: "64f1".into(),
                email: "ana@example.com".into(),
                name: "Ana Pérez".into(),
                role: "Admin".into(),
                nationality: Some("CL".into()),
                email_verified: Some(true),
            }
        );
    }

    #[test]
    fn test_remote_user_english_aliases_and_numeric_id() {
        let remote: RemoteUser = serde_json::from_str(
            r#"{"id": 7, "email": "b@x.io", "name": "Bo", "role": "user"}"#,
        )
        .unwrap();

        let user = remote.into_user();

        assert_eq!(user.id, "7");
        assert_eq!(user.name, "Bo");
        assert_eq!(user.nationality, None);
        assert_eq!(user.email_verified, None);
    }

    #[test]
    fn test_remote_user_missing_fields_default_empty() {
        let user = serde_json::from_str::<RemoteUser>("{}").unwrap().into_user();
        assert_eq!(user.id, "");
        assert_eq!(user.role, "");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_user_storage_shape_is_camel_case() {
        let user = User {
            id: "1".into(),
            email: "a@b.c".into(),
            name: "A".into(),
            role: "admin".into(),
            nationality: None,
            email_verified: Some(false),
        };

        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["emailVerified"], false);
        assert!(json.get("nationality").is_none());
        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_session_is_authenticated_follows_user() {
        assert!(!Session::default().is_authenticated());
        let session = Session {
            user: Some(serde_json::from_str::<RemoteUser>("{}").unwrap().into_user()),
        };
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Authenticating.to_string(), "Authenticating");
        assert_eq!(SessionSnapshot::default().state, SessionState::Uninitialized);
    }
}
