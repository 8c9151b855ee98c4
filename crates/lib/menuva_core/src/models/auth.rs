//! Authentication domain models: principals and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a tenant-scoped user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Staff,
}

impl UserRole {
    /// Parse the database representation (`admin` / `staff`).
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "staff" => Some(UserRole::Staff),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

/// A tenant user (restaurant staff member or admin).
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub tenant_id: String,
}

/// A platform operator. Operators have no tenant and are implicitly
/// entitled to everything.
#[derive(Debug, Clone)]
pub struct Operator {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

/// The authenticated identity behind a session, resolved once at the
/// session-store boundary so downstream code never probes untyped fields.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    Operator(Operator),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::User(u) => &u.id,
            Principal::Operator(o) => &o.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::User(u) => &u.email,
            Principal::Operator(o) => &o.email,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Principal::User(u) => u.name.as_deref(),
            Principal::Operator(o) => o.name.as_deref(),
        }
    }

    /// Wire-level role string (`ADMIN` / `STAFF` / `SUPER_ADMIN`).
    pub fn role_str(&self) -> &'static str {
        match self {
            Principal::User(u) => match u.role {
                UserRole::Admin => "ADMIN",
                UserRole::Staff => "STAFF",
            },
            Principal::Operator(_) => "SUPER_ADMIN",
        }
    }

    /// Tenant the principal is scoped to, if any.
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Principal::User(u) => Some(&u.tenant_id),
            Principal::Operator(_) => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Principal::Operator(_))
    }
}

/// Which table a session's principal lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalKind {
    User,
    Operator,
}

impl PrincipalKind {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "user" => Some(PrincipalKind::User),
            "operator" => Some(PrincipalKind::Operator),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Operator => "operator",
        }
    }
}

/// Server-side session record, keyed by its opaque token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub principal_kind: PrincipalKind,
    pub principal_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is valid iff it exists and `now < expires_at`.
    /// No other field participates.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
