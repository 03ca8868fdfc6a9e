use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Recruiter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "candidate" => Ok(Role::Candidate),
            "recruiter" => Ok(Role::Recruiter),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The authenticated caller, resolved from the identity registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Candidate(Uuid),
    Recruiter(Uuid),
    Admin(Uuid),
}

impl Actor {
    pub fn new(role: Role, id: Uuid) -> Self {
        match role {
            Role::Candidate => Actor::Candidate(id),
            Role::Recruiter => Actor::Recruiter(id),
            Role::Admin => Actor::Admin(id),
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Actor::Candidate(id) | Actor::Recruiter(id) | Actor::Admin(id) => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Candidate(_) => Role::Candidate,
            Actor::Recruiter(_) => Role::Recruiter,
            Actor::Admin(_) => Role::Admin,
        }
    }

    /// Recruiters and admins.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Actor::Candidate(_))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role(), self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Principal {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.role, self.id)
    }
}

pub(crate) fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

/// Contact data a candidate keeps alongside their account. Feeds the export columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub principal_id: Uuid,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub cpf: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
