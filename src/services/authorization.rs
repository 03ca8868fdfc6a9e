//! The one place role logic lives. Every command and query on applications,
//! evaluations and favorites goes through these predicates.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{ApplicationStatus, TransitionAuthority};
use crate::models::principal::Actor;

/// Ownership facts about one application: who applied and who owns the vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessScope {
    pub candidate_id: Uuid,
    pub recruiter_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Status(ApplicationStatus),
    Notes,
    Favorite,
    Evaluate,
}

/// Base row set an actor may list, before any filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleSet {
    All,
    SubmittedBy(Uuid),
    VacanciesOwnedBy(Uuid),
}

pub fn visible_set(actor: &Actor) -> VisibleSet {
    match *actor {
        Actor::Admin(_) => VisibleSet::All,
        Actor::Candidate(id) => VisibleSet::SubmittedBy(id),
        Actor::Recruiter(id) => VisibleSet::VacanciesOwnedBy(id),
    }
}

pub fn can_view(actor: &Actor, scope: &AccessScope) -> bool {
    match *actor {
        Actor::Admin(_) => true,
        Actor::Candidate(id) => scope.candidate_id == id,
        Actor::Recruiter(id) => scope.recruiter_id == id,
    }
}

pub fn can_mutate(actor: &Actor, scope: &AccessScope, mutation: Mutation) -> bool {
    if !can_view(actor, scope) {
        return false;
    }
    let required = match mutation {
        Mutation::Status(ApplicationStatus::Withdrawn) => TransitionAuthority::Candidate,
        Mutation::Status(_) | Mutation::Notes | Mutation::Favorite | Mutation::Evaluate => {
            TransitionAuthority::Staff
        }
    };
    match required {
        TransitionAuthority::Candidate => matches!(actor, Actor::Candidate(_)),
        TransitionAuthority::Staff => actor.is_staff(),
    }
}

/// Invisible objects are reported as missing so ids cannot be probed.
pub fn ensure_visible(actor: &Actor, scope: &AccessScope) -> Result<()> {
    if can_view(actor, scope) {
        Ok(())
    } else {
        Err(Error::NotFound("Application not found".to_string()))
    }
}

pub fn ensure_can_mutate(actor: &Actor, scope: &AccessScope, mutation: Mutation) -> Result<()> {
    ensure_visible(actor, scope)?;
    if can_mutate(actor, scope, mutation) {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}

pub fn ensure_staff(actor: &Actor) -> Result<()> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}

pub fn ensure_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}
