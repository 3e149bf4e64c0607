use crate::{
    error::{Error, Result},
    util::session::generate_session_id,
};
use core::time::Duration;
use dashmap::DashMap;
use session::{Policy, QuizState};
use std::time::Instant;

/// Sessions untouched for this long are forgotten.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const CAPACITY: usize = 10_000;

struct Entry {
    quiz: QuizState,
    /// Set while a generation call for this session is in flight.
    busy: bool,
    seen: Instant,
}

impl Entry {
    fn is_stale(&self, idle: Duration) -> bool {
        !self.busy && self.seen.elapsed() >= idle
    }
}

/// Quiz state of every live session, keyed by session ID.
pub struct Registry {
    sessions: DashMap<Box<str>, Entry>,
    policy: Policy,
    idle: Duration,
    capacity: usize,
}

impl Registry {
    pub fn new(policy: Policy) -> Self {
        Self::with_limits(policy, IDLE_TIMEOUT, CAPACITY)
    }

    pub fn with_limits(policy: Policy, idle: Duration, capacity: usize) -> Self {
        Self { sessions: DashMap::new(), policy, idle, capacity }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Starts serving a request. Only a live session named by the cookie is picked up; nothing is created
    /// until [`Visit::open`] is called.
    pub fn visit(&self, cookie: Option<&str>) -> Visit<'_> {
        let session = cookie.filter(|id| self.touch(id)).map(Box::from);
        Visit { registry: self, session, opened: false }
    }

    fn touch(&self, id: &str) -> bool {
        if self.sessions.remove_if(id, |_, entry| entry.is_stale(self.idle)).is_some() {
            log::debug!("Session {id} expired");
            return false;
        }
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.seen = Instant::now();
                true
            }
            None => false,
        }
    }

    fn open(&self) -> Result<Box<str>> {
        if self.sessions.len() >= self.capacity && self.sweep() == 0 {
            return Err(Error::Saturated);
        }

        let id = generate_session_id();
        let entry = Entry { quiz: QuizState::new(self.policy), busy: false, seen: Instant::now() };
        assert!(self.sessions.insert(id.clone(), entry).is_none());
        log::debug!("Opened session {id}");
        Ok(id)
    }

    /// Forgets idle sessions and returns how many were dropped. Sessions with a generation call in flight
    /// are kept.
    pub fn sweep(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_stale(self.idle));
        let dropped = before.saturating_sub(self.sessions.len());
        if dropped > 0 {
            log::info!("Expired {dropped} idle sessions");
        }
        dropped
    }

    /// Runs `op` against the quiz of a session. The map shard stays locked for the duration, so `op` must
    /// not block.
    pub fn with<T>(&self, session: &str, op: impl FnOnce(&mut QuizState) -> T) -> Result<T> {
        let mut entry = self.sessions.get_mut(session).ok_or(Error::NotFound)?;
        Ok(op(&mut entry.quiz))
    }

    /// Marks the session as generating until the returned guard is dropped.
    pub fn begin_generation(&self, session: &str) -> Result<Generating<'_>> {
        let mut entry = self.sessions.get_mut(session).ok_or(Error::NotFound)?;
        if entry.busy {
            return Err(Error::Busy);
        }
        entry.busy = true;
        Ok(Generating { registry: self, session: session.into() })
    }
}

/// The session of a single request, opened lazily.
pub struct Visit<'r> {
    registry: &'r Registry,
    session: Option<Box<str>>,
    opened: bool,
}

impl Visit<'_> {
    /// The live session, if the request has one.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Returns the live session, creating one if the request had none.
    pub fn open(&mut self) -> Result<&str> {
        if self.session.is_none() {
            self.session = Some(self.registry.open()?);
            self.opened = true;
        }
        self.session.as_deref().ok_or(Error::Fatal)
    }

    /// The session created while serving this request, which the client has yet to learn about.
    pub fn opened(&self) -> Option<&str> {
        self.session.as_deref().filter(|_| self.opened)
    }
}

pub struct Generating<'r> {
    registry: &'r Registry,
    session: Box<str>,
}

impl Drop for Generating<'_> {
    fn drop(&mut self) {
        if let Some(mut entry) = self.registry.sessions.get_mut(&*self.session) {
            entry.busy = false;
            entry.seen = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session::QuestionRecord;

    fn open(registry: &Registry) -> Box<str> {
        let mut visit = registry.visit(None);
        let id = Box::from(visit.open().unwrap());
        assert_eq!(visit.opened(), Some(&*id));
        id
    }

    #[test]
    fn visits_do_not_create_sessions() {
        let registry = Registry::new(Policy::default());
        for cookie in [None, Some("forged")] {
            let visit = registry.visit(cookie);
            assert_eq!(visit.session(), None);
            assert_eq!(visit.opened(), None);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn known_sessions_are_picked_up() {
        let registry = Registry::new(Policy::default());
        let id = open(&registry);

        let mut visit = registry.visit(Some(&*id));
        assert_eq!(visit.session(), Some(&*id));
        assert_eq!(visit.open().unwrap(), &*id);
        assert_eq!(visit.opened(), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn forged_ids_are_never_adopted() {
        let registry = Registry::new(Policy::default());
        let mut visit = registry.visit(Some("forged"));
        assert_ne!(visit.open().unwrap(), "forged");
        assert!(registry.visit(Some("forged")).session().is_none());
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = Registry::new(Policy::default());
        let alice = open(&registry);
        let bob = open(&registry);

        registry
            .with(&alice, |quiz| quiz.set_questions(vec![QuestionRecord::true_false("Q?", true, None)]))
            .unwrap();
        assert_eq!(registry.with(&alice, |quiz| quiz.questions().len()).unwrap(), 1);
        assert!(registry.with(&bob, |quiz| quiz.is_empty()).unwrap());
        assert!(matches!(registry.with("missing", |_| ()), Err(Error::NotFound)));
    }

    #[test]
    fn second_generation_is_rejected_until_the_first_ends() {
        let registry = Registry::new(Policy::default());
        let id = open(&registry);

        let guard = registry.begin_generation(&id).unwrap();
        assert!(matches!(registry.begin_generation(&id), Err(Error::Busy)));
        drop(guard);
        assert!(registry.begin_generation(&id).is_ok());
    }

    #[test]
    fn sessions_inherit_policy() {
        let policy = Policy { require_selection: true, retry_clears_selection: false };
        let registry = Registry::new(policy);
        let id = open(&registry);
        assert_eq!(registry.with(&id, |quiz| quiz.policy()).unwrap(), policy);
    }

    #[test]
    fn idle_sessions_expire_unless_generating() {
        let registry = Registry::with_limits(Policy::default(), Duration::ZERO, 8);
        let idle = open(&registry);
        let working = open(&registry);
        let _guard = registry.begin_generation(&working).unwrap();

        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.visit(Some(&*idle)).session().is_none());
        assert_eq!(registry.visit(Some(&*working)).session(), Some(&*working));
    }

    #[test]
    fn stale_cookie_is_dropped_on_visit() {
        let registry = Registry::with_limits(Policy::default(), Duration::ZERO, 8);
        let id = open(&registry);
        assert!(registry.visit(Some(&*id)).session().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn capacity_bounds_the_map() {
        let registry = Registry::with_limits(Policy::default(), IDLE_TIMEOUT, 2);
        open(&registry);
        open(&registry);
        assert!(matches!(registry.visit(None).open(), Err(Error::Saturated)));
        assert_eq!(registry.len(), 2);

        // Expired sessions make room again.
        let registry = Registry::with_limits(Policy::default(), Duration::ZERO, 2);
        for _ in 0..100 {
            open(&registry);
            assert!(registry.len() <= 2);
        }
    }
}
