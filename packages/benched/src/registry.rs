//! Lookup of per-context sessions.
//!
//! Each execution context (a worker thread, a task queue, ...) drives its own [`Session`]. The
//! [`SessionRegistry`] maps opaque [`ContextId`]s to those sessions and uses a
//! [`ContextResolver`] to determine which context the caller is running in.

use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::thread;

use foldhash::{HashMap, HashMapExt};
use tracing::debug;

use crate::constants::ERR_POISONED_LOCK;
use crate::{Clock, Session};

/// A session shared between the registry and the context that drives it.
pub type SharedSession = Arc<Mutex<Session>>;

/// Opaque identifier of an execution context.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ContextId(Arc<str>);

impl ContextId {
    /// Creates an identifier from its textual form.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContextId {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContextId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Determines the execution context of the caller.
#[cfg_attr(test, mockall::automock)]
pub trait ContextResolver: Debug + Send + Sync + 'static {
    /// The context the caller is running in, if it has one.
    fn current_context(&self) -> Option<ContextId>;
}

thread_local! {
    static ENTERED_CONTEXT: RefCell<Option<ContextId>> = const { RefCell::new(None) };
}

/// Resolves contexts per thread.
///
/// A context explicitly entered on the current thread via [`ThreadContext::enter()`] takes
/// precedence. Otherwise, the name of the current thread is the context; unnamed threads have
/// no context.
///
/// # Examples
///
/// ```
/// use benched::{ContextId, ContextResolver, ThreadContext};
///
/// let resolver = ThreadContext;
///
/// {
///     let _context = ThreadContext::enter("render");
///     assert_eq!(resolver.current_context(), Some(ContextId::new("render")));
/// }
///
/// assert_ne!(resolver.current_context(), Some(ContextId::new("render")));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadContext;

impl ThreadContext {
    /// Makes `id` the context of the current thread until the returned guard is dropped.
    ///
    /// Guards may be nested; dropping a guard restores the context that was active when it
    /// was created.
    pub fn enter(id: impl Into<ContextId>) -> EnteredContext {
        let previous = ENTERED_CONTEXT.with_borrow_mut(|current| current.replace(id.into()));

        EnteredContext {
            previous,
            _single_threaded: PhantomData,
        }
    }
}

impl ContextResolver for ThreadContext {
    fn current_context(&self) -> Option<ContextId> {
        ENTERED_CONTEXT
            .with_borrow(Clone::clone)
            .or_else(|| thread::current().name().map(ContextId::new))
    }
}

/// Keeps a context entered on the current thread. Created by [`ThreadContext::enter()`].
#[derive(Debug)]
#[must_use = "the context is only entered while the guard is alive"]
pub struct EnteredContext {
    previous: Option<ContextId>,

    _single_threaded: PhantomData<*const ()>,
}

impl Drop for EnteredContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ENTERED_CONTEXT.with_borrow_mut(|current| *current = previous);
    }
}

/// Injectable mapping from execution contexts to their sessions.
///
/// The registry is safe to share between threads. Each registered session is individually
/// locked, so contexts only contend on the registry itself while looking up their session.
///
/// # Examples
///
/// ```
/// use benched::{SessionRegistry, ThreadContext};
///
/// let registry = SessionRegistry::new();
/// registry.register("render");
///
/// let _context = ThreadContext::enter("render");
/// let session = registry.current().unwrap();
///
/// assert_eq!(session.lock().unwrap().name(), "render.default");
/// ```
#[derive(Debug)]
pub struct SessionRegistry {
    resolver: Box<dyn ContextResolver>,
    sessions: Mutex<HashMap<ContextId, SharedSession>>,
}

impl SessionRegistry {
    /// Creates an empty registry that resolves contexts with [`ThreadContext`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(ThreadContext)
    }

    /// Creates an empty registry that resolves contexts with a custom resolver.
    #[must_use]
    pub fn with_resolver(resolver: impl ContextResolver) -> Self {
        Self {
            resolver: Box::new(resolver),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session named `"<id>.default"` for the context, replacing any session
    /// previously registered for it.
    pub fn register(&self, id: impl Into<ContextId>) -> SharedSession {
        let id = id.into();
        let session = Session::new(default_session_name(&id));

        self.insert(id, session)
    }

    /// Like [`register()`](Self::register) but the session reads time from `clock`.
    pub fn register_with_clock(
        &self,
        id: impl Into<ContextId>,
        clock: impl Clock,
    ) -> SharedSession {
        let id = id.into();
        let session = Session::with_clock(default_session_name(&id), clock);

        self.insert(id, session)
    }

    /// Removes the session of a context, returning it if one was registered.
    pub fn unregister(&self, id: &ContextId) -> Option<SharedSession> {
        self.sessions.lock().expect(ERR_POISONED_LOCK).remove(id)
    }

    /// The session registered for a context.
    #[must_use]
    pub fn get(&self, id: &ContextId) -> Option<SharedSession> {
        self.sessions.lock().expect(ERR_POISONED_LOCK).get(id).cloned()
    }

    /// The session registered for the caller's context.
    ///
    /// Returns `None` if the caller has no context or no session is registered for it.
    #[must_use]
    pub fn current(&self) -> Option<SharedSession> {
        let id = self.resolver.current_context()?;
        self.get(&id)
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().expect(ERR_POISONED_LOCK).len()
    }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, id: ContextId, session: Session) -> SharedSession {
        let session = Arc::new(Mutex::new(session));

        let replaced = self
            .sessions
            .lock()
            .expect(ERR_POISONED_LOCK)
            .insert(id.clone(), Arc::clone(&session));

        debug!(context = %id, replaced = replaced.is_some(), "registered benchmark session");

        session
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_session_name(id: &ContextId) -> String {
    format!("{id}.default")
}
