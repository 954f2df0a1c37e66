//! Thread-local override stacks.
//!
//! A [`ContextSlot`] names one ambient value. Pushing makes a value current
//! for the calling thread until the matching pop; pops are strictly LIFO and a
//! mismatched pop is rejected instead of silently leaving a stale override
//! behind.

use crate::error::{ContextError, ContextResult};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{error, trace};

type SlotKey = (&'static str, TypeId);

thread_local! {
    static STACKS: RefCell<HashMap<SlotKey, Vec<Box<dyn Any>>>> = RefCell::new(HashMap::new());
}

/// A named ambient value of type `T`.
///
/// Slots are usually declared as statics:
///
/// ```
/// use hookstack_context::ContextSlot;
///
/// static TENANT: ContextSlot<String> = ContextSlot::new("tenant");
///
/// let seen = TENANT.with_scope("acme".to_string(), || TENANT.current());
/// assert_eq!(seen.as_deref(), Some("acme"));
/// assert_eq!(TENANT.current(), None);
/// ```
pub struct ContextSlot<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextSlot<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextSlot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextSlot<T> {}

impl<T> fmt::Debug for ContextSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextSlot").field(&self.name).finish()
    }
}

impl<T: 'static> ContextSlot<T> {
    fn key(&self) -> SlotKey {
        (self.name, TypeId::of::<T>())
    }

    /// Makes `value` current on this thread. The returned token must be
    /// handed back to [`ContextSlot::pop`] on the same thread.
    #[must_use = "an unpopped token leaves the override in place"]
    pub fn push(&self, value: T) -> ScopeToken {
        let key = self.key();
        let depth = STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            let stack = stacks.entry(key).or_default();
            stack.push(Box::new(value));
            stack.len()
        });
        trace!(slot = self.name, depth, "Pushed context override");
        ScopeToken {
            key,
            depth,
            _not_send: PhantomData,
        }
    }

    /// Restores the value that was current before the push that produced
    /// `token`.
    ///
    /// Fails with [`ContextError::ImbalancedScope`] if the token belongs to a
    /// different slot or is not the innermost outstanding push. The token's
    /// push is still undone in that case: its slot is truncated back below
    /// it, discarding anything pushed after it, so no override outlives the
    /// rejected token.
    pub fn pop(&self, token: ScopeToken) -> ContextResult<()> {
        let result = if token.key != self.key() {
            Err(ContextError::ImbalancedScope {
                slot: self.name,
                expected: token.depth,
                actual: self.depth(),
            })
        } else {
            pop_key(token.key, token.depth)
        };
        if let Err(e) = &result {
            truncate_key(token.key, token.depth.saturating_sub(1));
            error!(slot = token.key.0, error = %e, "Rejected pop, override discarded");
        }
        result
    }

    /// The innermost value pushed on this thread, if any.
    pub fn current(&self) -> Option<T>
    where
        T: Clone,
    {
        STACKS.with(|stacks| {
            stacks
                .borrow()
                .get(&self.key())
                .and_then(|stack| stack.last())
                .and_then(|value| value.downcast_ref::<T>())
                .cloned()
        })
    }

    /// Number of outstanding pushes on this thread.
    pub fn depth(&self) -> usize {
        STACKS.with(|stacks| stacks.borrow().get(&self.key()).map_or(0, Vec::len))
    }

    /// Pushes `value` and returns a guard that pops it when dropped,
    /// including while unwinding from a panic.
    #[must_use = "dropping the guard immediately ends the scope"]
    pub fn enter(&self, value: T) -> ScopeGuard {
        ScopeGuard {
            token: Some(self.push(value)),
        }
    }

    /// Runs `body` with `value` current and restores the previous value on
    /// every exit path before returning `body`'s result.
    pub fn with_scope<R>(&self, value: T, body: impl FnOnce() -> R) -> R {
        let _guard = self.enter(value);
        body()
    }
}

fn pop_key(key: SlotKey, expected: usize) -> ContextResult<()> {
    STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let actual = stacks.get(&key).map_or(0, Vec::len);
        if actual != expected || expected == 0 {
            return Err(ContextError::ImbalancedScope {
                slot: key.0,
                expected,
                actual,
            });
        }
        if let Some(stack) = stacks.get_mut(&key) {
            stack.pop();
            if stack.is_empty() {
                stacks.remove(&key);
            }
        }
        trace!(slot = key.0, depth = expected - 1, "Restored context override");
        Ok(())
    })
}

fn truncate_key(key: SlotKey, len: usize) {
    STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        if let Some(stack) = stacks.get_mut(&key) {
            stack.truncate(len);
            if stack.is_empty() {
                stacks.remove(&key);
            }
        }
    });
}

/// Proof of one outstanding push.
///
/// Not `Send`: a push must be popped on the thread that made it.
#[derive(Debug)]
#[must_use = "an unpopped token leaves the override in place"]
pub struct ScopeToken {
    key: SlotKey,
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl ScopeToken {
    /// Name of the slot this token was pushed on.
    pub fn slot(&self) -> &'static str {
        self.key.0
    }

    /// Stack depth right after the push.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Pops its push when dropped.
///
/// Guards must be dropped in reverse order of creation. A guard dropped out
/// of order truncates the stack back below its own push, discarding anything
/// pushed after it, and then panics. If the thread is already unwinding it
/// logs the violation instead of panicking again.
#[derive(Debug)]
pub struct ScopeGuard {
    token: Option<ScopeToken>,
}

impl ScopeGuard {
    pub fn slot(&self) -> Option<&'static str> {
        self.token.as_ref().map(ScopeToken::slot)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let (key, depth) = (token.key, token.depth);
        if let Err(e) = pop_key(key, depth) {
            truncate_key(key, depth.saturating_sub(1));
            if std::thread::panicking() {
                error!(slot = key.0, error = %e, "Scope guard dropped out of order during unwind");
            } else {
                panic!("{e}");
            }
        }
    }
}
