//! Request-scoped authorization state.
//!
//! An [`AuthorizationContext`] holds two independent stacks:
//!
//! * the entry stack, signer identities of the script fragments currently
//!   executing with elevated rights (innermost last);
//! * the sign-macro stack, `(document, signer)` pairs of the sign wrappers
//!   whose subtree is currently rendering.
//!
//! Cloning the context hands out another handle to the same stacks, which is
//! how nested renders inherit it. Separate requests must each create their own
//! with [`AuthorizationContext::new`].
//!
//! Elevation is normally acquired through [`AuthorizationContext::elevate`] and
//! [`AuthorizationContext::enter_sign_scope`]. The returned guards put the
//! stack back to the depth it had at acquisition when dropped, including on
//! early return and during unwinding.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::reference::{DocumentReference, UserReference};

/// One sign wrapper currently in effect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignMacroEntry {
    pub document: DocumentReference,
    pub signer: UserReference,
}

#[derive(Debug, Default)]
struct Stacks {
    entries: Vec<UserReference>,
    sign_macros: Vec<SignMacroEntry>,
}

impl Stacks {
    /// Returns the depth before the push
    fn push_entry(&mut self, identity: UserReference) -> usize {
        let depth = self.entries.len();
        debug!(signer = %identity, depth = depth + 1, "push entry");
        self.entries.push(identity);
        depth
    }

    /// Returns the depth before the push
    fn enter_sign_macro(&mut self, entry: SignMacroEntry) -> usize {
        let depth = self.sign_macros.len();
        debug!(
            document = %entry.document,
            signer = %entry.signer,
            depth = depth + 1,
            "enter sign macro"
        );
        self.sign_macros.push(entry);
        depth
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuthorizationContext {
    stacks: Arc<Mutex<Stacks>>,
}

impl AuthorizationContext {
    /// Fresh, isolated stacks for a new request
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while the lock was held cannot leave the stacks half-updated,
    // every mutation is a single Vec call.
    fn stacks(&self) -> MutexGuard<'_, Stacks> {
        self.stacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same request state
    pub fn shares_state_with(&self, other: &AuthorizationContext) -> bool {
        Arc::ptr_eq(&self.stacks, &other.stacks)
    }

    pub fn push_entry(&self, identity: UserReference) {
        self.stacks().push_entry(identity);
    }

    /// No-op on an empty stack
    pub fn pop_entry(&self) -> Option<UserReference> {
        let mut stacks = self.stacks();
        let popped = stacks.entries.pop();
        if let Some(identity) = &popped {
            debug!(signer = %identity, depth = stacks.entries.len(), "pop entry");
        }
        popped
    }

    pub fn peek_entry(&self) -> Option<UserReference> {
        self.stacks().entries.last().cloned()
    }

    pub fn has_entry(&self) -> bool {
        !self.stacks().entries.is_empty()
    }

    pub fn entry_depth(&self) -> usize {
        self.stacks().entries.len()
    }

    pub fn enter_sign_macro(&self, document: DocumentReference, identity: UserReference) {
        self.stacks().enter_sign_macro(SignMacroEntry {
            document,
            signer: identity,
        });
    }

    /// No-op on an empty stack
    pub fn exit_sign_macro(&self) -> Option<SignMacroEntry> {
        let mut stacks = self.stacks();
        let exited = stacks.sign_macros.pop();
        if exited.is_some() {
            debug!(depth = stacks.sign_macros.len(), "exit sign macro");
        }
        exited
    }

    pub fn peek_sign_macro(&self) -> Option<SignMacroEntry> {
        self.stacks().sign_macros.last().cloned()
    }

    pub fn is_inside_sign_macro(&self) -> bool {
        !self.stacks().sign_macros.is_empty()
    }

    pub fn sign_macro_depth(&self) -> usize {
        self.stacks().sign_macros.len()
    }

    /// Push `identity` for the lifetime of the returned guard
    pub fn elevate(&self, identity: UserReference) -> EntryGuard {
        let depth = self.stacks().push_entry(identity.clone());
        EntryGuard {
            context: self.clone(),
            depth,
            identity,
        }
    }

    /// Enter a sign macro for the lifetime of the returned guard
    pub fn enter_sign_scope(
        &self,
        document: DocumentReference,
        identity: UserReference,
    ) -> SignMacroGuard {
        let entry = SignMacroEntry {
            document,
            signer: identity,
        };
        let depth = self.stacks().enter_sign_macro(entry.clone());
        SignMacroGuard {
            context: self.clone(),
            depth,
            entry,
        }
    }
}

/// Keeps a signer on the entry stack until dropped
#[must_use = "elevation ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct EntryGuard {
    context: AuthorizationContext,
    depth: usize,
    identity: UserReference,
}

impl EntryGuard {
    pub fn identity(&self) -> &UserReference {
        &self.identity
    }
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        let mut stacks = self.context.stacks();
        stacks.entries.truncate(self.depth);
        debug!(signer = %self.identity, depth = self.depth, "release entry");
    }
}

/// Keeps a sign wrapper on the sign-macro stack until dropped
#[must_use = "the sign scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SignMacroGuard {
    context: AuthorizationContext,
    depth: usize,
    entry: SignMacroEntry,
}

impl SignMacroGuard {
    pub fn identity(&self) -> &UserReference {
        &self.entry.signer
    }

    pub fn document(&self) -> &DocumentReference {
        &self.entry.document
    }
}

impl Drop for SignMacroGuard {
    fn drop(&mut self) {
        let mut stacks = self.context.stacks();
        stacks.sign_macros.truncate(self.depth);
        debug!(signer = %self.entry.signer, depth = self.depth, "release sign macro");
    }
}

/// Outcome of entering a sign wrapper
#[must_use = "the scope ends as soon as it is dropped"]
#[derive(Debug)]
pub enum SignScope {
    /// Validly signed: the subtree runs with the signer's rights
    Elevated(SignMacroGuard),
    /// Unsigned or tampered: the subtree runs as the guest user
    Demoted(EntryGuard),
}

impl SignScope {
    pub fn is_elevated(&self) -> bool {
        matches!(self, SignScope::Elevated(_))
    }

    /// Identity the subtree runs as
    pub fn identity(&self) -> &UserReference {
        match self {
            SignScope::Elevated(guard) => guard.identity(),
            SignScope::Demoted(guard) => guard.identity(),
        }
    }
}

// ============================================================================
// Request context
// ============================================================================

/// Everything a single render needs to know about the request
#[derive(Clone, Debug)]
pub struct RequestContext {
    user: Option<UserReference>,
    document: DocumentReference,
    authorization: AuthorizationContext,
}

impl RequestContext {
    /// New request with its own authorization state
    pub fn new(document: DocumentReference, user: Option<UserReference>) -> Self {
        Self {
            user,
            document,
            authorization: AuthorizationContext::new(),
        }
    }

    /// Current user, `None` for anonymous requests
    pub fn user(&self) -> Option<&UserReference> {
        self.user.as_ref()
    }

    pub fn document(&self) -> &DocumentReference {
        &self.document
    }

    pub fn authorization(&self) -> &AuthorizationContext {
        &self.authorization
    }

    /// Render of another document inside this request; shares the
    /// authorization state
    pub fn sub_render(&self, document: DocumentReference) -> RequestContext {
        Self {
            user: self.user.clone(),
            document,
            authorization: self.authorization.clone(),
        }
    }
}
