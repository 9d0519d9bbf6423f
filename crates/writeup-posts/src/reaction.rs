//! Likes and bookmarks with optimistic updates.

use std::fmt::Display;
use std::future::Future;

use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Bookmark,
}

/// Backend call a toggle performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOp {
    Add,
    Remove,
}

#[derive(thiserror::Error, Debug, miette::Diagnostic, Clone, PartialEq, Eq)]
pub enum ReactionError {
    #[error("a toggle is already in flight")]
    #[diagnostic(code(writeup::reaction::pending))]
    Pending,

    #[error("sign in to react to posts")]
    #[diagnostic(code(writeup::reaction::signed_out))]
    SignedOut,

    #[error("reaction update failed: {0}")]
    #[diagnostic(code(writeup::reaction::backend))]
    Backend(String),
}

/// Local view of one reaction on one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reaction {
    pub count: u32,
    /// Whether the signed-in user has reacted.
    pub active: bool,
    pub pending: bool,
}

/// Token for an optimistic toggle that still has to be settled.
#[derive(Debug)]
#[must_use = "settle the toggle or the reaction stays pending"]
pub struct PendingToggle {
    previous: Reaction,
    op: ReactionOp,
}

impl PendingToggle {
    pub fn op(&self) -> ReactionOp {
        self.op
    }
}

impl Reaction {
    pub fn new(count: u32, active: bool) -> Self {
        Self {
            count,
            active,
            pending: false,
        }
    }

    /// Flip the local state ahead of the backend call.
    pub fn begin(&mut self, signed_in: bool) -> Result<PendingToggle, ReactionError> {
        if !signed_in {
            return Err(ReactionError::SignedOut);
        }
        if self.pending {
            return Err(ReactionError::Pending);
        }
        let previous = *self;
        let op = if self.active {
            self.count = self.count.saturating_sub(1);
            ReactionOp::Remove
        } else {
            self.count = self.count.saturating_add(1);
            ReactionOp::Add
        };
        self.active = !self.active;
        self.pending = true;
        Ok(PendingToggle { previous, op })
    }

    /// Finish a toggle. A failed backend call restores the state from
    /// before [`begin`](Self::begin).
    pub fn settle<E: Display>(
        &mut self,
        toggle: PendingToggle,
        result: Result<(), E>,
    ) -> Result<(), ReactionError> {
        match result {
            Ok(()) => {
                self.pending = false;
                Ok(())
            }
            Err(err) => {
                *self = toggle.previous;
                Err(ReactionError::Backend(err.to_string()))
            }
        }
    }
}

/// A reaction shared between the button and the in-flight backend call.
#[derive(Debug)]
pub struct ReactionCell {
    kind: ReactionKind,
    state: Mutex<Reaction>,
}

impl ReactionCell {
    pub fn new(kind: ReactionKind, reaction: Reaction) -> Self {
        Self {
            kind,
            state: Mutex::new(reaction),
        }
    }

    pub fn kind(&self) -> ReactionKind {
        self.kind
    }

    pub async fn get(&self) -> Reaction {
        *self.state.lock().await
    }

    /// Optimistically toggle and run `op` against the backend.
    ///
    /// The lock is not held while `op` runs, so readers see the optimistic
    /// state and a second toggle is refused with [`ReactionError::Pending`].
    pub async fn toggle<F, Fut, E>(&self, signed_in: bool, op: F) -> Result<Reaction, ReactionError>
    where
        F: FnOnce(ReactionOp) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let toggle = self.state.lock().await.begin(signed_in)?;
        let result = op(toggle.op()).await;

        let mut state = self.state.lock().await;
        if let Err(err) = &result {
            tracing::warn!(kind = ?self.kind, error = %err, "reaction update failed, rolling back");
        }
        state.settle(toggle, result)?;
        Ok(*state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn optimistic_like_then_commit() {
        let cell = ReactionCell::new(ReactionKind::Like, Reaction::new(3, false));
        let state = cell
            .toggle(true, |op| async move {
                assert_eq!(op, ReactionOp::Add);
                Ok::<_, String>(())
            })
            .await
            .unwrap();
        assert_eq!(state, Reaction::new(4, true));
    }

    #[tokio::test]
    async fn failure_rolls_back() {
        let cell = ReactionCell::new(ReactionKind::Bookmark, Reaction::new(1, true));
        let err = cell
            .toggle(true, |op| async move {
                assert_eq!(op, ReactionOp::Remove);
                Err("permission denied")
            })
            .await
            .unwrap_err();
        assert_eq!(err, ReactionError::Backend("permission denied".to_owned()));
        assert_eq!(cell.get().await, Reaction::new(1, true));
    }

    #[tokio::test]
    async fn signed_out_users_cannot_react() {
        let cell = ReactionCell::new(ReactionKind::Like, Reaction::new(0, false));
        let err = cell
            .toggle(false, |_| async { Ok::<_, String>(()) })
            .await
            .unwrap_err();
        assert_eq!(err, ReactionError::SignedOut);
        assert_eq!(cell.get().await, Reaction::new(0, false));
    }

    #[tokio::test]
    async fn second_toggle_is_refused_while_pending() {
        let cell = Arc::new(ReactionCell::new(ReactionKind::Like, Reaction::new(0, false)));
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let cell = Arc::clone(&cell);
            async move {
                cell.toggle(true, |_| async move {
                    let _ = wait.await;
                    Ok::<_, String>(())
                })
                .await
            }
        };
        let second = async {
            tokio::task::yield_now().await;
            let seen = cell.get().await;
            let refused = cell
                .toggle(true, |_| async { Ok::<_, String>(()) })
                .await;
            let _ = release.send(());
            (seen, refused)
        };

        let (first, (seen, refused)) = tokio::join!(first, second);
        assert_eq!(
            seen,
            Reaction {
                count: 1,
                active: true,
                pending: true
            }
        );
        assert_eq!(refused, Err(ReactionError::Pending));
        assert_eq!(first.unwrap(), Reaction::new(1, true));
    }

    #[test]
    fn count_never_underflows() {
        let mut reaction = Reaction::new(0, true);
        let toggle = reaction.begin(true).unwrap();
        assert_eq!(reaction.count, 0);
        reaction.settle(toggle, Ok::<_, String>(())).unwrap();
        assert!(!reaction.active);
    }
}
