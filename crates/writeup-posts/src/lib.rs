//! Post-level state around the editor: drafts and reactions.

pub mod draft;
pub mod reaction;

pub use draft::{Category, DraftError, Post, PostDraft, PostSubmission};
pub use reaction::{PendingToggle, Reaction, ReactionCell, ReactionError, ReactionKind, ReactionOp};
