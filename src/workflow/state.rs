//! The submit, confirm and cancel state machine shared by payments and purchases.
//!
//! Each transaction kind owns one [ConfirmationWorkflow] per browser session.
//! The machine is either idle or awaiting confirmation of exactly one draft:
//!
//! - `Submit` opens the confirmation dialog when its counter is newer than the
//!   last recorded one and nothing is pending. Re-sent clicks and clicks made
//!   while the dialog is open are ignored.
//! - `Confirm` hands the pending draft back for committing. The draft is taken
//!   out of the machine before the caller writes anything, so a second
//!   confirm can never commit the same draft twice.
//! - `Cancel` discards the pending draft and leaves the counter alone.

/// A user action on the task form or the confirmation dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<D> {
    /// The submit button was clicked `submit_count` times in total.
    Submit { submit_count: u64, draft: D },
    /// The confirm button of the dialog was clicked.
    Confirm { confirm_count: u64 },
    /// The cancel button of the dialog was clicked.
    Cancel,
}

/// What the caller should do after an [Action] has been dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<D> {
    /// Show the confirmation dialog.
    AwaitingConfirmation,
    /// Write the draft to the database and remove the dialog.
    Commit(D),
    /// Remove the dialog without writing anything.
    Cancelled,
    /// The action was a duplicate or arrived in the wrong state.
    Ignored,
}

/// The workflow state for one transaction kind in one session.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationWorkflow<D> {
    pending: Option<D>,
    last_submit_count: u64,
}

impl<D> Default for ConfirmationWorkflow<D> {
    fn default() -> Self {
        Self {
            pending: None,
            last_submit_count: 0,
        }
    }
}

impl<D> ConfirmationWorkflow<D> {
    /// Apply `action` and report what should happen next.
    pub fn dispatch(&mut self, action: Action<D>) -> Outcome<D> {
        match action {
            Action::Submit {
                submit_count,
                draft,
            } => {
                if submit_count <= self.last_submit_count || self.pending.is_some() {
                    return Outcome::Ignored;
                }

                self.last_submit_count = submit_count;
                self.pending = Some(draft);
                Outcome::AwaitingConfirmation
            }
            Action::Confirm { confirm_count } => {
                if confirm_count == 0 {
                    return Outcome::Ignored;
                }

                match self.pending.take() {
                    Some(draft) => Outcome::Commit(draft),
                    None => Outcome::Ignored,
                }
            }
            Action::Cancel => match self.pending.take() {
                Some(_) => Outcome::Cancelled,
                None => Outcome::Ignored,
            },
        }
    }

    /// Whether a draft is waiting for confirmation.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The counter value the next real click of the submit button must carry.
    pub fn next_submit_count(&self) -> u64 {
        self.last_submit_count.saturating_add(1)
    }
}
