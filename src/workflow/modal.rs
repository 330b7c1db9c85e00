//! The confirmation dialog and the fragments that dismiss it.

use maud::{Markup, html};

use crate::{
    html::{BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE},
    workflow::TransactionKind,
};

/// The dialog asking the user to confirm or cancel a submitted `kind`.
///
/// It is swapped into the kind's modal container by the submit endpoint, and
/// rendered there by the task page while a draft is still pending. Both
/// buttons target that same container, so an empty response removes the dialog.
pub fn confirmation_modal(kind: TransactionKind) -> Markup {
    let modal_target = format!("#{}", kind.modal_id());
    let noun = kind.as_str().to_lowercase();

    html! {
        div
            class="fixed inset-0 z-50 flex items-center justify-center bg-gray-900/50"
            role="dialog"
            aria-modal="true"
            aria-labelledby="confirm-title"
        {
            div class="w-full max-w-md p-6 space-y-4 bg-white rounded-lg shadow dark:bg-gray-800"
            {
                h2 id="confirm-title" class="text-xl font-bold text-gray-900 dark:text-white"
                {
                    "Confirm Submission"
                }

                p class="text-gray-700 dark:text-gray-300"
                {
                    "Are you sure you want to submit this " (noun) "?"
                }

                div class="flex gap-4"
                {
                    button
                        type="button"
                        hx-post=(kind.confirm_endpoint())
                        hx-vals=r#"{"confirm_count": 1}"#
                        hx-target=(modal_target)
                        hx-swap="innerHTML"
                        hx-target-error="#alert-container"
                        hx-disabled-elt="this"
                        class=(BUTTON_PRIMARY_STYLE)
                    {
                        "Yes, Confirm"
                    }

                    button
                        type="button"
                        hx-post=(kind.cancel_endpoint())
                        hx-target=(modal_target)
                        hx-swap="innerHTML"
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Cancel"
                    }
                }
            }
        }
    }
}

/// An out-of-band replacement for the kind's hidden submit counter.
pub fn submit_count_input(kind: TransactionKind, next_submit_count: u64, oob: bool) -> Markup {
    html! {
        input
            type="hidden"
            id=(kind.submit_count_id())
            name="submit_count"
            value=(next_submit_count)
            hx-swap-oob=[oob.then_some("true")];
    }
}
