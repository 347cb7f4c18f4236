// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::{info, warn};

use crate::forms::{FieldName, FormState};
use crate::notify::Notification;
use crate::{DraftId, FormKind, InvoiceDraft, SendChannels};

pub const DRAFT_SAVED_MESSAGE: &str = "Draft saved.";
pub const RECURRING_SUBMITTED_MESSAGE: &str = "Form submitted successfully!";
pub const FIX_ERRORS_MESSAGE: &str = "Please fix the errors before submitting.";

/// Persists an invoice without sending it.
pub trait DraftStore {
    fn save_draft(&mut self, draft: &InvoiceDraft) -> Result<DraftId>;
}

/// Delivers an invoice to the customer over the selected channels.
pub trait InvoiceSender {
    fn send(&mut self, draft: &InvoiceDraft, channels: SendChannels) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    Send(SendChannels),
    SaveDraft,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitBlocked {
    pub kind: FormKind,
    pub invalid: Vec<FieldName>,
}

impl SubmitBlocked {
    /// The one-off form stays silent on a blocked submit; the recurring form
    /// raises a toast.
    pub fn notification(&self) -> Option<Notification> {
        match self.kind {
            FormKind::OneOff => None,
            FormKind::Recurring => Some(Notification::error(FIX_ERRORS_MESSAGE)),
        }
    }
}

impl std::fmt::Display for SubmitBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self
            .invalid
            .iter()
            .map(|field| field.label())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} has invalid fields: {names}", self.kind.title())
    }
}

impl std::error::Error for SubmitBlocked {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Sent(SendChannels),
    SendFailed { channels: SendChannels, error: String },
    SavedDraft(DraftId),
    DraftFailed(String),
    Confirmed,
}

impl Submission {
    pub fn notification(&self) -> Notification {
        match self {
            Self::Sent(channels) => {
                Notification::success(format!("Invoice sent via {}.", channels.describe()))
            }
            Self::SendFailed { channels, error } => Notification::error(format!(
                "Send failed via {}: {error}",
                channels.describe()
            )),
            Self::SavedDraft(_) => Notification::success(DRAFT_SAVED_MESSAGE),
            Self::DraftFailed(error) => Notification::error(format!("Draft save failed: {error}")),
            Self::Confirmed => Notification::success(RECURRING_SUBMITTED_MESSAGE),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Sent(_) | Self::SavedDraft(_) | Self::Confirmed)
    }
}

/// Decides what a submit would do without touching any collaborator.
pub fn plan_submit(form: &FormState) -> Result<SubmitAction, SubmitBlocked> {
    if !form.is_valid() {
        return Err(SubmitBlocked {
            kind: form.kind(),
            invalid: form.invalid_fields(),
        });
    }
    Ok(match form.kind() {
        FormKind::Recurring => SubmitAction::Confirm,
        FormKind::OneOff if form.send_via.any() => SubmitAction::Send(form.send_via),
        FormKind::OneOff => SubmitAction::SaveDraft,
    })
}

fn store_draft(form: &FormState, store: &mut dyn DraftStore) -> Submission {
    match store.save_draft(&form.to_draft()) {
        Ok(id) => {
            info!(draft_id = id.get(), kind = ?form.kind(), "draft saved");
            Submission::SavedDraft(id)
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "draft save failed");
            Submission::DraftFailed(format!("{error:#}"))
        }
    }
}

/// Saves the form as a draft regardless of validity.
pub fn save_draft(form: &FormState, store: &mut dyn DraftStore) -> Notification {
    store_draft(form, store).notification()
}

pub fn submit(
    form: &FormState,
    store: &mut dyn DraftStore,
    sender: &mut dyn InvoiceSender,
) -> Result<Submission, SubmitBlocked> {
    let submission = match plan_submit(form)? {
        SubmitAction::Confirm => Submission::Confirmed,
        SubmitAction::SaveDraft => store_draft(form, store),
        SubmitAction::Send(channels) => match sender.send(&form.to_draft(), channels) {
            Ok(()) => {
                info!(channels = %channels.describe(), "invoice sent");
                Submission::Sent(channels)
            }
            Err(error) => {
                let error = format!("{error:#}");
                warn!(channels = %channels.describe(), error = %error, "send failed");
                Submission::SendFailed { channels, error }
            }
        },
    };
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow};

    use super::{
        DRAFT_SAVED_MESSAGE, DraftStore, FIX_ERRORS_MESSAGE, InvoiceSender,
        RECURRING_SUBMITTED_MESSAGE, SubmitAction, Submission, plan_submit, save_draft, submit,
    };
    use crate::forms::{FieldName, FormState};
    use crate::notify::NotificationLevel;
    use crate::{Channel, DraftId, FormKind, InvoiceDraft, SendChannels};

    #[derive(Default)]
    struct RecordingStore {
        saved: Vec<InvoiceDraft>,
        fail: bool,
    }

    impl DraftStore for RecordingStore {
        fn save_draft(&mut self, draft: &InvoiceDraft) -> Result<DraftId> {
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            self.saved.push(draft.clone());
            Ok(DraftId::new(self.saved.len() as i64))
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Vec<(InvoiceDraft, SendChannels)>,
        fail: bool,
    }

    impl InvoiceSender for RecordingSender {
        fn send(&mut self, draft: &InvoiceDraft, channels: SendChannels) -> Result<()> {
            if self.fail {
                return Err(anyhow!("gateway returned 502"));
            }
            self.sent.push((draft.clone(), channels));
            Ok(())
        }
    }

    fn set(form: &mut FormState, field: FieldName, value: &str) -> bool {
        form.update_field(field, value).expect("owned field")
    }

    fn valid_one_off() -> FormState {
        let mut form = FormState::new(FormKind::OneOff);
        set(&mut form, FieldName::Mobile, "36112233");
        set(&mut form, FieldName::Email, "a@b.com");
        form
    }

    #[test]
    fn valid_one_off_without_channels_saves_draft() {
        let form = valid_one_off();
        let mut store = RecordingStore::default();
        let mut sender = RecordingSender::default();

        assert_eq!(plan_submit(&form), Ok(SubmitAction::SaveDraft));
        let outcome = submit(&form, &mut store, &mut sender).expect("valid form");
        assert_eq!(outcome, Submission::SavedDraft(DraftId::new(1)));
        assert_eq!(store.saved.len(), 1);
        assert!(sender.sent.is_empty());
        assert_eq!(outcome.notification().message, DRAFT_SAVED_MESSAGE);
    }

    #[test]
    fn valid_one_off_with_sms_sends() {
        let mut form = valid_one_off();
        form.set_channel(Channel::Sms, true);
        let mut store = RecordingStore::default();
        let mut sender = RecordingSender::default();

        let outcome = submit(&form, &mut store, &mut sender).expect("valid form");
        assert!(outcome.succeeded());
        assert!(store.saved.is_empty());
        assert_eq!(sender.sent.len(), 1);
        assert!(sender.sent[0].1.sms);
        assert_eq!(sender.sent[0].0.mobile, "36112233");
        assert_eq!(outcome.notification().message, "Invoice sent via SMS.");
    }

    #[test]
    fn invalid_form_is_blocked_before_collaborators() {
        let mut form = FormState::new(FormKind::OneOff);
        set(&mut form, FieldName::Mobile, "36112233");
        form.set_channel(Channel::Email, true);
        let mut store = RecordingStore::default();
        let mut sender = RecordingSender::default();

        let blocked = submit(&form, &mut store, &mut sender).expect_err("email missing");
        assert_eq!(blocked.invalid, vec![FieldName::Email]);
        assert_eq!(blocked.notification(), None);
        assert!(store.saved.is_empty());
        assert!(sender.sent.is_empty());
    }

    #[test]
    fn recurring_submit_confirms_without_sending() {
        let mut form = FormState::new(FormKind::Recurring);
        set(&mut form, FieldName::Mobile, "36112233");
        set(&mut form, FieldName::Email, "a@b.com");
        set(&mut form, FieldName::CustomerName, "John");
        form.set_channel(Channel::Sms, true);
        let mut store = RecordingStore::default();
        let mut sender = RecordingSender::default();

        let outcome = submit(&form, &mut store, &mut sender).expect("valid form");
        assert_eq!(outcome, Submission::Confirmed);
        assert_eq!(outcome.notification().message, RECURRING_SUBMITTED_MESSAGE);
        assert!(sender.sent.is_empty());
        assert!(store.saved.is_empty());
    }

    #[test]
    fn recurring_blocked_submit_raises_toast() {
        let form = FormState::new(FormKind::Recurring);
        let blocked = plan_submit(&form).expect_err("empty form");
        let toast = blocked.notification().expect("recurring toast");
        assert_eq!(toast.level, NotificationLevel::Error);
        assert_eq!(toast.message, FIX_ERRORS_MESSAGE);
        assert!(blocked.to_string().contains("Customer Name"));
    }

    #[test]
    fn save_draft_ignores_validity() {
        let form = FormState::new(FormKind::Recurring);
        let mut store = RecordingStore::default();
        let toast = save_draft(&form, &mut store);
        assert_eq!(toast.level, NotificationLevel::Success);
        assert_eq!(store.saved.len(), 1);
        assert!(store.saved[0].schedule.is_some());
    }

    #[test]
    fn failures_surface_as_error_toasts() {
        let form = valid_one_off();
        let mut store = RecordingStore {
            fail: true,
            ..RecordingStore::default()
        };
        let toast = save_draft(&form, &mut store);
        assert!(toast.is_error());
        assert!(toast.message.contains("disk full"));

        let mut form = valid_one_off();
        form.set_channel(Channel::Whatsapp, true);
        form.set_channel(Channel::Email, true);
        let mut sender = RecordingSender {
            fail: true,
            ..RecordingSender::default()
        };
        let outcome = submit(&form, &mut store, &mut sender).expect("valid form");
        assert!(!outcome.succeeded());
        let message = outcome.notification().message;
        assert!(
            message.starts_with("Send failed via Email, WhatsApp"),
            "{message}"
        );
    }
}
