use serde::Serialize;

use crate::domain::{
    AcquisitionMethod, BatchOutcome, CampaignPayload, Recipient, RecipientStore, RejectReason,
    TransitionError, WizardState,
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Everything the single operator session owns: the wizard position, the
/// recipient list and the composed content. The wizard gates which store
/// operations are legal; recipients can only be touched while collecting.
#[derive(Debug, Default)]
pub struct CampaignSession {
    wizard: WizardState,
    recipients: RecipientStore,
    content: String,
}

/// A serializable view of the session for the rendering collaborator.
#[derive(Debug, Serialize)]
pub struct CampaignSnapshot {
    pub step: u8,
    pub method: Option<AcquisitionMethod>,
    pub recipients: Vec<Recipient>,
    pub content: String,
}

impl CampaignSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u8 {
        self.wizard.step()
    }

    pub fn method(&self) -> Option<AcquisitionMethod> {
        self.wizard.method()
    }

    pub fn recipients(&self) -> &RecipientStore {
        &self.recipients
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_composing(&self) -> bool {
        matches!(self.wizard, WizardState::Compose { .. })
    }

    /// Moves to recipient collection, dropping anything left over from an
    /// earlier method choice.
    pub fn select_method(&mut self, method: AcquisitionMethod) -> Result<(), TransitionError> {
        self.wizard.select_method(method)?;
        self.recipients.clear();
        Ok(())
    }

    /// One step back. Backing out of collection abandons the method and
    /// the collected recipients; backing out of composition keeps both.
    pub fn back(&mut self) {
        let was_collecting = matches!(self.wizard, WizardState::CollectRecipients { .. });
        self.wizard.back();
        if was_collecting {
            self.recipients.clear();
        }
    }

    pub fn advance(&mut self) -> Result<(), TransitionError> {
        self.wizard.advance(!self.recipients.is_empty())
    }

    pub fn add_recipient(&mut self, candidate: &str) -> Result<(), SessionError> {
        self.ensure_collecting()?;
        self.recipients.add(candidate)?;
        Ok(())
    }

    pub fn add_recipients<I, S>(&mut self, candidates: I) -> Result<BatchOutcome, TransitionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_collecting()?;
        Ok(self.recipients.add_many(candidates))
    }

    pub fn remove_recipient(&mut self, index: usize) -> Result<(), TransitionError> {
        self.ensure_collecting()?;
        self.recipients.remove(index);
        Ok(())
    }

    pub fn remove_last_recipient(&mut self) -> Result<(), TransitionError> {
        self.ensure_collecting()?;
        self.recipients.remove_last();
        Ok(())
    }

    /// No validation on purpose: whether empty content may be submitted is
    /// the caller's affordance to disable, not an invariant here.
    pub fn set_content(&mut self, text: String) {
        self.content = text;
    }

    /// A by-value snapshot of the current list and content; later session
    /// mutations do not leak into an already built payload.
    pub fn build_payload(&self) -> CampaignPayload {
        CampaignPayload {
            recipients: self.recipients.as_slice().to_vec(),
            content: self.content.clone(),
        }
    }

    /// The reset after a successful dispatch: back to step one with the
    /// method, recipients and content all cleared.
    pub fn submit_succeeded(&mut self) -> Result<(), TransitionError> {
        self.wizard.submit_succeeded()?;
        self.recipients.clear();
        self.content.clear();
        Ok(())
    }

    pub fn snapshot(&self) -> CampaignSnapshot {
        CampaignSnapshot {
            step: self.step(),
            method: self.method(),
            recipients: self.recipients.as_slice().to_vec(),
            content: self.content.clone(),
        }
    }

    fn ensure_collecting(&self) -> Result<(), TransitionError> {
        match self.wizard {
            WizardState::CollectRecipients { .. } => Ok(()),
            _ => Err(TransitionError::WrongStep(self.step())),
        }
    }
}
