use serde::Serialize;

use super::campaign_email::CampaignEmail;
use super::recipient::Recipient;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RejectReason {
    #[error("not a valid email address")]
    InvalidFormat,
    #[error("recipient already in the list")]
    Duplicate,
}

/// What happened to each candidate of a bulk insertion, in input order.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BatchOutcome {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
}

/// The ordered, duplicate-free recipient list for the active session.
/// Insertion order is display order only; identity is the lower-cased
/// address.
#[derive(Debug, Default)]
pub struct RecipientStore {
    recipients: Vec<Recipient>,
}

impl RecipientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, candidate: &str) -> Result<(), RejectReason> {
        let email = CampaignEmail::parse(candidate.to_owned())
            .map_err(|_| RejectReason::InvalidFormat)?;
        if self.contains(&email) {
            return Err(RejectReason::Duplicate);
        }
        self.recipients.push(Recipient { email });
        Ok(())
    }

    /// Accept-what-you-can: invalid or duplicate candidates (including
    /// duplicates within the batch itself) are skipped, earlier successful
    /// additions are never rolled back.
    pub fn add_many<I, S>(&mut self, candidates: I) -> BatchOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = BatchOutcome {
            added: Vec::new(),
            skipped: Vec::new(),
        };
        for candidate in candidates {
            let candidate = candidate.as_ref();
            match self.add(candidate) {
                Ok(()) => outcome.added.push(candidate.to_owned()),
                Err(_) => outcome.skipped.push(candidate.to_owned()),
            }
        }
        outcome
    }

    /// Removes by position; out-of-range indexes are a silent no-op.
    pub fn remove(&mut self, index: usize) {
        if index < self.recipients.len() {
            self.recipients.remove(index);
        }
    }

    /// Backspace-to-delete-last; no-op when empty.
    pub fn remove_last(&mut self) {
        self.recipients.pop();
    }

    pub fn clear(&mut self) {
        self.recipients.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn as_slice(&self) -> &[Recipient] {
        &self.recipients
    }

    fn contains(&self, email: &CampaignEmail) -> bool {
        self.recipients.iter().any(|r| &r.email == email)
    }
}
