use serde::Serialize;

use super::recipient::Recipient;

/// The artifact handed to the delivery backend: a snapshot of the
/// recipient list plus the composed content. Built fresh at submission
/// time and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignPayload {
    pub recipients: Vec<Recipient>,
    pub content: String,
}
