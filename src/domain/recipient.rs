use serde::Serialize;

use super::campaign_email::CampaignEmail;

/// A single validated entry in the recipient list. Serializes to the
/// `{"email": "<string>"}` shape the delivery backend expects.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Recipient {
    pub email: CampaignEmail,
}
