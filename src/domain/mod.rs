mod campaign_email;
mod payload;
mod recipient;
mod recipient_store;
mod wizard;

pub use campaign_email::{CampaignEmail, is_valid_address};
pub use payload::CampaignPayload;
pub use recipient::Recipient;
pub use recipient_store::{BatchOutcome, RecipientStore, RejectReason};
pub use wizard::{AcquisitionMethod, TransitionError, WizardState};
