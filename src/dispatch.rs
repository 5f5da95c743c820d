use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::CampaignPayload;

/// Client for the delivery backend. One request at a time is enforced at
/// the call site; this type only knows the wire contract.
#[derive(Debug, Clone)]
pub struct DispatchClient {
    http_client: Client,
    base_url: String,
    authorization_token: SecretString,
}

impl DispatchClient {
    pub fn new(
        base_url: String,
        authorization_token: SecretString,
        timeout: std::time::Duration,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build the dispatch http client");
        Self {
            http_client,
            base_url,
            authorization_token,
        }
    }

    /// POSTs the payload to the backend. Any 2xx counts as accepted; the
    /// response body is not inspected. No retries.
    pub async fn send_campaign(&self, payload: &CampaignPayload) -> Result<(), reqwest::Error> {
        let url = format!("{}/api/send-email", self.base_url);
        self.http_client
            .post(&url)
            .bearer_auth(self.authorization_token.expose_secret())
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
