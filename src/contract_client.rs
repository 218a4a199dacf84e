//! Typed boundary to the backend contract endpoints
//!
//! Pure I/O: every method maps one REST call, decodes the payload, and maps
//! non-success statuses onto the error taxonomy. No decisions are made here
//! and no mutation is ever retried on an ambiguous failure; the server
//! rejects duplicate transitions with 409 and the user re-triggers manually.

use reqwest::{RequestBuilder, Response};
use uuid::Uuid;

use crate::error::CoordinatorError;
use crate::models::{ConfirmRequest, Contract, InitiateRequest};

/// HTTP client for the contract lifecycle operations.
pub struct ContractClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl ContractClient {
    pub fn new(base_url: String, bearer_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Fetch a single contract. `NotFound` covers both an invalid id and a
    /// caller without visibility (not buyer or seller).
    pub async fn get_contract(&self, id: Uuid) -> Result<Contract, CoordinatorError> {
        let response = self
            .authorize(self.http.get(self.url(&format!("/contracts/{id}"))))
            .send()
            .await?;
        decode_contract(response).await
    }

    /// Seller-only: create or transition a contract into awaiting
    /// confirmation. The backend notifies the buyer out-of-band.
    pub async fn initiate_confirmation(
        &self,
        listing_id: Uuid,
        conversation_id: Uuid,
        request: &InitiateRequest,
    ) -> Result<(), CoordinatorError> {
        let path = format!("/posts/{listing_id}/conversations/{conversation_id}/confirm");
        let response = self
            .authorize(self.http.post(self.url(&path)).json(request))
            .send()
            .await?;
        expect_empty(response).await
    }

    /// Buyer-only confirmation of receipt, with an optional note.
    pub async fn confirm_by_buyer(
        &self,
        contract_id: Uuid,
        request: &ConfirmRequest,
    ) -> Result<Contract, CoordinatorError> {
        self.confirm(contract_id, "confirm-buyer", request).await
    }

    /// Seller-only confirmation, symmetric to the buyer's.
    pub async fn confirm_by_seller(
        &self,
        contract_id: Uuid,
        request: &ConfirmRequest,
    ) -> Result<Contract, CoordinatorError> {
        self.confirm(contract_id, "confirm-seller", request).await
    }

    async fn confirm(
        &self,
        contract_id: Uuid,
        action: &str,
        request: &ConfirmRequest,
    ) -> Result<Contract, CoordinatorError> {
        let path = format!("/contracts/{contract_id}/{action}");
        let response = self
            .authorize(self.http.post(self.url(&path)).json(request))
            .send()
            .await?;
        decode_contract(response).await
    }

    /// Buyer-only shorthand used on the chat confirmation card; semantically
    /// a note-less buyer confirmation. Returns no record; the realtime
    /// completion event (or a refetch) updates the cached contract.
    pub async fn agree_to_contract(&self, contract_id: Uuid) -> Result<(), CoordinatorError> {
        let path = format!("/contracts/{contract_id}/agree");
        let response = self
            .authorize(self.http.post(self.url(&path)))
            .send()
            .await?;
        expect_empty(response).await
    }

    /// Seller-only, irreversible transition to FORFEITED_EXTERNAL.
    pub async fn forfeit_external(&self, contract_id: Uuid) -> Result<Contract, CoordinatorError> {
        let path = format!("/contracts/{contract_id}/forfeit-external");
        let response = self
            .authorize(self.http.post(self.url(&path)))
            .send()
            .await?;
        decode_contract(response).await
    }
}

async fn decode_contract(response: Response) -> Result<Contract, CoordinatorError> {
    if let Some(err) = CoordinatorError::from_status(response.status()) {
        return Err(err);
    }
    let response = response.error_for_status()?;
    Ok(response.json::<Contract>().await?)
}

async fn expect_empty(response: Response) -> Result<(), CoordinatorError> {
    if let Some(err) = CoordinatorError::from_status(response.status()) {
        return Err(err);
    }
    response.error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ContractClient::new("http://localhost:3001/api/".into(), None);
        let id = Uuid::nil();
        assert_eq!(
            client.url(&format!("/contracts/{id}")),
            format!("http://localhost:3001/api/contracts/{id}")
        );
    }

    #[test]
    fn initiate_path_shape() {
        let client = ContractClient::new("http://localhost:3001/api".into(), None);
        let listing = Uuid::nil();
        let conversation = Uuid::nil();
        let path = format!("/posts/{listing}/conversations/{conversation}/confirm");
        assert_eq!(
            client.url(&path),
            format!("http://localhost:3001/api/posts/{listing}/conversations/{conversation}/confirm")
        );
    }
}
