//! Horizon API Client
//!
//! HTTP access to account, claimable balance and transaction endpoints.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::types::{
    HorizonAccount, HorizonClaimableBalance, HorizonPage, HorizonProblem,
    HorizonTransactionSuccess,
};
use super::{HorizonError, LedgerApi};
use crate::account::AccountSnapshot;
use crate::common::config::DEFAULT_PAGE_LIMIT;
use crate::discover::ClaimableBalance;
use crate::page::{Page, PageLink};
use crate::submit::SubmissionResult;

/// Horizon API endpoints
pub const PUBLIC_URL: &str = "https://horizon.stellar.org";
pub const TESTNET_URL: &str = "https://horizon-testnet.stellar.org";

/// Horizon HTTP client
#[derive(Debug, Clone)]
pub struct HorizonClient {
    client: Client,
    base_url: String,
    page_limit: u32,
}

impl HorizonClient {
    /// Create a new client with custom URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Create a client for the public network
    pub fn new_public() -> Self {
        Self::new(PUBLIC_URL)
    }

    /// Create a client for testnet
    pub fn new_testnet() -> Self {
        Self::new(TESTNET_URL)
    }

    /// Records requested per collection page
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    fn claimable_balances_url(&self, claimant: &str) -> String {
        format!(
            "{}/claimable_balances?claimant={}&order=asc&limit={}",
            self.base_url, claimant, self.page_limit
        )
    }

    /// GET a JSON resource; 404 maps to `NotFound(what)`
    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, HorizonError> {
        tracing::debug!(target: "claimsweep::horizon", %url, "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        parse_resource(status, &body, what)
    }

    async fn get_balances_page(&self, url: &str) -> Result<Page<ClaimableBalance>, HorizonError> {
        let page: HorizonPage<HorizonClaimableBalance> =
            self.get_json(url, "claimable balances").await.map_err(|e| match e {
                HorizonError::MalformedResponse(msg) => HorizonError::MalformedPage(msg),
                other => other,
            })?;
        page.into_page(ClaimableBalance::try_from)
    }
}

#[async_trait]
impl LedgerApi for HorizonClient {
    async fn account(&self, account_id: &str) -> Result<AccountSnapshot, HorizonError> {
        let url = format!("{}/accounts/{}", self.base_url, account_id);
        let account: HorizonAccount = self
            .get_json(&url, &format!("account {}", account_id))
            .await?;
        AccountSnapshot::try_from(account)
    }

    async fn claimable_balances(
        &self,
        claimant: &str,
    ) -> Result<Page<ClaimableBalance>, HorizonError> {
        let url = self.claimable_balances_url(claimant);
        self.get_balances_page(&url).await
    }

    async fn claimable_balances_page(
        &self,
        link: &PageLink,
    ) -> Result<Page<ClaimableBalance>, HorizonError> {
        self.get_balances_page(link.href()).await
    }

    async fn submit_transaction(&self, envelope: &str) -> Result<SubmissionResult, HorizonError> {
        let url = format!("{}/transactions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .form(&[("tx", envelope)])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        classify_submission(status, &body)
    }
}

/// Decode a GET response; 404 maps to `NotFound(what)`
fn parse_resource<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    what: &str,
) -> Result<T, HorizonError> {
    if status == StatusCode::NOT_FOUND {
        return Err(HorizonError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        return Err(HorizonError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    serde_json::from_str(body)
        .map_err(|e| HorizonError::MalformedResponse(format!("{}: {}", what, e)))
}

/// Turn a `POST /transactions` response into a verdict or an error
///
/// Only a 400 problem document carrying result codes is a ledger verdict;
/// anything else (timeouts, rate limits, bad gateways, malformed envelopes)
/// is an error.
fn classify_submission(status: StatusCode, body: &str) -> Result<SubmissionResult, HorizonError> {
    if status.is_success() {
        let success: HorizonTransactionSuccess = serde_json::from_str(body)
            .map_err(|e| HorizonError::MalformedResponse(format!("submission: {}", e)))?;
        return Ok(SubmissionResult::Accepted {
            hash: success.hash,
            ledger: success.ledger,
            result_xdr: success.result_xdr.unwrap_or_default(),
        });
    }

    if status == StatusCode::BAD_REQUEST {
        let extras = serde_json::from_str::<HorizonProblem>(body)
            .ok()
            .and_then(|p| p.extras);
        if let Some(extras) = extras {
            if let Some(codes) = extras.result_codes {
                return Ok(SubmissionResult::Rejected {
                    transaction_code: codes.transaction,
                    operation_codes: codes.operations,
                    result_xdr: extras.result_xdr.unwrap_or_default(),
                });
            }
        }
    }

    Err(HorizonError::Status {
        status: status.as_u16(),
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_urls() {
        let public = HorizonClient::new_public();
        assert_eq!(public.base_url(), PUBLIC_URL);

        let testnet = HorizonClient::new_testnet();
        assert_eq!(testnet.base_url(), TESTNET_URL);

        let custom = HorizonClient::new("http://localhost:8000/");
        assert_eq!(custom.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_claimable_balances_query() {
        let client = HorizonClient::new_testnet().with_page_limit(50);
        assert_eq!(
            client.claimable_balances_url("GACC"),
            "https://horizon-testnet.stellar.org/claimable_balances?claimant=GACC&order=asc&limit=50"
        );
    }

    const REJECTED: &str = r#"{
        "type": "https://stellar.org/horizon-errors/transaction_failed",
        "title": "Transaction Failed",
        "status": 400,
        "extras": {
            "envelope_xdr": "AAAA",
            "result_codes": {
                "transaction": "tx_failed",
                "operations": ["op_success", "op_underfunded"]
            },
            "result_xdr": "AAAAAAAAAGT/////AAAAAQAAAAAAAAAB////+wAAAAA="
        }
    }"#;

    const MALFORMED: &str = r#"{
        "type": "https://stellar.org/horizon-errors/transaction_malformed",
        "title": "Transaction Malformed",
        "status": 400,
        "extras": {
            "envelope_xdr": "garbage"
        }
    }"#;

    #[test]
    fn test_accepted_submission() {
        let body = r#"{"hash": "3389e9f0", "ledger": 7654321, "result_xdr": "AAAAAAAAAGQAAAAA"}"#;
        let result = classify_submission(StatusCode::OK, body).unwrap();
        assert_eq!(
            result,
            SubmissionResult::Accepted {
                hash: "3389e9f0".to_string(),
                ledger: 7654321,
                result_xdr: "AAAAAAAAAGQAAAAA".to_string(),
            }
        );
    }

    #[test]
    fn test_result_codes_are_a_rejection() {
        let result = classify_submission(StatusCode::BAD_REQUEST, REJECTED).unwrap();
        assert_eq!(
            result,
            SubmissionResult::Rejected {
                transaction_code: "tx_failed".to_string(),
                operation_codes: vec!["op_success".to_string(), "op_underfunded".to_string()],
                result_xdr: "AAAAAAAAAGT/////AAAAAQAAAAAAAAAB////+wAAAAA=".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_envelope_is_an_error() {
        let result = classify_submission(StatusCode::BAD_REQUEST, MALFORMED);
        assert!(matches!(result, Err(HorizonError::Status { status: 400, .. })));
    }

    #[test]
    fn test_gateway_timeout_is_an_error() {
        let result = classify_submission(StatusCode::GATEWAY_TIMEOUT, "upstream timed out");
        match result {
            Err(e @ HorizonError::Status { status: 504, .. }) => assert!(e.is_retryable()),
            other => panic!("expected 504 status error, got {:?}", other),
        }

        // result codes only count on a 400
        let result = classify_submission(StatusCode::INTERNAL_SERVER_ERROR, REJECTED);
        assert!(matches!(result, Err(HorizonError::Status { status: 500, .. })));
    }

    #[test]
    fn test_garbled_success_body() {
        let result = classify_submission(StatusCode::OK, "<html>");
        assert!(matches!(result, Err(HorizonError::MalformedResponse(_))));
    }

    #[test]
    fn test_resource_status_mapping() {
        let missing: Result<serde_json::Value, _> =
            parse_resource(StatusCode::NOT_FOUND, r#"{"status": 404}"#, "account GX");
        match missing {
            Err(HorizonError::NotFound(what)) => assert_eq!(what, "account GX"),
            other => panic!("expected NotFound, got {:?}", other),
        }

        let limited: Result<serde_json::Value, _> =
            parse_resource(StatusCode::TOO_MANY_REQUESTS, "slow down", "account GX");
        assert!(matches!(limited, Err(HorizonError::Status { status: 429, .. })));

        let garbled: Result<serde_json::Value, _> =
            parse_resource(StatusCode::OK, "not json", "account GX");
        assert!(matches!(garbled, Err(HorizonError::MalformedResponse(_))));

        let ok: serde_json::Value =
            parse_resource(StatusCode::OK, r#"{"id": "GX"}"#, "account GX").unwrap();
        assert_eq!(ok["id"], "GX");
    }

    #[tokio::test]
    #[ignore = "Requires network access to Horizon testnet"]
    async fn test_unknown_account_is_not_found() {
        let client = HorizonClient::new_testnet();
        let account = crate::keys::encode_account_id(&[0u8; 32]);
        let result = client.account(&account).await;
        assert!(matches!(result, Err(HorizonError::NotFound(_))));
    }
}
