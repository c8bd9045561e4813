//! Asaas payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the Asaas v3 REST API.
//!
//! # Protocol
//!
//! - API key sent in the `access_token` header
//! - JSON request and response bodies
//! - Lookups by correlation use `GET /<resource>?externalReference=...`,
//!   answered with a `{"data": [...]}` envelope
//! - Failures answer with `{"errors": [{"code", "description"}]}`
//!
//! # Configuration
//!
//! ```ignore
//! let config = AsaasConfig::new(api_key).with_base_url("https://sandbox.asaas.com/api/v3");
//! let adapter = AsaasGatewayAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::foundation::GatewayId;
use crate::ports::{
    GatewayCharge, GatewayCustomer, GatewayError, GatewayErrorCode, GatewayInvoice,
    GatewaySubscription, NewCharge, NewCustomer, NewInvoice, NewSubscription, PaymentGateway,
};

use super::wire_types::{
    ChargeRequest, ChargeResponse, CustomerRequest, CustomerResponse, DeletedResponse, ErrorBody,
    InvoiceRequest, InvoiceResponse, ListResponse, SubscriptionRequest, SubscriptionResponse,
    UpdateReferenceRequest,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.asaas.com/v3";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Asaas API configuration.
#[derive(Clone)]
pub struct AsaasConfig {
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl AsaasConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom API base URL (sandbox, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Upper bound for a single gateway call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Asaas gateway adapter.
pub struct AsaasGatewayAdapter {
    config: AsaasConfig,
    http_client: reqwest::Client,
}

impl AsaasGatewayAdapter {
    pub fn new(config: AsaasConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Sends a request and decodes a successful body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, GatewayError> {
        let response = request
            .header("access_token", self.config.api_key.expose_secret().as_str())
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &body);
            tracing::warn!(
                operation,
                http_status = status.as_u16(),
                error = %err,
                "Asaas request failed"
            );
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to decode Asaas response");
            GatewayError::invalid_response(format!("{}: {}", operation, e))
        })
    }

    /// First record of `resource` whose external reference is `reference`.
    async fn find_by_reference<T: DeserializeOwned>(
        &self,
        resource: &str,
        reference: &str,
        operation: &'static str,
    ) -> Result<Option<T>, GatewayError> {
        let request = self
            .http_client
            .get(self.url(resource))
            .query(&[("externalReference", reference)]);
        let list: ListResponse<T> = self.send(request, operation).await?;
        Ok(list.data.into_iter().next())
    }
}

fn transport_error(operation: &str, err: reqwest::Error) -> GatewayError {
    tracing::warn!(operation, error = %err, "Asaas transport failure");
    if err.is_timeout() {
        GatewayError::timeout(format!("{} timed out", operation))
    } else {
        GatewayError::network(err.to_string())
    }
}

/// Maps a non-success response to a gateway error, keeping Asaas's own
/// code and description when the body carries them.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> GatewayError {
    let first = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.errors.into_iter().next());

    let description = first
        .as_ref()
        .and_then(|e| e.description.clone())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayErrorCode::Authentication,
        StatusCode::NOT_FOUND => GatewayErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => GatewayErrorCode::RateLimited,
        s if s.is_server_error() => GatewayErrorCode::Provider,
        _ => GatewayErrorCode::Rejected,
    };

    let mut err = GatewayError::new(code, description).with_http_status(status.as_u16());
    if let Some(pc) = first.and_then(|e| e.code) {
        err = err.with_provider_code(pc);
    }
    err
}

#[async_trait]
impl PaymentGateway for AsaasGatewayAdapter {
    async fn create_customer(
        &self,
        request: &NewCustomer,
    ) -> Result<GatewayCustomer, GatewayError> {
        let body = CustomerRequest::from(request);
        let response: CustomerResponse = self
            .send(
                self.http_client.post(self.url("customers")).json(&body),
                "create_customer",
            )
            .await?;
        response.try_into()
    }

    async fn find_customer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayCustomer>, GatewayError> {
        self.find_by_reference::<CustomerResponse>("customers", reference, "find_customer")
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn create_charge(&self, request: &NewCharge) -> Result<GatewayCharge, GatewayError> {
        let body = ChargeRequest::from(request);
        let response: ChargeResponse = self
            .send(
                self.http_client.post(self.url("payments")).json(&body),
                "create_charge",
            )
            .await?;
        response.try_into()
    }

    async fn find_charge_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayCharge>, GatewayError> {
        self.find_by_reference::<ChargeResponse>("payments", reference, "find_charge")
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn update_charge_reference(
        &self,
        charge: &GatewayId,
        reference: &str,
    ) -> Result<(), GatewayError> {
        let body = UpdateReferenceRequest {
            external_reference: reference.to_string(),
        };
        let _: ChargeResponse = self
            .send(
                self.http_client
                    .post(self.url(&format!("payments/{}", charge)))
                    .json(&body),
                "update_charge_reference",
            )
            .await?;
        Ok(())
    }

    async fn create_subscription(
        &self,
        request: &NewSubscription,
    ) -> Result<GatewaySubscription, GatewayError> {
        let body = SubscriptionRequest::from(request);
        let response: SubscriptionResponse = self
            .send(
                self.http_client.post(self.url("subscriptions")).json(&body),
                "create_subscription",
            )
            .await?;
        response.try_into()
    }

    async fn find_subscription_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewaySubscription>, GatewayError> {
        self.find_by_reference::<SubscriptionResponse>(
            "subscriptions",
            reference,
            "find_subscription",
        )
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn get_subscription(
        &self,
        id: &GatewayId,
    ) -> Result<Option<GatewaySubscription>, GatewayError> {
        let request = self
            .http_client
            .get(self.url(&format!("subscriptions/{}", id)));
        match self
            .send::<SubscriptionResponse>(request, "get_subscription")
            .await
        {
            Ok(response) => response.try_into().map(Some),
            Err(err) if err.code == GatewayErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn cancel_subscription(
        &self,
        id: &GatewayId,
    ) -> Result<GatewaySubscription, GatewayError> {
        let request = self
            .http_client
            .delete(self.url(&format!("subscriptions/{}", id)));
        let deleted: DeletedResponse = self.send(request, "cancel_subscription").await?;
        if !deleted.deleted {
            return Err(GatewayError::rejected(format!(
                "Gateway did not delete subscription {}",
                deleted.id
            )));
        }

        self.get_subscription(id)
            .await?
            .ok_or_else(|| GatewayError::not_found("subscription"))
    }

    async fn create_invoice(&self, request: &NewInvoice) -> Result<GatewayInvoice, GatewayError> {
        let body = InvoiceRequest::from(request);
        let response: InvoiceResponse = self
            .send(
                self.http_client.post(self.url("invoices")).json(&body),
                "create_invoice",
            )
            .await?;
        response.try_into()
    }

    async fn find_invoice_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayInvoice>, GatewayError> {
        self.find_by_reference::<InvoiceResponse>("invoices", reference, "find_invoice")
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}
