//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::application::handlers::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CreateChargeCommand,
    CreateChargeHandler, CreateCustomerCommand, CreateCustomerHandler, CreateInvoiceCommand,
    CreateInvoiceHandler, CreateSubscriptionCommand, CreateSubscriptionHandler, GetChargeHandler,
    GetChargeQuery, GetCustomerHandler, GetCustomerQuery, GetInvoiceHandler, GetInvoiceQuery,
    GetSubscriptionHandler, GetSubscriptionQuery, HandleGatewayWebhookCommand,
    HandleGatewayWebhookHandler, InvoiceIssuer, OrphanChargeMaterializer, StatusSynchronizer,
};
use crate::domain::billing::{BillingError, GatewayErrorCode, InvoiceDefaults};
use crate::domain::foundation::{ChargeId, CustomerId, ErrorCode, InvoiceId, SubscriptionId};
use crate::domain::webhook::WebhookNotification;
use crate::ports::{
    ChargeRepository, CustomerRepository, InvoiceRepository, PaymentGateway,
    SubscriptionRepository,
};

use super::dto::{
    ChargeResponse, CreateChargeRequest, CreateCustomerRequest, CreateInvoiceRequest,
    CreateSubscriptionRequest, CustomerResponse, ErrorResponse, InvoiceResponse,
    SubscriptionResponse, WebhookAck,
};

/// Header carrying the token the gateway was configured with.
pub const WEBHOOK_TOKEN_HEADER: &str = "asaas-access-token";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Request handlers are built on demand from the ports; the webhook pipeline
/// is assembled once because its collaborators share the invoice issuer.
#[derive(Clone)]
pub struct BillingAppState {
    pub customers: Arc<dyn CustomerRepository>,
    pub charges: Arc<dyn ChargeRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    webhook: Arc<HandleGatewayWebhookHandler>,
    webhook_token: Arc<SecretString>,
}

impl BillingAppState {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        charges: Arc<dyn ChargeRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        gateway: Arc<dyn PaymentGateway>,
        defaults: InvoiceDefaults,
        webhook_token: SecretString,
    ) -> Self {
        let issuer = Arc::new(InvoiceIssuer::new(
            charges.clone(),
            invoices.clone(),
            gateway.clone(),
            defaults,
        ));
        let synchronizer = Arc::new(StatusSynchronizer::new(
            charges.clone(),
            subscriptions.clone(),
            invoices.clone(),
            issuer,
        ));
        let materializer = Arc::new(OrphanChargeMaterializer::new(
            charges.clone(),
            subscriptions.clone(),
            gateway.clone(),
        ));
        let webhook = Arc::new(HandleGatewayWebhookHandler::new(synchronizer, materializer));

        Self {
            customers,
            charges,
            subscriptions,
            invoices,
            gateway,
            webhook,
            webhook_token: Arc::new(webhook_token),
        }
    }

    pub fn create_customer_handler(&self) -> CreateCustomerHandler {
        CreateCustomerHandler::new(self.customers.clone(), self.gateway.clone())
    }

    pub fn create_charge_handler(&self) -> CreateChargeHandler {
        CreateChargeHandler::new(
            self.customers.clone(),
            self.charges.clone(),
            self.gateway.clone(),
        )
    }

    pub fn create_subscription_handler(&self) -> CreateSubscriptionHandler {
        CreateSubscriptionHandler::new(
            self.customers.clone(),
            self.subscriptions.clone(),
            self.gateway.clone(),
        )
    }

    pub fn create_invoice_handler(&self) -> CreateInvoiceHandler {
        CreateInvoiceHandler::new(
            self.charges.clone(),
            self.invoices.clone(),
            self.gateway.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.subscriptions.clone(), self.gateway.clone())
    }

    /// Constant-time comparison against the configured webhook token.
    fn accepts_webhook_token(&self, presented: &str) -> bool {
        let expected = self.webhook_token.expose_secret().as_bytes();
        bool::from(expected.ct_eq(presented.as_bytes()))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /customers/:id
pub async fn get_customer(
    State(state): State<BillingAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = GetCustomerHandler::new(state.customers.clone());
    let customer = handler
        .handle(GetCustomerQuery {
            customer_id: CustomerId::new(id).map_err(BillingError::from)?,
        })
        .await?;
    Ok(Json(CustomerResponse::from(customer)))
}

/// GET /charges/:id
pub async fn get_charge(
    State(state): State<BillingAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = GetChargeHandler::new(state.charges.clone());
    let charge = handler
        .handle(GetChargeQuery {
            charge_id: ChargeId::new(id).map_err(BillingError::from)?,
        })
        .await?;
    Ok(Json(ChargeResponse::from(charge)))
}

/// GET /subscriptions/:id
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = GetSubscriptionHandler::new(state.subscriptions.clone());
    let subscription = handler
        .handle(GetSubscriptionQuery {
            subscription_id: SubscriptionId::new(id).map_err(BillingError::from)?,
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// GET /invoices/:id
pub async fn get_invoice(
    State(state): State<BillingAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = GetInvoiceHandler::new(state.invoices.clone());
    let invoice = handler
        .handle(GetInvoiceQuery {
            invoice_id: InvoiceId::new(id).map_err(BillingError::from)?,
        })
        .await?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /customers
pub async fn create_customer(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .create_customer_handler()
        .handle(CreateCustomerCommand {
            profile: request.into(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse::from(result.customer)),
    ))
}

/// POST /charges
pub async fn create_charge(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateChargeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateChargeCommand {
        customer_id: CustomerId::new(request.customer_id.clone()).map_err(BillingError::from)?,
        terms: request.terms(),
    };
    let result = state.create_charge_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(ChargeResponse::from(result.charge))))
}

/// POST /subscriptions
pub async fn create_subscription(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateSubscriptionCommand {
        customer_id: CustomerId::new(request.customer_id.clone()).map_err(BillingError::from)?,
        plan: request.plan(),
    };
    let result = state.create_subscription_handler().handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(result.subscription)),
    ))
}

/// POST /subscriptions/:id/cancel
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CancelSubscriptionCommand {
        subscription_id: SubscriptionId::new(id).map_err(BillingError::from)?,
    };
    let result = state.cancel_subscription_handler().handle(cmd).await?;

    Ok(Json(SubscriptionResponse::from(result.subscription)))
}

/// POST /invoices
pub async fn create_invoice(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateInvoiceCommand {
        charge_id: ChargeId::new(request.charge_id).map_err(BillingError::from)?,
        external_reference: request.external_reference,
        details: request.details,
    };
    let result = state.create_invoice_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(result.invoice))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/asaas
///
/// Any error status makes the gateway redeliver the notification.
pub async fn handle_gateway_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let presented = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.accepts_webhook_token(presented) {
        tracing::warn!("Rejected webhook delivery with missing or invalid token");
        return Err(ApiError::Unauthorized);
    }

    let notification: WebhookNotification = serde_json::from_slice(&body)
        .map_err(|e| BillingError::malformed(format!("invalid notification body: {}", e)))?;

    let outcome = state
        .webhook
        .handle(HandleGatewayWebhookCommand { notification })
        .await?;

    tracing::info!(outcome = outcome.label(), "Processed webhook delivery");
    Ok(Json(WebhookAck {
        outcome: outcome.label(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Billing(BillingError),
    Unauthorized,
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::Billing(err)
    }
}

/// HTTP status for a billing error.
pub fn status_for(err: &BillingError) -> StatusCode {
    match err.code() {
        ErrorCode::ValidationFailed
        | ErrorCode::EmptyField
        | ErrorCode::InvalidFormat
        | ErrorCode::UnsupportedEvent
        | ErrorCode::MalformedPayload => StatusCode::BAD_REQUEST,
        ErrorCode::CustomerNotFound
        | ErrorCode::ChargeNotFound
        | ErrorCode::SubscriptionNotFound
        | ErrorCode::InvoiceNotFound => StatusCode::NOT_FOUND,
        ErrorCode::RemoteNotFound
        | ErrorCode::InvoiceAlreadyIssued
        | ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::GatewayError => match err {
            BillingError::Gateway(gw) => match gw.code {
                GatewayErrorCode::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
                GatewayErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
                GatewayErrorCode::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            _ => StatusCode::BAD_GATEWAY,
        },
        ErrorCode::ConsistencyGap | ErrorCode::DatabaseError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Unauthorized => {
                let body = ErrorResponse::new(
                    ErrorCode::Unauthorized.to_string(),
                    "Missing or invalid webhook token",
                );
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            ApiError::Billing(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!(code = %err.code(), error = %err, "Request failed");
                }
                let body = ErrorResponse::new(err.code().to_string(), err.to_string());
                (status, Json(body)).into_response()
            }
        }
    }
}
