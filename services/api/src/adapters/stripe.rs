//! services/api/src/adapters/stripe.rs
//!
//! This module contains the payment adapter, which implements the `PaymentService`
//! port against Stripe's hosted checkout through the `async-stripe` client.
//! Webhook payloads go through `Webhook::construct_event`, so nothing in them is
//! trusted before the endpoint signature checks out.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use lms_core::domain::{CheckoutRequest, CheckoutSession, WebhookEvent};
use lms_core::ports::{PaymentService, PortError, PortResult};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    CreateCheckoutSessionShippingAddressCollection,
    CreateCheckoutSessionShippingAddressCollectionAllowedCountries, Currency, EventObject,
    EventType, Webhook, WebhookError,
};
use tracing::{error, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct StripeAdapter {
    client: Client,
    webhook_secret: String,
    currency: Currency,
    timeout: Duration,
}

impl StripeAdapter {
    /// `api_base` is the scheme and host of the Stripe API, without the `/v1` suffix.
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        api_base: &str,
        currency: &str,
        timeout: Duration,
    ) -> PortResult<Self> {
        let currency = Currency::from_str(&currency.to_lowercase()).map_err(|_| {
            PortError::Validation(format!("Unsupported checkout currency '{}'", currency))
        })?;
        let base_url = format!("{}/v1/", api_base.trim_end_matches('/'));
        Ok(Self {
            client: Client::from_url(base_url.as_str(), secret_key),
            webhook_secret,
            currency,
            timeout,
        })
    }

    /// A one-item, card-only checkout session for `request`.
    fn session_params<'a>(&self, request: &'a CheckoutRequest) -> CreateCheckoutSession<'a> {
        let metadata = HashMap::from([
            ("courseId".to_string(), request.course_id.to_string()),
            ("userId".to_string(), request.user_id.to_string()),
        ]);
        CreateCheckoutSession {
            mode: Some(CheckoutSessionMode::Payment),
            payment_method_types: Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                    currency: self.currency,
                    unit_amount: Some(request.unit_amount),
                    product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: request.product_name.clone(),
                        images: request.image_url.clone().map(|image| vec![image]),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                quantity: Some(1),
                ..Default::default()
            }]),
            success_url: Some(&request.success_url),
            cancel_url: Some(&request.cancel_url),
            metadata: Some(metadata),
            shipping_address_collection: Some(CreateCheckoutSessionShippingAddressCollection {
                allowed_countries: vec![
                    CreateCheckoutSessionShippingAddressCollectionAllowedCountries::In,
                ],
            }),
            ..Default::default()
        }
    }
}

fn webhook_error(err: WebhookError) -> PortError {
    match err {
        WebhookError::BadParse(e) => {
            PortError::Validation(format!("Invalid webhook payload: {}", e))
        }
        other => PortError::Security(format!("Webhook verification failed: {}", other)),
    }
}

//=========================================================================================
// `PaymentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaymentService for StripeAdapter {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> PortResult<CheckoutSession> {
        let params = self.session_params(request);
        let session = tokio::time::timeout(
            self.timeout,
            StripeCheckoutSession::create(&self.client, params),
        )
        .await
        .map_err(|_| PortError::Payment("Payment provider timed out".to_string()))?
        .map_err(|e| {
            error!("Stripe checkout session failed: {}", e);
            PortError::Payment(format!("Checkout session rejected: {}", e))
        })?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url: session.url,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> PortResult<WebhookEvent> {
        let payload = std::str::from_utf8(payload)
            .map_err(|_| PortError::Validation("Webhook payload is not UTF-8".to_string()))?;
        let event = Webhook::construct_event(payload, signature, &self.webhook_secret)
            .map_err(webhook_error)?;

        match event.type_ {
            EventType::CheckoutSessionCompleted => match event.data.object {
                EventObject::CheckoutSession(session) => Ok(WebhookEvent::CheckoutCompleted {
                    session_id: session.id.to_string(),
                    amount_total: session.amount_total,
                }),
                _ => {
                    warn!("checkout.session.completed without a checkout session object");
                    Err(PortError::Validation(
                        "Checkout event has no session object".to_string(),
                    ))
                }
            },
            other => Ok(WebhookEvent::Other {
                event_type: format!("{:?}", other),
            }),
        }
    }
}
