//! Web Push transport over a shared `reqwest` client.
//!
//! The `web-push` crate handles RFC 8291 payload encryption and the VAPID
//! JWT; the request itself goes through one pooled [`reqwest::Client`] so
//! connections to each push service are reused across deliveries.

use async_trait::async_trait;
use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};
use xsuportal_db::models::push_subscription::PushSubscription;

use super::{PushSendError, PushTransport};
use crate::config::PushConfig;
use crate::vapid::VapidCredentials;

/// Sends push messages to browser push services.
#[derive(Clone)]
pub struct WebPushTransport {
    client: reqwest::Client,
    ttl_secs: u32,
}

impl WebPushTransport {
    /// Build the transport and its pooled HTTP client from configuration.
    pub fn new(config: &PushConfig) -> Result<Self, reqwest::Error> {
        let client = client_builder(config).build()?;
        Ok(Self::with_client(client, config.ttl_secs))
    }

    /// Use an existing client.
    pub fn with_client(client: reqwest::Client, ttl_secs: u32) -> Self {
        Self { client, ttl_secs }
    }

    /// Encrypt and sign `payload` for `subscription`, producing the request.
    fn build_request(
        &self,
        credentials: &VapidCredentials,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<reqwest::RequestBuilder, PushSendError> {
        let sub_info =
            SubscriptionInfo::new(&subscription.endpoint, &subscription.p256dh, &subscription.auth);

        let mut sig_builder =
            VapidSignatureBuilder::from_base64(credentials.private_key_base64url(), &sub_info)?;
        sig_builder.add_claim("sub", credentials.subscriber());
        let signature = sig_builder.build()?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl_secs);
        let message = builder.build()?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        match message.payload {
            Some(push_payload) => {
                request = request
                    .header("Content-Encoding", push_payload.content_encoding.to_str())
                    .header("Content-Type", "application/octet-stream");

                for (key, value) in &push_payload.crypto_headers {
                    request = request.header(*key, value.as_str());
                }

                request = request.body(push_payload.content);
            }
            None => {
                request = request.header("Content-Length", "0");
            }
        }

        Ok(request)
    }
}

/// Pooled client settings shared by every delivery.
///
/// rustls advertises `h2` over ALPN, so push services that speak HTTP/2
/// get multiplexed connections; the rest fall back to HTTP/1.1.
fn client_builder(config: &PushConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(config.max_idle_per_host)
        .http2_adaptive_window(true)
        .http2_keep_alive_while_idle(true)
        .timeout(config.request_timeout)
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        credentials: &VapidCredentials,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<u16, PushSendError> {
        let request = self.build_request(credentials, subscription, payload)?;
        let response = request.send().await?;
        Ok(response.status().as_u16())
    }
}
