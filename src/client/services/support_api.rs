use reqwest::multipart;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::models::ticket::{MessageKind, Ticket};
use crate::config::Config;

const FETCH_TICKETS_PATH: &str = "super_admin/backend/fetch_support_ticket";
const FETCH_TICKET_PATH: &str = "super_admin/backend/fetch_particular_support_ticket";
const SEND_MESSAGE_PATH: &str = "super_admin/backend/send_support_msg";
const CLOSE_TICKET_PATH: &str = "super_admin/backend/close_support_ticket";
const UPLOAD_PATH: &str = "backend/upload";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered but rejected the operation; the payload's `msg`
    /// field (when present) is the operator-facing reason.
    #[error("{0}")]
    Backend(String),
    #[error("unexpected response payload")]
    UnexpectedPayload,
}

/// The backend's standard `{success, data, msg}` wrapper. Every field is
/// optional in practice, so all of them default.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: Option<bool>,
    data: Option<T>,
    msg: Option<String>,
}

/// Some endpoints wrap a single document in a one-element array, some
/// return it bare. Accept both and normalize to a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    support_id: &'a str,
    message: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct CloseTicketBody<'a> {
    support_id: &'a str,
    resolved_remark: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    url: Option<String>,
}

/// Typed client for the support backend. Every operation is an independent
/// one-shot request; failures are reported to the caller without retrying.
#[derive(Debug, Clone)]
pub struct SupportApi {
    http: reqwest::Client,
    base_url: url::Url,
    api_token: Option<String>,
    pub max_upload_bytes: u64,
}

impl SupportApi {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default http client: {}", e);
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: config.base_url(),
            api_token: config.api_token.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base_url, path))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET the full ticket catalog.
    pub async fn fetch_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        let resp = self
            .authorize(self.http.get(self.endpoint(FETCH_TICKETS_PATH)))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(backend_error(resp).await);
        }
        let envelope: Envelope<OneOrMany<Ticket>> = resp.json().await?;
        Ok(envelope.data.map(OneOrMany::into_vec).unwrap_or_default())
    }

    /// GET one ticket with its message history.
    pub async fn fetch_ticket(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        let path = format!("{}/{}", FETCH_TICKET_PATH, ticket_id);
        let resp = self.authorize(self.http.get(self.endpoint(&path))).send().await?;
        if !resp.status().is_success() {
            return Err(backend_error(resp).await);
        }
        let envelope: Envelope<OneOrMany<Ticket>> = resp.json().await?;
        envelope
            .data
            .map(OneOrMany::into_vec)
            .and_then(|tickets| tickets.into_iter().next())
            .ok_or(ApiError::UnexpectedPayload)
    }

    /// POST one outgoing message (text body or uploaded image URL).
    pub async fn send_support_message(
        &self,
        ticket_id: &str,
        body: &str,
        kind: MessageKind,
    ) -> Result<(), ApiError> {
        let payload = SendMessageBody {
            support_id: ticket_id,
            message: body,
            kind: kind.as_str(),
        };
        log::debug!("sending {} message to ticket {}", kind.as_str(), ticket_id);
        let resp = self
            .authorize(self.http.post(self.endpoint(SEND_MESSAGE_PATH)))
            .json(&payload)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(backend_error(resp).await)
        }
    }

    /// POST a file as multipart form data; returns the stored URL.
    pub async fn upload_attachment(
        &self,
        filename: String,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<String, ApiError> {
        let part = multipart::Part::bytes(bytes).file_name(filename).mime_str(mime)?;
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .authorize(self.http.post(self.endpoint(UPLOAD_PATH)))
            .multipart(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(backend_error(resp).await);
        }
        let upload: UploadResponse = resp.json().await?;
        match upload {
            UploadResponse { success: true, url: Some(url) } => Ok(url),
            _ => Err(ApiError::Backend("Image upload failed".to_string())),
        }
    }

    /// POST the close-ticket action with its resolution remark.
    pub async fn close_ticket(&self, ticket_id: &str, remark: &str) -> Result<(), ApiError> {
        let payload = CloseTicketBody { support_id: ticket_id, resolved_remark: remark };
        let resp = self
            .authorize(self.http.post(self.endpoint(CLOSE_TICKET_PATH)))
            .json(&payload)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(backend_error(resp).await)
        }
    }
}

/// Turn a non-2xx response into a `Backend` error, preferring the body's
/// `msg` field over a bare status line.
async fn backend_error(resp: reqwest::Response) -> ApiError {
    let status = resp.status();
    match resp.json::<Envelope<serde_json::Value>>().await {
        Ok(Envelope { msg: Some(msg), .. }) if !msg.is_empty() => ApiError::Backend(msg),
        _ => ApiError::Backend(format!("request failed with status {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> SupportApi {
        SupportApi::new(&Config {
            api_base_url: "http://backend.test/".into(),
            api_token: None,
            request_timeout_secs: 5,
            max_upload_bytes: 1024,
        })
    }

    #[test]
    fn endpoints_join_onto_the_base_url() {
        let api = api();
        assert_eq!(
            api.endpoint(SEND_MESSAGE_PATH),
            "http://backend.test/super_admin/backend/send_support_msg"
        );
        assert_eq!(
            api.endpoint(&format!("{}/{}", FETCH_TICKET_PATH, "t1")),
            "http://backend.test/super_admin/backend/fetch_particular_support_ticket/t1"
        );
    }

    #[test]
    fn send_body_uses_the_wire_field_names() {
        let body = SendMessageBody { support_id: "t1", message: "hello", kind: "text" };
        let value = serde_json::to_value(body).expect("serializable body");
        assert_eq!(
            value,
            serde_json::json!({"support_id": "t1", "message": "hello", "type": "text"})
        );
    }

    #[test]
    fn envelope_accepts_object_or_array_data() {
        let one: Envelope<OneOrMany<Ticket>> =
            serde_json::from_str(r#"{"success":true,"data":{"_id":"t1","status":"open"}}"#)
                .expect("object payload");
        let tickets = one.data.map(OneOrMany::into_vec).unwrap_or_default();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, "t1");

        let many: Envelope<OneOrMany<Ticket>> = serde_json::from_str(
            r#"{"data":[{"_id":"t1","status":"open"},{"_id":"t2","status":"closed"}]}"#,
        )
        .expect("array payload");
        let tickets = many.data.map(OneOrMany::into_vec).unwrap_or_default();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[1].id, "t2");
    }

    #[test]
    fn envelope_surfaces_backend_reason() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"success":false,"msg":"Ticket already closed"}"#)
                .expect("error payload");
        assert_eq!(env.success, Some(false));
        assert_eq!(env.msg.as_deref(), Some("Ticket already closed"));
        assert!(env.data.is_none());
    }

    #[test]
    fn upload_response_requires_success_and_url() {
        let ok: UploadResponse =
            serde_json::from_str(r#"{"success":true,"url":"https://cdn.test/a.png"}"#)
                .expect("upload payload");
        assert!(ok.success);
        assert_eq!(ok.url.as_deref(), Some("https://cdn.test/a.png"));

        let missing_url: UploadResponse =
            serde_json::from_str(r#"{"success":true}"#).expect("upload payload");
        assert!(missing_url.url.is_none());
    }
}
