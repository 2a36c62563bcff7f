//! Telegram Bot API client.
//!
//! Implements [`Transport`] over HTTPS and long-polls `getUpdates`, mapping
//! the API's JSON updates to [`RawUpdate`]s.

use crate::error::BotError;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use switchboard_core::{CallbackQueryId, MessageId, UserId};
use switchboard_dialog::ParseMode;
use switchboard_telegram::{
    RawUpdate, ReplyMarkup, TgOutgoingMsg, Transport, TransportError, UpdateKind,
};
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Added to the long-poll timeout so the server answers before we give up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot API client.
#[derive(Clone)]
pub struct BotApi {
    http: reqwest::Client,
    /// `<api_base>/bot<token>`; never logged.
    endpoint: String,
}

impl BotApi {
    /// Creates a client for the bot identified by `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_base: &str, token: &str) -> Result<Self, BotError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BotError::HttpClient {
                details: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{token}", api_base.trim_end_matches('/')),
        })
    }

    /// Waits up to `timeout` for updates with ids from `offset` on.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API refuses it.
    #[instrument(skip(self))]
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<ApiUpdate>, TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &body, timeout + POLL_GRACE).await
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        body: &JsonValue,
        timeout: Duration,
    ) -> Result<R, TransportError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.endpoint))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed {
                method: method.to_string(),
                // The URL carries the token.
                reason: e.without_url().to_string(),
            })?;

        let envelope: ApiResponse<R> =
            response
                .json()
                .await
                .map_err(|e| TransportError::MalformedResponse {
                    method: method.to_string(),
                    reason: e.without_url().to_string(),
                })?;
        envelope.into_result(method)
    }
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApi").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for BotApi {
    async fn send_message(&self, msg: &TgOutgoingMsg) -> Result<MessageId, TransportError> {
        let sent: ApiMessage = self
            .call("sendMessage", &send_message_body(msg), REQUEST_TIMEOUT)
            .await?;
        debug!(message_id = sent.message_id, "message sent");
        Ok(MessageId::new(sent.message_id))
    }

    async fn edit_message_text(
        &self,
        user_id: UserId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": user_id.get(),
            "message_id": message_id.get(),
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode.as_str());
        }
        // The result is the edited message or `true`; neither is needed.
        let _: JsonValue = self
            .call("editMessageText", &body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, id: &CallbackQueryId) -> Result<(), TransportError> {
        let body = json!({ "callback_query_id": id.as_str() });
        let _: bool = self
            .call("answerCallbackQuery", &body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

/// Builds the `sendMessage` request body.
fn send_message_body(msg: &TgOutgoingMsg) -> JsonValue {
    let mut body = json!({
        "chat_id": msg.user_id.get(),
        "text": msg.text,
    });
    if let Some(mode) = msg.parse_mode {
        body["parse_mode"] = json!(mode.as_str());
    }
    if let Some(markup) = msg.reply_markup() {
        body["reply_markup"] = reply_markup_json(&markup);
    }
    body
}

fn reply_markup_json(markup: &ReplyMarkup) -> JsonValue {
    match markup {
        ReplyMarkup::Inline(rows) => json!({ "inline_keyboard": rows }),
        ReplyMarkup::Keyboard(rows) => {
            let keyboard: Vec<Vec<JsonValue>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            json!({
                "keyboard": keyboard,
                "resize_keyboard": true,
                "one_time_keyboard": true,
            })
        }
        ReplyMarkup::Remove => json!({ "remove_keyboard": true }),
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<R> {
    ok: bool,
    result: Option<R>,
    error_code: Option<i64>,
    description: Option<String>,
}

impl<R> ApiResponse<R> {
    fn into_result(self, method: &str) -> Result<R, TransportError> {
        if !self.ok {
            return Err(TransportError::Api {
                method: method.to_string(),
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
            });
        }
        self.result.ok_or_else(|| TransportError::MalformedResponse {
            method: method.to_string(),
            reason: "missing result".to_string(),
        })
    }
}

/// An update as returned by `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUpdate {
    /// Sequence number.
    pub update_id: i64,
    message: Option<ApiMessage>,
    callback_query: Option<ApiCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiMessage {
    message_id: i64,
    chat: Option<ApiChat>,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiChat {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiCallbackQuery {
    id: String,
    data: Option<String>,
    message: Option<ApiMessage>,
}

impl ApiUpdate {
    /// Converts into the adapter's update, or `None` for update types the
    /// bot does not handle.
    #[must_use]
    pub fn into_raw(self) -> Option<RawUpdate> {
        let update_id = self.update_id;
        if let Some(query) = self.callback_query {
            let message = query.message;
            let chat = message.as_ref().and_then(|m| m.chat.clone());
            return Some(RawUpdate {
                update_id,
                kind: UpdateKind::Callback,
                chat_id: chat.as_ref().map(|c| c.id),
                user_name: chat.and_then(|c| c.username),
                message_id: message.as_ref().map(|m| m.message_id),
                text: message.and_then(|m| m.text),
                callback_id: Some(query.id),
                callback_data: query.data,
            });
        }

        let message = self.message?;
        Some(RawUpdate {
            update_id,
            kind: UpdateKind::Text,
            chat_id: message.chat.as_ref().map(|c| c.id),
            user_name: message.chat.and_then(|c| c.username),
            message_id: Some(message.message_id),
            text: message.text,
            callback_id: None,
            callback_data: None,
        })
    }
}
