//! In-memory transport for tests and embedders.

use crate::error::TransportError;
use crate::outgoing::TgOutgoingMsg;
use crate::transport::Transport;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use switchboard_core::{CallbackQueryId, MessageId, UserId};
use switchboard_dialog::ParseMode;

/// A transport call as recorded by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `send_message`.
    Send(TgOutgoingMsg),
    /// `edit_message_text`.
    Edit {
        user_id: UserId,
        message_id: MessageId,
        text: String,
        parse_mode: Option<ParseMode>,
    },
    /// `answer_callback_query`.
    AnswerCallback(CallbackQueryId),
}

/// Transport that records every call in order.
///
/// Sent messages get increasing ids starting at 1000.
#[derive(Debug)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_message_id: AtomicI64,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    /// Creates a transport with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(1000),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Makes subsequent sends fail (after being recorded).
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Returns every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Returns the acknowledged callback ids.
    #[must_use]
    pub fn acks(&self) -> Vec<CallbackQueryId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::AnswerCallback(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Returns the sent messages.
    #[must_use]
    pub fn sends(&self) -> Vec<TgOutgoingMsg> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Send(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Returns `(message_id, text)` of every edit.
    #[must_use]
    pub fn edits(&self) -> Vec<(MessageId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Edit {
                    message_id, text, ..
                } => Some((message_id, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, msg: &TgOutgoingMsg) -> Result<MessageId, TransportError> {
        self.record(TransportCall::Send(msg.clone()));
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::RequestFailed {
                method: "sendMessage".to_string(),
                reason: "sends disabled".to_string(),
            });
        }
        Ok(MessageId::new(
            self.next_message_id.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn edit_message_text(
        &self,
        user_id: UserId,
        message_id: MessageId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Edit {
            user_id,
            message_id,
            text: text.to_string(),
            parse_mode,
        });
        Ok(())
    }

    async fn answer_callback_query(&self, id: &CallbackQueryId) -> Result<(), TransportError> {
        self.record(TransportCall::AnswerCallback(id.clone()));
        Ok(())
    }
}
