//! One dialog turn, from transport update to transport calls.
//!
//! A turn normalizes the update, applies the resulting event to the user's
//! controller tree, acknowledges the callback query (always, and exactly
//! once), then delivers the rendered chain node by node.

use crate::config::AdapterConfig;
use crate::error::{AdapterError, ProtocolError, TransportError};
use crate::incoming::RawUpdate;
use crate::outgoing::TgOutgoingMsg;
use crate::transport::Transport;
use std::sync::Arc;
use switchboard_core::{CallbackQueryId, MessageId, TurnId, UserId};
use switchboard_dialog::{DialogError, OutMessage, Rejection, SessionRegistry};
use tracing::{debug, error, instrument, warn};

/// What the transport reported for the calls of one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Ids of newly sent messages, in chain order.
    pub sent: Vec<MessageId>,
    /// Ids of edited messages, in chain order.
    pub edited: Vec<MessageId>,
    /// Number of sends and edits the transport refused.
    pub failed: usize,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The controller produced a chain and it was delivered.
    Delivered(Delivery),
    /// The active controller refused the event; nothing was rendered.
    Rejected(Rejection),
    /// The update was malformed and never reached a controller.
    Dropped(ProtocolError),
    /// The session already applied this update or a later one.
    Stale { update_id: i64 },
}

/// The message an edit in this turn overwrites, with the text it shows.
#[derive(Debug, Clone)]
struct EditTarget {
    message_id: MessageId,
    text: Option<String>,
}

/// Result of applying an update to the session, before any transport call.
enum Applied {
    Render {
        user_id: UserId,
        chain: OutMessage,
        target: Option<EditTarget>,
    },
    Rejected {
        user_id: UserId,
        rejection: Rejection,
        was_text: bool,
    },
    Done(TurnOutcome),
}

/// Translates between transport updates and dialog turns.
pub struct Adapter<T> {
    transport: T,
    registry: Arc<SessionRegistry>,
    config: AdapterConfig,
}

impl<T: Transport> Adapter<T> {
    /// Creates an adapter over `transport` serving the sessions in `registry`.
    #[must_use]
    pub fn new(transport: T, registry: Arc<SessionRegistry>, config: AdapterConfig) -> Self {
        Self {
            transport,
            registry,
            config,
        }
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the session registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Runs one turn.
    ///
    /// Callers must not run two turns of the same user concurrently; the
    /// [`Dispatcher`](crate::Dispatcher) takes care of that.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Structural`] when the user's controller tree
    /// is wired incorrectly. The callback query is acknowledged first.
    #[instrument(skip(self, update), fields(update_id = update.update_id, turn = %TurnId::new()))]
    pub async fn handle_update(
        &self,
        update: RawUpdate,
    ) -> switchboard_core::Result<TurnOutcome, AdapterError> {
        let ack = update.callback_query_id();
        let applied = self.apply(update).await;

        if let Some(id) = ack {
            self.acknowledge(&id).await;
        }

        match applied? {
            Applied::Render {
                user_id,
                chain,
                target,
            } => {
                let delivery = self.deliver(user_id, &chain, target).await;
                debug!(
                    sent = delivery.sent.len(),
                    edited = delivery.edited.len(),
                    failed = delivery.failed,
                    "turn delivered"
                );
                Ok(TurnOutcome::Delivered(delivery))
            }
            Applied::Rejected {
                user_id,
                rejection,
                was_text,
            } => {
                if was_text && self.config.reply_on_rejected_text {
                    let reply = TgOutgoingMsg::text(user_id, format!("Error: {rejection}"));
                    if let Err(e) = self.transport.send_message(&reply).await {
                        warn!(%user_id, error = %e, "failed to report rejection");
                    }
                }
                Ok(TurnOutcome::Rejected(rejection))
            }
            Applied::Done(outcome) => Ok(outcome),
        }
    }

    /// Normalizes the update and applies its event to the session.
    async fn apply(&self, update: RawUpdate) -> Result<Applied, AdapterError> {
        let inbound = match update.normalize() {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "dropping malformed update");
                return Ok(Applied::Done(TurnOutcome::Dropped(e)));
            }
        };

        let user_id = inbound.msg.user_id;
        let session = self.registry.get_or_create(user_id);
        let mut session = session.lock().await;

        if session.is_stale(inbound.update_id) {
            warn!(
                %user_id,
                last_update_id = ?session.last_update_id,
                "rejecting stale update"
            );
            return Ok(Applied::Done(TurnOutcome::Stale {
                update_id: inbound.update_id,
            }));
        }
        session.touch(inbound.update_id, inbound.msg.user_name.as_deref());

        let event = inbound.msg.to_event(self.config.parse_commands);
        let target = match (&inbound.callback, inbound.msg.message_id) {
            (Some(callback), Some(message_id)) => Some(EditTarget {
                message_id,
                text: callback.message_text.clone(),
            }),
            _ => None,
        };

        match session.tree.process_event(&event) {
            Ok(chain) => Ok(Applied::Render {
                user_id,
                chain,
                target,
            }),
            Err(DialogError::Rejected(rejection)) => {
                warn!(%user_id, %rejection, "controller rejected event");
                Ok(Applied::Rejected {
                    user_id,
                    rejection,
                    was_text: !inbound.is_callback(),
                })
            }
            Err(DialogError::Structural(error)) => {
                error!(%user_id, %error, "controller wiring error");
                Err(AdapterError::Structural { user_id, error })
            }
        }
    }

    async fn acknowledge(&self, id: &CallbackQueryId) {
        if let Err(e) = self.transport.answer_callback_query(id).await {
            warn!(callback = %id, error = %e, "failed to acknowledge callback query");
        }
    }

    /// Issues the chain's calls in order.
    ///
    /// Edits always target the message the callback query came from, so a
    /// message sent earlier in the chain is never overwritten. The target's
    /// known text follows each edit so the transcript keeps accumulating.
    async fn deliver(
        &self,
        user_id: UserId,
        chain: &OutMessage,
        mut target: Option<EditTarget>,
    ) -> Delivery {
        let mut delivery = Delivery::default();

        for node in chain {
            let mut msg = TgOutgoingMsg::from_node(user_id, node);
            match (node.edit_the_last, target.clone()) {
                (true, Some(edit)) => {
                    msg.edit_message_with_id = Some(edit.message_id);
                    msg.text = self.config.edit_policy.compose(
                        edit.text.as_deref(),
                        &msg.text,
                        &self.config.transcript_separator,
                    );
                    msg.parse_mode = msg.parse_mode.or(self.config.edit_parse_mode);
                }
                (true, None) => debug!(%user_id, "no message to edit in this turn, sending instead"),
                (false, _) => {}
            }

            match self.dispatch(&msg).await {
                Ok(message_id) => {
                    if msg.is_edit() {
                        delivery.edited.push(message_id);
                    } else {
                        delivery.sent.push(message_id);
                    }
                    if msg.is_edit()
                        && let Some(edit) = target.as_mut()
                    {
                        edit.text = Some(msg.text);
                    }
                }
                Err(e) => {
                    warn!(%user_id, edit = msg.is_edit(), error = %e, "delivery failed");
                    delivery.failed += 1;
                }
            }
        }

        delivery
    }

    /// Sends or edits, returning the id of the message now showing `msg`.
    async fn dispatch(&self, msg: &TgOutgoingMsg) -> Result<MessageId, TransportError> {
        match msg.edit_message_with_id {
            Some(message_id) => {
                self.transport
                    .edit_message_text(msg.user_id, message_id, &msg.text, msg.parse_mode)
                    .await?;
                Ok(message_id)
            }
            None => self.transport.send_message(msg).await,
        }
    }
}

impl<T> std::fmt::Debug for Adapter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
