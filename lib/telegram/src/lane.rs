//! Per-user ordered processing.
//!
//! Every user gets one queue and one task draining it, so a user's updates
//! are applied to their controller tree in submission order while turns of
//! different users run in parallel.

use crate::adapter::Adapter;
use crate::error::AdapterError;
use crate::incoming::RawUpdate;
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use switchboard_core::UserId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Routes updates into per-user lanes.
///
/// Lanes are never evicted: like the session registry, the dispatcher keeps
/// one idle queue and task for every user it has seen.
pub struct Dispatcher<T: Transport + 'static> {
    adapter: Arc<Adapter<T>>,
    lanes: Mutex<HashMap<UserId, mpsc::Sender<RawUpdate>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Transport + 'static> Dispatcher<T> {
    /// Creates a dispatcher with no lanes. Must be used inside a tokio
    /// runtime; lanes are spawned on first use.
    #[must_use]
    pub fn new(adapter: Arc<Adapter<T>>) -> Self {
        Self {
            adapter,
            lanes: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Returns the adapter the lanes run turns on.
    #[must_use]
    pub fn adapter(&self) -> &Arc<Adapter<T>> {
        &self.adapter
    }

    /// Queues an update on its user's lane.
    ///
    /// Waits while the lane is full. An update without a chat cannot be
    /// routed and is handled inline, which drops it and acknowledges a
    /// callback query.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::LaneClosed`] if the user's lane has shut down.
    pub async fn submit(&self, update: RawUpdate) -> switchboard_core::Result<(), AdapterError> {
        let Some(user_id) = update.user_id() else {
            self.adapter.handle_update(update).await?;
            return Ok(());
        };

        self.lane(user_id)
            .send(update)
            .await
            .map_err(|_| AdapterError::LaneClosed { user_id })?;
        Ok(())
    }

    /// Closes every lane and waits for queued updates to finish.
    pub async fn shutdown(&self) {
        self.lanes.lock().unwrap_or_else(|e| e.into_inner()).clear();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
        debug!(lanes = tasks.len(), "draining lanes");
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "lane task failed");
            }
        }
    }

    fn lane(&self, user_id: UserId) -> mpsc::Sender<RawUpdate> {
        let mut lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = lanes.get(&user_id) {
            if !sender.is_closed() {
                return sender.clone();
            }
            warn!(%user_id, "replacing closed lane");
        }

        let (sender, receiver) = mpsc::channel(self.adapter.config().lane_capacity.max(1));
        let handle = tokio::spawn(run_lane(Arc::clone(&self.adapter), user_id, receiver));
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
        lanes.insert(user_id, sender.clone());
        sender
    }
}

impl<T: Transport + 'static> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner()).len();
        f.debug_struct("Dispatcher")
            .field("adapter", &self.adapter)
            .field("lanes", &lanes)
            .finish()
    }
}

async fn run_lane<T: Transport + 'static>(
    adapter: Arc<Adapter<T>>,
    user_id: UserId,
    mut updates: mpsc::Receiver<RawUpdate>,
) {
    debug!(%user_id, "lane started");
    while let Some(update) = updates.recv().await {
        let turn = tokio::spawn({
            let adapter = Arc::clone(&adapter);
            async move { adapter.handle_update(update).await }
        });
        match turn.await {
            Ok(Ok(_)) => {}
            Ok(Err(report)) => error!(%user_id, error = %report, "turn failed"),
            Err(e) => {
                // The tree was left mid-dispatch; start the user over.
                error!(%user_id, error = %e, "turn panicked, resetting session");
                adapter.registry().remove(user_id);
            }
        }
    }
    debug!(%user_id, "lane closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;
    use crate::mock::RecordingTransport;
    use switchboard_dialog::{
        Context, Controller, DialogError, Event, Node, OutMessage, SessionRegistry, View,
    };

    /// Remembers every text it receives, in order.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    impl Controller for Recorder {
        fn process_event(
            &mut self,
            cx: &mut Context<'_>,
            event: &Event,
        ) -> Result<OutMessage, DialogError> {
            if let Some(text) = event.text() {
                self.seen.push(text.to_string());
            }
            Ok(cx.render(self))
        }
    }

    fn dispatcher(lane_capacity: usize) -> Dispatcher<RecordingTransport> {
        let registry = SessionRegistry::new(|_| Node::new(View::new("rec"), Recorder::default()));
        let config = AdapterConfig {
            lane_capacity,
            ..AdapterConfig::default()
        };
        let adapter = Adapter::new(RecordingTransport::new(), Arc::new(registry), config);
        Dispatcher::new(Arc::new(adapter))
    }

    async fn seen(dispatcher: &Dispatcher<RecordingTransport>, user: i64) -> Vec<String> {
        let session = dispatcher
            .adapter()
            .registry()
            .get(UserId::new(user))
            .unwrap();
        let session = session.lock().await;
        let root = session.tree.root();
        session.tree.controller::<Recorder>(root).unwrap().seen.clone()
    }

    #[tokio::test]
    async fn updates_of_one_user_apply_in_order() {
        let dispatcher = dispatcher(4);
        let expected: Vec<String> = (1..=50).map(|i| format!("m{i}")).collect();

        for (i, text) in expected.iter().enumerate() {
            dispatcher
                .submit(RawUpdate::text(i as i64 + 1, 1, text.clone()))
                .await
                .unwrap();
        }
        dispatcher.shutdown().await;

        assert_eq!(seen(&dispatcher, 1).await, expected);
        assert_eq!(dispatcher.adapter().transport().sends().len(), 50);
    }

    #[tokio::test]
    async fn users_have_independent_lanes() {
        let dispatcher = dispatcher(64);

        for i in 1..=10 {
            dispatcher
                .submit(RawUpdate::text(i, 1, format!("a{i}")))
                .await
                .unwrap();
            dispatcher
                .submit(RawUpdate::text(100 + i, 2, format!("b{i}")))
                .await
                .unwrap();
        }
        dispatcher.shutdown().await;

        let a: Vec<String> = (1..=10).map(|i| format!("a{i}")).collect();
        let b: Vec<String> = (1..=10).map(|i| format!("b{i}")).collect();
        assert_eq!(seen(&dispatcher, 1).await, a);
        assert_eq!(seen(&dispatcher, 2).await, b);
        assert_eq!(dispatcher.adapter().registry().len(), 2);
    }

    #[tokio::test]
    async fn out_of_order_update_is_not_applied_after_a_newer_one() {
        let dispatcher = dispatcher(64);

        dispatcher.submit(RawUpdate::text(2, 1, "second")).await.unwrap();
        dispatcher.submit(RawUpdate::text(1, 1, "first")).await.unwrap();
        dispatcher.shutdown().await;

        // In-order application of [1, 2] ends in the state of update 2; the
        // late update 1 is rejected rather than overwriting it.
        let seen = seen(&dispatcher, 1).await;
        assert_eq!(seen.last().map(String::as_str), Some("second"));
        assert_eq!(seen, ["second"]);
    }

    /// Panics on "boom", otherwise replies with its view.
    struct Fragile;

    impl Controller for Fragile {
        fn process_event(
            &mut self,
            cx: &mut Context<'_>,
            event: &Event,
        ) -> Result<OutMessage, DialogError> {
            if event.text() == Some("boom") {
                panic!("controller bug");
            }
            Ok(cx.render(self))
        }
    }

    #[tokio::test]
    async fn panicking_turn_does_not_close_the_lane() {
        let registry = SessionRegistry::new(|_| Node::new(View::new("fragile"), Fragile));
        let adapter = Adapter::new(
            RecordingTransport::new(),
            Arc::new(registry),
            AdapterConfig::default(),
        );
        let dispatcher = Dispatcher::new(Arc::new(adapter));

        dispatcher.submit(RawUpdate::text(1, 1, "boom")).await.unwrap();
        dispatcher.submit(RawUpdate::text(2, 1, "hi")).await.unwrap();
        dispatcher.shutdown().await;

        let sends = dispatcher.adapter().transport().sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].text, "fragile");
    }

    #[tokio::test]
    async fn closed_lane_is_replaced() {
        let dispatcher = dispatcher(64);
        let (closed, receiver) = mpsc::channel(1);
        drop(receiver);
        dispatcher
            .lanes
            .lock()
            .unwrap()
            .insert(UserId::new(1), closed);

        dispatcher.submit(RawUpdate::text(1, 1, "hi")).await.unwrap();
        dispatcher.shutdown().await;

        assert_eq!(seen(&dispatcher, 1).await, ["hi"]);
    }

    #[tokio::test]
    async fn unroutable_update_is_handled_inline() {
        let dispatcher = dispatcher(64);
        let mut update = RawUpdate::callback(1, 1, "cb", "x");
        update.chat_id = None;

        dispatcher.submit(update).await.unwrap();

        assert_eq!(dispatcher.adapter().transport().acks().len(), 1);
        assert!(dispatcher.adapter().registry().is_empty());
        dispatcher.shutdown().await;
    }
}
