use crate::connection::{Connection, ConnectionId, Delivery};
use crate::error::Error;
use crate::message::{Event, EventType};
use crate::registry::Registry;
use log::*;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Point-in-time counts of what the hub tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub users: usize,
}

enum Inspect {
    Stats(oneshot::Sender<HubStats>),
    Contains(ConnectionId, oneshot::Sender<bool>),
}

/// Everything the control loop can be asked to do. All commands share one
/// queue, so the loop sees them in the order each sender issued them.
enum Command {
    Register(Connection),
    Unregister(ConnectionId),
    Submit(Event),
    Inspect(Inspect),
}

/// Cloneable handle to the hub's control loop.
///
/// Every operation is a message into the loop; nothing here touches the
/// registry. When the last handle is dropped the loop drains, stops, and
/// closes every remaining connection's queue.
#[derive(Clone)]
pub struct Hub {
    command_tx: mpsc::Sender<Command>,
}

/// The single owner of the registry. Run it with [`ControlLoop::run`] or let
/// [`Hub::spawn`] do it.
pub struct ControlLoop {
    registry: Registry,
    command_rx: mpsc::Receiver<Command>,
}

impl Hub {
    /// Creates a handle and its control loop; the command queue holds up to
    /// `capacity` pending commands.
    pub fn new(capacity: usize) -> (Hub, ControlLoop) {
        let (command_tx, command_rx) = mpsc::channel(capacity.max(1));

        (
            Hub { command_tx },
            ControlLoop {
                registry: Registry::new(),
                command_rx,
            },
        )
    }

    /// Creates a hub and runs its control loop on the current runtime.
    pub fn spawn(capacity: usize) -> (Hub, JoinHandle<()>) {
        let (hub, control_loop) = Hub::new(capacity);
        let handle = tokio::spawn(control_loop.run());
        (hub, handle)
    }

    /// Hands `connection` to the hub. A connection whose id is already
    /// tracked is dropped.
    pub async fn register(&self, connection: Connection) -> Result<(), Error> {
        self.send(Command::Register(connection)).await
    }

    /// Removes a connection and closes its queue. Unknown or already removed
    /// ids are ignored.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), Error> {
        self.send(Command::Unregister(id)).await
    }

    /// Queues `event` for fan-out. Returns once the control loop accepted
    /// it, not once it was delivered.
    pub async fn submit(&self, event: Event) -> Result<(), Error> {
        self.send(Command::Submit(event)).await
    }

    /// Answered after every command this handle queued before it.
    pub async fn stats(&self) -> Result<HubStats, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Inspect(Inspect::Stats(reply_tx))).await?;
        reply_rx.await.map_err(|_| Error::hub_closed())
    }

    pub async fn is_registered(&self, id: ConnectionId) -> Result<bool, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Inspect(Inspect::Contains(id, reply_tx)))
            .await?;
        reply_rx.await.map_err(|_| Error::hub_closed())
    }

    async fn send(&self, command: Command) -> Result<(), Error> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| Error::hub_closed())
    }
}

impl ControlLoop {
    pub async fn run(mut self) {
        info!("Realtime hub started");

        while let Some(command) = self.command_rx.recv().await {
            match command {
                Command::Register(connection) => self.register(connection),
                Command::Unregister(id) => self.unregister(id),
                Command::Submit(event) => self.dispatch(event),
                Command::Inspect(query) => self.answer(query),
            }
        }

        info!(
            "Realtime hub stopped, closing {} remaining connection(s)",
            self.registry.len()
        );
    }

    fn register(&mut self, connection: Connection) {
        let (id, user_id) = (connection.id(), connection.user_id());
        match self.registry.insert(connection) {
            Ok(()) => info!("Registered connection {id} for user {user_id}"),
            Err(_duplicate) => warn!("Ignoring duplicate registration of connection {id}"),
        }
    }

    fn unregister(&mut self, id: ConnectionId) {
        match self.registry.remove(&id) {
            Some(connection) => {
                info!(
                    "Unregistered connection {id} for user {}",
                    connection.user_id()
                );
                // Dropping the only sender closes the outbound queue.
                drop(connection);
            }
            None => trace!("Connection {id} already unregistered"),
        }
    }

    fn dispatch(&mut self, event: Event) {
        let targets = self.registry.targets(event.recipients());
        if targets.is_empty() {
            debug!("No live connections for {} event", event.event_type());
            return;
        }

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize {} event: {e}", event.event_type());
                return;
            }
        };

        let mut dropped = Vec::new();
        for id in &targets {
            let Some(connection) = self.registry.get(id) else {
                continue;
            };
            match connection.try_deliver(frame.clone()) {
                Delivery::Queued => trace!("Queued {} event on {id}", event.event_type()),
                Delivery::Full => {
                    warn!(
                        "Outbound queue full for connection {id} (user {}), disconnecting",
                        connection.user_id()
                    );
                    dropped.push(*id);
                }
                Delivery::Closed => {
                    debug!("Connection {id} write loop is gone, disconnecting");
                    dropped.push(*id);
                }
            }
        }

        debug!(
            "Delivered {} event to {} of {} connection(s)",
            event.event_type(),
            targets.len() - dropped.len(),
            targets.len()
        );

        for id in dropped {
            self.unregister(id);
        }
    }

    fn answer(&self, query: Inspect) {
        // A caller that gave up waiting is not an error.
        match query {
            Inspect::Stats(reply) => {
                let _ = reply.send(HubStats {
                    connections: self.registry.len(),
                    users: self.registry.user_count(),
                });
            }
            Inspect::Contains(id, reply) => {
                let _ = reply.send(self.registry.contains(&id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Outbound, UserId};
    use crate::message::{Payload, Recipients};
    use serde_json::{json, Value};

    async fn connect(hub: &Hub, user_id: UserId, capacity: usize) -> (ConnectionId, Outbound) {
        let (connection, outbound) = Connection::new(user_id, capacity);
        let id = connection.id();
        hub.register(connection).await.unwrap();
        (id, outbound)
    }

    fn new_message(conversation_id: i64, message_id: i64, recipients: Recipients) -> Event {
        Event::new(
            Payload::NewMessage(json!({"id": message_id, "content": "hello"})),
            recipients,
        )
        .in_conversation(conversation_id)
    }

    fn drain(outbound: &mut Outbound) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Some(frame) = outbound.try_recv() {
            frames.push(serde_json::from_str(frame.as_str()).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn registry_tracks_the_last_register_or_unregister() {
        let (hub, _handle) = Hub::spawn(16);
        let (id, _outbound) = connect(&hub, 1, 4).await;
        assert!(hub.is_registered(id).await.unwrap());

        hub.unregister(id).await.unwrap();
        assert!(!hub.is_registered(id).await.unwrap());

        // A second unregister is a no-op.
        hub.unregister(id).await.unwrap();
        assert!(!hub.is_registered(id).await.unwrap());
        assert_eq!(hub.stats().await.unwrap(), HubStats::default());
    }

    #[tokio::test]
    async fn duplicate_registration_is_ignored() {
        let (hub, _handle) = Hub::spawn(16);
        let id = ConnectionId::new();
        let (first, mut first_outbound) = Connection::with_id(id, 1, 4);
        let (second, mut second_outbound) = Connection::with_id(id, 1, 4);

        hub.register(first).await.unwrap();
        hub.register(second).await.unwrap();

        assert_eq!(
            hub.stats().await.unwrap(),
            HubStats {
                connections: 1,
                users: 1
            }
        );
        // The rejected duplicate was dropped, closing its queue.
        assert!(second_outbound.recv().await.is_none());

        hub.submit(new_message(1, 1, Recipients::users([1])))
            .await
            .unwrap();
        hub.stats().await.unwrap();
        assert_eq!(drain(&mut first_outbound).len(), 1);
    }

    #[tokio::test]
    async fn unregister_closes_the_outbound_queue_once() {
        let (hub, _handle) = Hub::spawn(16);
        let (id, mut outbound) = connect(&hub, 1, 4).await;

        hub.unregister(id).await.unwrap();
        hub.unregister(id).await.unwrap();
        hub.stats().await.unwrap();

        assert!(outbound.recv().await.is_none());
        assert!(outbound.is_closed());
    }

    #[tokio::test]
    async fn submit_reaches_only_listed_users() {
        let (hub, _handle) = Hub::spawn(16);
        let (_, mut alice) = connect(&hub, 1, 4).await;
        let (_, mut bob) = connect(&hub, 2, 4).await;
        let (_, mut carol) = connect(&hub, 3, 4).await;

        hub.submit(new_message(7, 11, Recipients::users([1, 2])))
            .await
            .unwrap();
        hub.stats().await.unwrap();

        let alice_frames = drain(&mut alice);
        assert_eq!(alice_frames.len(), 1);
        assert_eq!(alice_frames[0]["type"], "new_message");
        assert_eq!(alice_frames[0]["conversationId"], 7);
        assert_eq!(drain(&mut bob).len(), 1);
        assert!(drain(&mut carol).is_empty());
    }

    #[tokio::test]
    async fn every_device_of_a_user_receives_the_event() {
        let (hub, _handle) = Hub::spawn(16);
        let (_, mut phone) = connect(&hub, 1, 4).await;
        let (_, mut laptop) = connect(&hub, 1, 4).await;

        assert_eq!(hub.stats().await.unwrap().users, 1);

        hub.submit(new_message(3, 5, Recipients::users([1])))
            .await
            .unwrap();
        hub.stats().await.unwrap();

        assert_eq!(drain(&mut phone).len(), 1);
        assert_eq!(drain(&mut laptop).len(), 1);
    }

    #[tokio::test]
    async fn saturated_connection_is_removed_within_the_same_submit() {
        let (hub, _handle) = Hub::spawn(16);
        let (slow_id, mut slow) = connect(&hub, 1, 1).await;
        let (_, mut healthy) = connect(&hub, 2, 8).await;

        hub.submit(new_message(7, 1, Recipients::users([1, 2])))
            .await
            .unwrap();
        hub.submit(new_message(7, 2, Recipients::users([1, 2])))
            .await
            .unwrap();
        assert!(!hub.is_registered(slow_id).await.unwrap());

        hub.submit(new_message(7, 3, Recipients::users([1, 2])))
            .await
            .unwrap();
        hub.stats().await.unwrap();

        // Only the frame queued before saturation, then the queue is closed.
        let slow_frames = drain(&mut slow);
        assert_eq!(slow_frames.len(), 1);
        assert_eq!(slow_frames[0]["payload"]["id"], 1);
        assert!(slow.recv().await.is_none());

        let ids: Vec<Value> = drain(&mut healthy)
            .into_iter()
            .map(|frame| frame["payload"]["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn connection_whose_write_loop_ended_is_removed_on_delivery() {
        let (hub, _handle) = Hub::spawn(16);
        let (id, outbound) = connect(&hub, 1, 4).await;
        drop(outbound);

        hub.submit(new_message(7, 1, Recipients::users([1])))
            .await
            .unwrap();

        assert!(!hub.is_registered(id).await.unwrap());
    }

    #[tokio::test]
    async fn conversation_scenario_reaches_members_exactly_once() {
        let (hub, _handle) = Hub::spawn(16);
        let (_, mut user1) = connect(&hub, 1, 4).await;
        let (_, mut user2) = connect(&hub, 2, 4).await;
        let (_, mut user3) = connect(&hub, 3, 4).await;

        hub.submit(new_message(7, 42, Recipients::users([1, 2])))
            .await
            .unwrap();
        hub.stats().await.unwrap();

        for outbound in [&mut user1, &mut user2] {
            let frames = drain(outbound);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["payload"]["id"], 42);
        }
        assert!(drain(&mut user3).is_empty());
    }

    #[tokio::test]
    async fn broadcast_reaches_everyone_and_empty_list_reaches_nobody() {
        let (hub, _handle) = Hub::spawn(16);
        let (_, mut first) = connect(&hub, 1, 4).await;
        let (_, mut second) = connect(&hub, 2, 4).await;

        hub.submit(new_message(1, 1, Recipients::users(Vec::new())))
            .await
            .unwrap();
        hub.submit(new_message(1, 2, Recipients::Broadcast))
            .await
            .unwrap();
        hub.stats().await.unwrap();

        for outbound in [&mut first, &mut second] {
            let frames = drain(outbound);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["payload"]["id"], 2);
        }
    }

    #[tokio::test]
    async fn events_arrive_in_submission_order() {
        let (hub, _handle) = Hub::spawn(64);
        let (_, mut outbound) = connect(&hub, 1, 64).await;

        for message_id in 0..20 {
            hub.submit(new_message(1, message_id, Recipients::users([1])))
                .await
                .unwrap();
        }
        hub.stats().await.unwrap();

        let ids: Vec<i64> = drain(&mut outbound)
            .iter()
            .filter_map(|frame| frame["payload"]["id"].as_i64())
            .collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_loop_and_closes_queues() {
        let (hub, handle) = Hub::spawn(16);
        let (_, mut outbound) = connect(&hub, 1, 4).await;
        hub.stats().await.unwrap();

        drop(hub);
        handle.await.unwrap();

        assert!(outbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn operations_fail_once_the_loop_is_gone() {
        let (hub, control_loop) = Hub::new(4);
        drop(control_loop);

        let (connection, _outbound) = Connection::new(1, 4);
        let err = hub.register(connection).await.unwrap_err();
        assert_eq!(err.error_kind, crate::error::RealtimeErrorKind::HubClosed);
        assert!(hub.stats().await.is_err());
        assert!(hub
            .submit(new_message(1, 1, Recipients::Broadcast))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn an_event_is_not_delivered_to_a_connection_registered_after_it() {
        let (hub, control_loop) = Hub::new(16);

        hub.submit(new_message(1, 1, Recipients::users([1])))
            .await
            .unwrap();
        let (id, mut outbound) = connect(&hub, 1, 4).await;
        hub.submit(new_message(1, 2, Recipients::users([1])))
            .await
            .unwrap();

        let _handle = tokio::spawn(control_loop.run());
        assert!(hub.is_registered(id).await.unwrap());

        let frames = drain(&mut outbound);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["payload"]["id"], 2);
    }

    #[tokio::test]
    async fn an_event_submitted_after_unregister_is_not_delivered() {
        let (hub, control_loop) = Hub::new(16);
        let (id, mut outbound) = connect(&hub, 1, 4).await;
        hub.submit(new_message(1, 1, Recipients::users([1])))
            .await
            .unwrap();
        hub.unregister(id).await.unwrap();
        hub.submit(new_message(1, 2, Recipients::users([1])))
            .await
            .unwrap();

        let _handle = tokio::spawn(control_loop.run());
        hub.stats().await.unwrap();

        let frames = drain(&mut outbound);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["payload"]["id"], 1);
        assert!(outbound.recv().await.is_none());
    }
}
