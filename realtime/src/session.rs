//! Per-connection read and write loops bridging a WebSocket to the hub.

use crate::connection::{Connection, ConnectionId, Outbound, UserId};
use crate::hub::Hub;
use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt::Display;

/// Runs one authenticated client session until either side ends it.
pub async fn serve(socket: WebSocket, hub: Hub, user_id: UserId, capacity: usize) {
    let (sink, stream) = socket.split();
    run(sink, stream, hub, user_id, capacity).await
}

/// Registers a connection for `user_id`, then runs the write loop on its own
/// task and the read loop on this one. Whichever ends first, the connection
/// ends up unregistered.
pub async fn run<Si, St, E>(sink: Si, stream: St, hub: Hub, user_id: UserId, capacity: usize)
where
    Si: Sink<Message> + Unpin + Send + 'static,
    Si::Error: Display + Send,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (connection, outbound) = Connection::new(user_id, capacity);
    let id = connection.id();

    if let Err(e) = hub.register(connection).await {
        warn!("Could not register connection for user {user_id}: {e}");
        return;
    }

    let mut writer = tokio::spawn(write_loop(outbound, sink));

    tokio::select! {
        _ = read_loop(stream, hub.clone(), id) => {
            debug!("Read side of connection {id} finished");
        }
        _ = &mut writer => {
            debug!("Write side of connection {id} finished");
            if let Err(e) = hub.unregister(id).await {
                debug!("Unregister of {id} skipped: {e}");
            }
        }
    }
}

/// Drains the outbound queue into `sink` as text frames. Once the hub closes
/// the queue a close frame is sent and the sink closed. Returns early on the
/// first write error.
pub async fn write_loop<Si>(mut outbound: Outbound, mut sink: Si)
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    let id = outbound.id();

    while let Some(frame) = outbound.recv().await {
        trace!("Writing frame to connection {id}");
        if let Err(e) = sink.send(Message::Text(frame)).await {
            debug!("Write to connection {id} failed: {e}");
            return;
        }
    }

    debug!("Outbound queue of connection {id} closed, closing transport");
    if let Err(e) = sink.send(Message::Close(None)).await {
        trace!("Close frame for {id} not sent: {e}");
    }
    if let Err(e) = sink.close().await {
        trace!("Closing transport for {id} failed: {e}");
    }
}

/// Consumes inbound frames until the peer closes, the stream ends or a
/// transport error occurs, then unregisters the connection. Clients are not
/// expected to send data; anything they do send is discarded.
pub async fn read_loop<St, E>(mut stream: St, hub: Hub, id: ConnectionId)
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(next) = stream.next().await {
        match next {
            Ok(Message::Close(frame)) => {
                debug!("Connection {id} closed by peer: {frame:?}");
                break;
            }
            Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                trace!("Discarding inbound data frame on {id}");
            }
            // Pings are answered by the transport itself.
            Ok(_) => {}
            Err(e) => {
                debug!("Connection {id} transport error: {e}");
                break;
            }
        }
    }

    if let Err(e) = hub.unregister(id).await {
        debug!("Unregister of {id} skipped: {e}");
    }
}
