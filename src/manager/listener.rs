// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background task reading a device's push channel.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::task::JoinHandle;

use super::channel::DeviceChannel;
use crate::event::{Event, EventKind};
use crate::protocol::PushStream;

/// Why a listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerExit {
    Logout,
    StreamEnded,
    StreamError,
    Cancelled,
}

/// Spawns the listener for `channel`.
///
/// Whatever ends the listener, the channel is disconnected. The manager
/// prunes disconnected channels from its table.
pub(crate) fn spawn_listener(channel: Arc<DeviceChannel>, stream: PushStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        let exit = listen(&channel, stream).await;
        let device_id = channel.device().device_id();

        match exit {
            ListenerExit::Logout => tracing::info!(device = %device_id, "Logged out by server"),
            ListenerExit::StreamEnded => {
                tracing::info!(device = %device_id, "Push channel closed");
            }
            ListenerExit::StreamError => {
                tracing::warn!(device = %device_id, "Push channel failed");
            }
            ListenerExit::Cancelled => tracing::debug!(device = %device_id, "Listener cancelled"),
        }

        channel.disconnect();
    })
}

async fn listen(channel: &DeviceChannel, mut stream: PushStream) -> ListenerExit {
    let device_id = channel.device().device_id();
    let closed = channel.closed_token();

    loop {
        let item = tokio::select! {
            biased;
            () = closed.cancelled() => return ListenerExit::Cancelled,
            item = stream.next() => item,
        };

        let payload = match item {
            Some(Ok(payload)) => payload,
            Some(Err(e)) => {
                tracing::warn!(device = %device_id, error = %e, "Push channel read error");
                return ListenerExit::StreamError;
            }
            None => return ListenerExit::StreamEnded,
        };

        let event = match Event::from_payload(&payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    device = %device_id,
                    error = %e,
                    payload = %payload,
                    "Dropping malformed push payload"
                );
                continue;
            }
        };

        match event.classify(channel.is_connected()) {
            EventKind::ConnectionAck => {
                if channel.mark_connected() {
                    tracing::info!(device = %device_id, "Push channel connected");
                }
            }
            EventKind::Logout => return ListenerExit::Logout,
            EventKind::Ordinary => channel.deliver(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::event::Popped;
    use crate::manager::ChannelState;
    use crate::types::Device;
    use futures_util::stream;
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn setup() -> Arc<DeviceChannel> {
        Arc::new(DeviceChannel::new(
            Device::new("BASE1", "XC1"),
            CancellationToken::new(),
        ))
    }

    fn feed(items: Vec<Result<String, ProtocolError>>) -> PushStream {
        stream::iter(items).boxed()
    }

    fn payload(value: &serde_json::Value) -> Result<String, ProtocolError> {
        Ok(value.to_string())
    }

    #[tokio::test]
    async fn buffers_only_ordinary_events_in_order() {
        let channel = setup();
        let items = vec![
            payload(&json!({"status": "connected"})),
            payload(&json!({"n": 1})),
            Ok("not json".to_string()),
            payload(&json!({"n": 2})),
            payload(&json!({"status": "connected"})),
            payload(&json!({"n": 3})),
        ];
        spawn_listener(Arc::clone(&channel), feed(items))
            .await
            .unwrap();

        assert_eq!(
            channel.buffer().drain(),
            vec![
                Event::from_value(json!({"n": 1})).unwrap(),
                Event::from_value(json!({"n": 2})).unwrap(),
                // A repeated ack is an ordinary event once connected.
                Event::from_value(json!({"status": "connected"})).unwrap(),
                Event::from_value(json!({"n": 3})).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn stream_end_disconnects() {
        let channel = setup();
        let items = vec![payload(&json!({"status": "connected"}))];
        spawn_listener(Arc::clone(&channel), feed(items))
            .await
            .unwrap();

        assert_eq!(channel.state(), ChannelState::Unsubscribed);
        assert!(channel.is_closed());
    }

    #[tokio::test]
    async fn logout_stops_reading() {
        let channel = setup();
        let items = vec![
            payload(&json!({"status": "connected"})),
            payload(&json!({"action": "logout"})),
            payload(&json!({"n": 1})),
        ];
        spawn_listener(Arc::clone(&channel), feed(items))
            .await
            .unwrap();

        assert!(channel.is_closed());
        assert_eq!(channel.buffer().pop(None).await, Popped::Woken);
        assert_eq!(channel.buffer().pop(None).await, Popped::Closed);
    }

    #[tokio::test]
    async fn logout_with_connected_status_stops_a_connected_channel() {
        let channel = setup();
        let items = vec![
            payload(&json!({"status": "connected"})),
            payload(&json!({"status": "connected", "action": "logout"})),
            payload(&json!({"n": 1})),
        ];
        spawn_listener(Arc::clone(&channel), feed(items))
            .await
            .unwrap();

        assert!(channel.is_closed());
        assert!(channel.buffer().drain().is_empty());
    }

    #[tokio::test]
    async fn read_error_disconnects() {
        let channel = setup();
        let items = vec![
            payload(&json!({"status": "connected"})),
            Err(ProtocolError::ConnectionFailed("reset".to_string())),
        ];
        spawn_listener(Arc::clone(&channel), feed(items))
            .await
            .unwrap();
        assert!(channel.is_closed());
    }

    #[tokio::test]
    async fn cancellation_stops_idle_listener() {
        let channel = setup();
        let handle = spawn_listener(
            Arc::clone(&channel),
            stream::pending::<Result<String, ProtocolError>>().boxed(),
        );

        channel.closed_token().cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(channel.state(), ChannelState::Unsubscribed);
    }
}
