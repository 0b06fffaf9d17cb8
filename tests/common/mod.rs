// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use arlo_lib::protocol::{PushStream, Transport};
use arlo_lib::{Command, Device, ProtocolError, SubscriptionConfig};
use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

pub const USER_ID: &str = "USER1";

type Feed = mpsc::UnboundedSender<Result<String, ProtocolError>>;
type Responder = Box<dyn Fn(&Command) -> Vec<Value> + Send + Sync>;

#[derive(Default)]
struct Shared {
    feeds: Mutex<Vec<Feed>>,
    opens: AtomicUsize,
    unsubscribes: AtomicUsize,
    sent: Mutex<Vec<Command>>,
    no_ack: AtomicBool,
    no_registration_reply: AtomicBool,
    fail_notify: AtomicBool,
    responder: Mutex<Option<Responder>>,
}

/// A transport whose push channel is fed by the test.
///
/// By default every opened channel acknowledges immediately and every
/// registration command gets a reply.
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    /// Opened channels never acknowledge.
    pub fn without_ack(self) -> Self {
        self.shared.no_ack.store(true, Ordering::SeqCst);
        self
    }

    /// Registration commands get no reply.
    pub fn without_registration_reply(self) -> Self {
        self.shared.no_registration_reply.store(true, Ordering::SeqCst);
        self
    }

    /// Events pushed in response to every sent command.
    pub fn with_responder(
        self,
        responder: impl Fn(&Command) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        *self.shared.responder.lock() = Some(Box::new(responder));
        self
    }

    pub fn set_fail_notify(&self, fail: bool) {
        self.shared.fail_notify.store(fail, Ordering::SeqCst);
    }

    /// Pushes an event on the most recently opened push channel.
    pub fn push(&self, event: &Value) {
        self.push_raw(&event.to_string());
    }

    pub fn push_raw(&self, payload: &str) {
        if let Some(feed) = self.shared.feeds.lock().last() {
            let _ = feed.send(Ok(payload.to_string()));
        }
    }

    /// Fails the most recently opened push channel with an I/O error.
    pub fn fail_stream(&self) {
        if let Some(feed) = self.shared.feeds.lock().pop() {
            let _ = feed.send(Err(ProtocolError::ConnectionFailed("reset".to_string())));
        }
    }

    /// Ends the most recently opened push channel.
    pub fn close_stream(&self) {
        self.shared.feeds.lock().pop();
    }

    pub fn opens(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    /// Push channels whose reading end is still alive.
    pub fn open_streams(&self) -> usize {
        self.shared
            .feeds
            .lock()
            .iter()
            .filter(|feed| !feed.is_closed())
            .count()
    }

    pub fn unsubscribes(&self) -> usize {
        self.shared.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Command> {
        self.shared.sent.lock().clone()
    }

    /// Sent commands other than registrations.
    pub fn sent_commands(&self) -> Vec<Command> {
        self.sent()
            .into_iter()
            .filter(|c| !is_registration(c))
            .collect()
    }

    pub fn registrations(&self) -> usize {
        self.sent().iter().filter(|c| is_registration(c)).count()
    }
}

fn is_registration(command: &Command) -> bool {
    command.resource().starts_with("subscriptions/")
}

impl Transport for MockTransport {
    fn user_id(&self) -> &str {
        USER_ID
    }

    async fn notify(&self, device: &Device, command: &Command) -> Result<(), ProtocolError> {
        if self.shared.fail_notify.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed("notify refused".to_string()));
        }
        self.shared.sent.lock().push(command.clone());

        let trans_id = command.trans_id().map(|t| t.as_str().to_string());
        if is_registration(command) && !self.shared.no_registration_reply.load(Ordering::SeqCst) {
            self.push(&json!({
                "transId": trans_id,
                "from": device.device_id(),
                "action": "is",
                "resource": command.resource(),
            }));
        }

        let events = self
            .shared
            .responder
            .lock()
            .as_ref()
            .map(|respond| respond(command))
            .unwrap_or_default();
        for event in &events {
            self.push(event);
        }
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<(), ProtocolError> {
        self.shared.unsubscribes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_push_channel(&self) -> Result<PushStream, ProtocolError> {
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.shared.no_ack.load(Ordering::SeqCst) {
            let _ = tx.send(Ok(json!({"status": "connected"}).to_string()));
        }
        self.shared.feeds.lock().push(tx);

        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed())
    }
}

/// A reply to `command`, echoing its properties.
pub fn reply_to(command: &Command) -> Value {
    json!({
        "transId": command.trans_id().map(|t| t.as_str().to_string()),
        "from": command.to(),
        "to": command.sender(),
        "action": "is",
        "resource": command.resource(),
        "properties": command.properties(),
    })
}

pub fn basestation() -> Device {
    Device::new("BASE1", "XC1")
        .with_type(Device::BASESTATION)
        .with_name("Home")
}

pub fn fast_config() -> SubscriptionConfig {
    SubscriptionConfig::new()
        .with_connect_timeout(Duration::from_millis(300))
        .with_register_timeout(Duration::from_millis(300))
        .with_response_timeout(Duration::from_secs(2))
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Polls `condition` until it holds, panicking after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(ms(10)).await;
    }
    panic!("condition not reached in time");
}
