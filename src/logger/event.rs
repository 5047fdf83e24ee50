// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;
use crate::meta::Meta;

/// The outcome of a log call, handed to its completion callback.
///
/// `Ok(None)` means no transport was eligible and nothing was written.
pub type Completion = Result<Option<Logged>, Error>;

/// A completion callback.
pub type Callback = Box<dyn FnOnce(Completion) + Send + 'static>;

/// A log call that every eligible transport wrote successfully.
#[derive(Debug, Clone)]
pub struct Logged {
    /// Level name.
    pub level: String,
    /// The final message text.
    pub message: String,
    /// The final metadata.
    pub meta: Meta,
}

/// Lifecycle notifications of a [`Logger`](crate::Logger).
#[derive(Debug, Clone)]
pub enum Event {
    /// One transport wrote an entry. Fires after the write and before [`Event::Logged`].
    Logging {
        /// Name of the transport.
        transport: String,
        /// Level name.
        level: String,
        /// The final message text.
        message: String,
        /// The final metadata.
        meta: Meta,
    },
    /// Every eligible transport wrote the entry. Fires at most once per log call.
    Logged(Logged),
    /// A log call failed and had no completion callback. Only emitted when the logger was
    /// configured to emit errors.
    Error(Arc<Error>),
}

/// Identifies a listener registered with [`Logger::subscribe`](crate::Logger::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Arc<dyn Fn(&Event) + Send + Sync + 'static>;

/// Fans events out to listeners and channel subscribers.
#[derive(Default)]
pub(crate) struct Emitter {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(Subscription, Listener)>>,
    channels: Mutex<Vec<Sender<Event>>>,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl Emitter {
    pub(crate) fn subscribe(&self, listener: Listener) -> Subscription {
        let id = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.lock_listeners();
        let len = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != len
    }

    pub(crate) fn channel(&self) -> Receiver<Event> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    pub(crate) fn emit(&self, event: Event) {
        // listeners may subscribe or unsubscribe while being notified
        let listeners = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(&event);
        }

        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.retain(|sender| sender.send(event.clone()).is_ok());
    }

    fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(Subscription, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn logged() -> Event {
        Event::Logged(Logged {
            level: "info".to_string(),
            message: "hello".to_string(),
            meta: Meta::object(),
        })
    }

    #[test]
    fn test_listeners() {
        let emitter = Emitter::default();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let subscription = emitter.subscribe(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        emitter.emit(logged());
        assert!(emitter.unsubscribe(subscription));
        assert!(!emitter.unsubscribe(subscription));
        emitter.emit(logged());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channels_drop_disconnected_receivers() {
        let emitter = Emitter::default();
        let receiver = emitter.channel();
        drop(emitter.channel());

        emitter.emit(logged());
        assert!(matches!(receiver.try_recv(), Ok(Event::Logged(_))));
        assert_eq!(emitter.channels.lock().unwrap().len(), 1);
    }
}
