//! The stream broadcaster: one forward-only producer, any number of
//! identical observers.
//!
//! A [`ReplayStream`] wraps exactly one underlying event producer that yields
//! zero or more `Chunk`s and then exactly one `Final`, or fails. Consumers
//! subscribe at any time and observe the identical ordered event history, the
//! identical live tail, and the identical terminal outcome.
//!
//! Fan-out is an explicit ring buffer under a mutex plus a notifier, not a
//! listener set: every subscription replays the buffer from index 0 and then
//! waits for the driver to append. The first subscription to poll past the
//! buffered history takes the producer and becomes the sole driver; the
//! producer is never pulled by anyone else. If the driver stops reading
//! mid-stream, production halts for everyone — no other consumer can resume
//! driving. That asymmetry is part of the contract.
//!
//! State machine: `NotStarted → Streaming → {Finished | Errored}`; each
//! terminal state is reached at most once and is irreversible. A producer
//! that completes without a `Final` terminates the stream with
//! [`Error::ProtocolViolation`] instead of hanging its consumers.

use crate::types::events::StreamEvent;
use crate::{Error, EventStream, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A replayable, multi-consumer view over one generation event stream.
pub struct ReplayStream {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ReplayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayStream").finish_non_exhaustive()
    }
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
}

struct State {
    /// Ordered event history; subscriptions replay it from index 0.
    events: Vec<StreamEvent>,
    terminal: Option<Terminal>,
    /// The producer, present until a driver claims it.
    producer: Option<EventStream>,
    driver_claimed: bool,
}

#[derive(Clone)]
enum Terminal {
    Finished,
    Errored(Error),
}

impl ReplayStream {
    /// Wrap one underlying producer.
    pub fn new(producer: EventStream) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    events: Vec::new(),
                    terminal: None,
                    producer: Some(producer),
                    driver_claimed: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// An ordered, replayable view of the events.
    ///
    /// Every subscription observes the full history from the first event,
    /// then the live tail, then the terminal outcome. A terminal error is
    /// delivered to each subscription exactly once.
    pub fn subscribe(&self) -> EventStream {
        let sub = Subscription {
            shared: self.shared.clone(),
            cursor: 0,
            producer: None,
            error_delivered: false,
        };
        Box::pin(futures::stream::unfold(sub, |mut sub| async move {
            sub.next().await.map(|item| (item, sub))
        }))
    }

    /// Resolve to the terminal `Final` event, driving the stream if no other
    /// consumer is.
    ///
    /// Rejects with the producer's error if it failed, or with
    /// [`Error::ProtocolViolation`] if the producer completed without ever
    /// emitting a `Final`.
    pub async fn result(&self) -> Result<StreamEvent> {
        let mut sub = Subscription {
            shared: self.shared.clone(),
            cursor: 0,
            producer: None,
            error_delivered: false,
        };
        let mut last_final = None;
        while let Some(item) = sub.next().await {
            let event = item?;
            if event.is_final() {
                last_final = Some(event);
            }
        }
        last_final.ok_or(Error::ProtocolViolation)
    }
}

struct Subscription {
    shared: Arc<Shared>,
    cursor: usize,
    /// Held only by the driver subscription.
    producer: Option<EventStream>,
    error_delivered: bool,
}

enum Step {
    Yield(Option<Result<StreamEvent>>),
    Drive,
    Wait,
}

impl Subscription {
    async fn next(&mut self) -> Option<Result<StreamEvent>> {
        use futures::StreamExt;

        loop {
            match self.step() {
                Step::Yield(item) => return item,
                Step::Drive => {
                    let producer = match self.producer.as_mut() {
                        Some(p) => p,
                        // Claimed but the handle is gone; cannot happen, but
                        // degrade to a protocol error rather than panic.
                        None => return Some(Err(Error::ProtocolViolation)),
                    };
                    let pulled = producer.next().await;
                    return Some(self.record(pulled));
                }
                Step::Wait => self.wait_for_append().await,
            }
        }
    }

    /// Decide what to do next under the state lock.
    fn step(&mut self) -> Step {
        let mut state = self.shared.state.lock().unwrap();

        if self.cursor < state.events.len() {
            let event = state.events[self.cursor].clone();
            self.cursor += 1;
            return Step::Yield(Some(Ok(event)));
        }

        match &state.terminal {
            Some(Terminal::Finished) => return Step::Yield(None),
            Some(Terminal::Errored(e)) => {
                if self.error_delivered {
                    return Step::Yield(None);
                }
                self.error_delivered = true;
                return Step::Yield(Some(Err(e.clone())));
            }
            None => {}
        }

        if self.producer.is_some() {
            return Step::Drive;
        }
        if !state.driver_claimed {
            state.driver_claimed = true;
            self.producer = state.producer.take();
            return Step::Drive;
        }
        Step::Wait
    }

    /// Record what the driver pulled and wake the other subscriptions.
    fn record(&mut self, pulled: Option<Result<StreamEvent>>) -> Result<StreamEvent> {
        let mut state = self.shared.state.lock().unwrap();
        let out = match pulled {
            Some(Ok(event)) => {
                if event.is_final() {
                    state.terminal = Some(Terminal::Finished);
                }
                state.events.push(event.clone());
                self.cursor += 1;
                Ok(event)
            }
            Some(Err(e)) => {
                state.terminal = Some(Terminal::Errored(e.clone()));
                self.error_delivered = true;
                Err(e)
            }
            // Producer completed without a Final event.
            None => {
                let e = Error::ProtocolViolation;
                state.terminal = Some(Terminal::Errored(e.clone()));
                self.error_delivered = true;
                Err(e)
            }
        };
        drop(state);
        self.shared.notify.notify_waiters();
        out
    }

    /// Park until the driver appends an event or terminates the stream.
    ///
    /// The notified future is enabled while the state lock is held, so an
    /// append between the condition check and the await cannot be missed.
    async fn wait_for_append(&mut self) {
        let notified = self.shared.notify.notified();
        tokio::pin!(notified);
        {
            let state = self.shared.state.lock().unwrap();
            if self.cursor < state.events.len() || state.terminal.is_some() {
                return;
            }
            notified.as_mut().enable();
        }
        notified.await;
    }
}
