//! The channel a dialogue uses to report back to its coordinator.
//!
//! A coordinator attaches a `DialogueSink` to every dialogue it pushes. The
//! sink is tagged with the instance key of that push, which is how the
//! coordinator recognises output from a dialogue that is no longer on top.
//! Events queue on an unbounded channel and are drained by the coordinator
//! after each call into dialogue code.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use colloquy_contracts::error::ColloquyError;

use crate::output::DialogueOutput;

/// Identity of one pushed dialogue instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogueKey(pub u64);

/// The three notifications a dialogue can raise.
#[derive(Debug)]
pub enum DialogueEvent {
    /// A step started processing; the coordinator reports itself active.
    OutputStarting,
    /// A turn is complete. `is_finished` means the dialogue has nothing left
    /// to do and should be popped.
    Output {
        output: DialogueOutput,
        is_finished: bool,
    },
    /// The dialogue failed.
    Error(ColloquyError),
}

/// A `DialogueEvent` tagged with the key of the dialogue that raised it.
#[derive(Debug)]
pub struct Envelope {
    pub key: DialogueKey,
    pub event: DialogueEvent,
}

#[derive(Debug, Clone)]
pub struct DialogueSink {
    key: DialogueKey,
    tx: UnboundedSender<Envelope>,
}

impl DialogueSink {
    pub fn new(key: DialogueKey, tx: UnboundedSender<Envelope>) -> Self {
        Self { key, tx }
    }

    /// A sink not attached to any coordinator, for driving a dialogue by hand.
    pub fn channel() -> (Self, SinkReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(DialogueKey(0), tx), SinkReceiver { rx })
    }

    pub fn key(&self) -> DialogueKey {
        self.key
    }

    pub fn output_starting(&self) {
        self.emit(DialogueEvent::OutputStarting);
    }

    pub fn output(&self, output: DialogueOutput, is_finished: bool) {
        self.emit(DialogueEvent::Output {
            output,
            is_finished,
        });
    }

    pub fn error(&self, error: ColloquyError) {
        self.emit(DialogueEvent::Error(error));
    }

    fn emit(&self, event: DialogueEvent) {
        let envelope = Envelope {
            key: self.key,
            event,
        };
        if self.tx.send(envelope).is_err() {
            debug!(key = self.key.0, "coordinator gone; dialogue event dropped");
        }
    }
}

/// Receiving end of `DialogueSink::channel`.
#[derive(Debug)]
pub struct SinkReceiver {
    rx: UnboundedReceiver<Envelope>,
}

impl SinkReceiver {
    /// Next queued event, if any.
    pub fn try_next(&mut self) -> Option<DialogueEvent> {
        self.rx.try_recv().ok().map(|envelope| envelope.event)
    }

    /// Every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<DialogueEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Only the `Output` events currently queued, oldest first.
    pub fn outputs(&mut self) -> Vec<(DialogueOutput, bool)> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                DialogueEvent::Output {
                    output,
                    is_finished,
                } => Some((output, is_finished)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_channel_delivers_events_in_order() {
        let (sink, mut rx) = DialogueSink::channel();
        sink.output_starting();
        sink.output(DialogueOutput::new().message("hi"), true);
        sink.error(ColloquyError::Busy);

        let events = rx.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], DialogueEvent::OutputStarting));
        assert!(matches!(&events[1], DialogueEvent::Output { is_finished: true, output } if output.messages.len() == 1));
        assert!(matches!(events[2], DialogueEvent::Error(ColloquyError::Busy)));
        assert!(rx.try_next().is_none());
    }

    #[test]
    fn emitting_after_receiver_dropped_does_not_panic() {
        let (sink, rx) = DialogueSink::channel();
        drop(rx);
        sink.output_starting();
    }
}
