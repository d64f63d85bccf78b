//! Lock-free SPSC feed from the transport thread into the session.
//!
//! The transport side only ever pushes; the session drains the queue at the
//! start of each frame, so arrivals never interleave with sampling.

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use super::StreamMessage;
use crate::error::{Result, VisualizerError};

/// Transport-side end of the feed
pub struct FeedSender {
    producer: Producer<StreamMessage>,
}

/// Session-side end of the feed
pub struct FeedReceiver {
    consumer: Consumer<StreamMessage>,
}

/// Create a bounded feed holding at most `capacity` undelivered messages
pub fn feed_channel(capacity: usize) -> (FeedSender, FeedReceiver) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    (FeedSender { producer }, FeedReceiver { consumer })
}

impl FeedSender {
    /// Enqueue a message, handing it back when the feed is full
    pub fn try_send(&mut self, message: StreamMessage) -> std::result::Result<(), StreamMessage> {
        self.producer
            .push(message)
            .map_err(|e| match e {
                PushError::Full(message) => message,
            })
    }

    /// Enqueue a message, dropping it when the feed is full
    pub fn send(&mut self, message: StreamMessage) -> Result<()> {
        self.try_send(message).map_err(|_| VisualizerError::FeedFull)
    }

    /// Free slots left in the queue
    pub fn slots(&self) -> usize {
        self.producer.slots()
    }

    /// The session dropped its receiver
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

impl FeedReceiver {
    pub fn try_recv(&mut self) -> Option<StreamMessage> {
        self.consumer.pop().ok()
    }

    /// Pop everything queued right now, in arrival order
    pub fn drain(&mut self) -> Vec<StreamMessage> {
        let mut messages = Vec::with_capacity(self.consumer.slots());
        while let Ok(message) = self.consumer.pop() {
            messages.push(message);
        }
        messages
    }

    /// Messages waiting to be drained
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }

    /// The transport dropped its sender
    pub fn is_abandoned(&self) -> bool {
        self.consumer.is_abandoned()
    }
}
