//! Bounded audio ingress queue between the caller and a session.
//!
//! Exactly one producer and one consumer exist at a time. The producer side
//! is held by whoever feeds audio into the session (the WebSocket ingress);
//! the consumer side is owned by the session's outbound sequencer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::SpeechError;

/// One unit dequeued from the ingress queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem {
    /// A raw audio chunk. May be empty; empty chunks are valid but inert.
    Chunk(Bytes),
    /// The terminal sentinel: no more audio will be enqueued.
    End,
}

/// Creates a bounded ingress queue with the given chunk capacity.
pub fn channel(capacity: usize) -> (AudioProducer, mpsc::Receiver<QueueItem>) {
    let (tx, rx) = mpsc::channel(capacity);
    let producer = AudioProducer {
        tx,
        finished: Arc::new(AtomicBool::new(false)),
    };
    (producer, rx)
}

/// The producer side of the ingress queue.
pub struct AudioProducer {
    tx: mpsc::Sender<QueueItem>,
    finished: Arc<AtomicBool>,
}

impl AudioProducer {
    /// Enqueues an audio chunk, waiting when the queue is full.
    ///
    /// Chunks pushed after [`finish`](Self::finish) are silently dropped:
    /// only the first sentinel is meaningful and nothing may follow it.
    pub async fn push(&self, chunk: Bytes) -> Result<(), SpeechError> {
        if self.finished.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.tx
            .send(QueueItem::Chunk(chunk))
            .await
            .map_err(|_| SpeechError::Transport("audio queue closed".to_string()))
    }

    /// Enqueues the terminal sentinel. Safe to call any number of times;
    /// only the first call enqueues anything.
    pub async fn finish(&self) {
        if !self.finished.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(QueueItem::End).await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finish_enqueues_exactly_one_sentinel() {
        let (producer, mut rx) = channel(4);
        producer.finish().await;
        producer.finish().await;
        drop(producer);

        assert_eq!(rx.recv().await, Some(QueueItem::End));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn pushes_after_finish_are_dropped() {
        let (producer, mut rx) = channel(4);
        producer.push(Bytes::from_static(b"first")).await.unwrap();
        producer.finish().await;
        producer.push(Bytes::from_static(b"late")).await.unwrap();
        drop(producer);

        assert_eq!(rx.recv().await, Some(QueueItem::Chunk(Bytes::from_static(b"first"))));
        assert_eq!(rx.recv().await, Some(QueueItem::End));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn push_fails_once_the_consumer_is_gone() {
        let (producer, rx) = channel(1);
        drop(rx);
        let err = producer.push(Bytes::from_static(b"pcm")).await.unwrap_err();
        assert!(matches!(err, SpeechError::Transport(_)));
    }
}
