//! Outbound request sequencer.
//!
//! Converts the ingress queue into the backend's expected message sequence:
//! exactly one Config message first, one Data message per non-empty chunk in
//! FIFO order with monotonically increasing sequence ids, then exactly one
//! Terminal message when the sentinel is dequeued.

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::StreamConfig;
use crate::error::SpeechError;
use crate::queue::QueueItem;
use crate::wire::OutboundMessage;

/// Runs the sequencer until the sentinel is dequeued or the stream closes.
///
/// Empty non-sentinel chunks are dropped without producing a wire message.
/// A producer that goes away without enqueuing the sentinel is treated as
/// the sentinel, so the backend still sees a well-formed end of stream.
pub async fn run(
    config: &StreamConfig,
    queue: &mut mpsc::Receiver<QueueItem>,
    outbound: mpsc::Sender<OutboundMessage>,
) -> Result<(), SpeechError> {
    send(&outbound, OutboundMessage::Config(config.clone())).await?;

    let mut seq_id: i64 = 0;
    loop {
        let item = match queue.recv().await {
            Some(item) => item,
            None => QueueItem::End,
        };
        match item {
            QueueItem::Chunk(chunk) if chunk.is_empty() => {
                trace!("dropping empty audio chunk");
            }
            QueueItem::Chunk(chunk) => {
                send(&outbound, OutboundMessage::Data { seq_id, chunk }).await?;
                seq_id += 1;
            }
            QueueItem::End => {
                send(&outbound, OutboundMessage::Terminal { seq_id }).await?;
                debug!(messages = seq_id, "audio stream sequenced to completion");
                return Ok(());
            }
        }
    }
}

async fn send(
    outbound: &mpsc::Sender<OutboundMessage>,
    message: OutboundMessage,
) -> Result<(), SpeechError> {
    outbound
        .send(message)
        .await
        .map_err(|_| SpeechError::Transport("recognition stream closed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use bytes::Bytes;

    async fn collect(items: Vec<QueueItem>) -> Vec<OutboundMessage> {
        let (producer, mut rx) = queue::channel(16);
        for item in items {
            match item {
                QueueItem::Chunk(chunk) => producer.push(chunk).await.unwrap(),
                QueueItem::End => producer.finish().await,
            }
        }
        drop(producer);

        let (out_tx, mut out_rx) = mpsc::channel(16);
        run(&StreamConfig::default(), &mut rx, out_tx).await.unwrap();

        let mut messages = Vec::new();
        while let Some(message) = out_rx.recv().await {
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn emits_config_then_data_then_terminal() {
        let messages = collect(
            vec![
                QueueItem::Chunk(Bytes::from_static(b"c1")),
                QueueItem::Chunk(Bytes::new()),
                QueueItem::Chunk(Bytes::from_static(b"c2")),
                QueueItem::End,
            ])
        .await;

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], OutboundMessage::Config(_)));
        assert_eq!(
            messages[1],
            OutboundMessage::Data { seq_id: 0, chunk: Bytes::from_static(b"c1") }
        );
        assert_eq!(
            messages[2],
            OutboundMessage::Data { seq_id: 1, chunk: Bytes::from_static(b"c2") }
        );
        assert_eq!(messages[3], OutboundMessage::Terminal { seq_id: 2 });
    }

    #[tokio::test]
    async fn dropped_producer_counts_as_sentinel() {
        let messages = collect(vec![QueueItem::Chunk(Bytes::from_static(b"c1"))]).await;
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], OutboundMessage::Config(_)));
        assert_eq!(messages[2], OutboundMessage::Terminal { seq_id: 1 });
    }

    #[tokio::test]
    async fn empty_stream_still_emits_config_and_terminal() {
        let messages = collect(vec![QueueItem::End]).await;
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], OutboundMessage::Config(_)));
        assert_eq!(messages[1], OutboundMessage::Terminal { seq_id: 0 });
    }
}
