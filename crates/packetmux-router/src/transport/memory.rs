use bytes::Bytes;
use dashmap::DashMap;

use packetmux_core::Result;

use super::{Delivery, Inbox, Transport};

/// In-process broker: topic -> subscribed inboxes, fan-out on publish.
///
/// Closed inboxes (dropped clients) are pruned lazily on the next publish to
/// their topic.
#[derive(Default)]
pub struct MemoryBroker {
    topics: DashMap<String, Vec<Inbox>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|e| e.key().clone()).collect()
    }
}

impl Transport for MemoryBroker {
    fn subscribe(&self, topic: &str, inbox: Inbox) -> Result<()> {
        let mut subs = self.topics.entry(topic.to_string()).or_default();
        if !subs.iter().any(|s| s.same_channel(&inbox)) {
            subs.push(inbox);
        }
        Ok(())
    }

    fn publish(&self, topic: &str, payload: Bytes) -> Result<usize> {
        let Some(mut subs) = self.topics.get_mut(topic) else {
            tracing::trace!(%topic, "publish to topic without subscribers");
            return Ok(0);
        };
        subs.retain(|s| !s.is_closed());

        let mut delivered = 0;
        for inbox in subs.iter() {
            let d = Delivery {
                topic: topic.to_string(),
                payload: payload.clone(),
            };
            if inbox.send(d).is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}
