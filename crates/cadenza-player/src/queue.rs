// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FIFO queue of pending playback requests for one guild.
//!
//! A `GuildQueue` carries no synchronisation of its own. It is owned by a
//! [`PlaybackSession`](crate::session::PlaybackSession) and only touched
//! while the session's state lock is held, which serialises producers,
//! the consumer task and teardown.

use std::collections::VecDeque;

use cadenza_core::Request;

/// Ordered sequence of pending requests, served strictly first-in first-out.
#[derive(Debug, Default, Clone)]
pub struct GuildQueue {
    pending: VecDeque<Request>,
}

impl GuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request and returns its 1-based position in the queue.
    pub fn enqueue(&mut self, request: Request) -> usize {
        self.pending.push_back(request);
        self.pending.len()
    }

    /// Removes and returns the earliest request, or `None` when empty.
    pub fn dequeue_front(&mut self) -> Option<Request> {
        self.pending.pop_front()
    }

    /// Drops every pending request and returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Read-only ordered copy for display.
    pub fn snapshot(&self) -> Vec<Request> {
        self.pending.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::{ChannelId, Requester, UserId};
    use proptest::prelude::*;

    fn request(query: &str) -> Request {
        Request::new(
            query,
            Requester {
                id: UserId(1),
                display_name: "tester".into(),
                avatar_url: None,
            },
            ChannelId(10),
        )
    }

    fn queries(requests: &[Request]) -> Vec<&str> {
        requests.iter().map(|r| r.query.as_str()).collect()
    }

    #[test]
    fn enqueue_reports_position() {
        let mut queue = GuildQueue::new();
        assert_eq!(queue.enqueue(request("a")), 1);
        assert_eq!(queue.enqueue(request("b")), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn dequeue_on_empty_signals_empty() {
        let mut queue = GuildQueue::new();
        assert!(queue.dequeue_front().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_reports_dropped_count() {
        let mut queue = GuildQueue::new();
        queue.enqueue(request("a"));
        queue.enqueue(request("b"));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn snapshot_is_detached_from_queue() {
        let mut queue = GuildQueue::new();
        queue.enqueue(request("a"));
        queue.enqueue(request("b"));
        queue.enqueue(request("c"));
        let before = queue.snapshot();
        queue.dequeue_front();

        assert_eq!(queries(&before), vec!["a", "b", "c"]);
        assert_eq!(queries(&queue.snapshot()), vec!["b", "c"]);
    }

    proptest! {
        #[test]
        fn dequeue_order_matches_enqueue_order(items in proptest::collection::vec("[a-z]{1,8}", 0..32)) {
            let mut queue = GuildQueue::new();
            for q in &items {
                queue.enqueue(request(q));
            }
            let mut drained = Vec::new();
            while let Some(r) = queue.dequeue_front() {
                drained.push(r.query);
            }
            prop_assert_eq!(drained, items);
        }
    }
}
