//! Bounded work queue between the requester and resolver pools
//!
//! A fixed-capacity FIFO built on a crossbeam bounded channel. `put` blocks
//! while the queue is full and `get` blocks while it is empty, which gives the
//! requester pool backpressure against slow resolvers.
//!
//! Resolver threads are stopped by [`WorkItem::Shutdown`], one per thread,
//! pushed by the coordinator after every requester has joined.

use crate::error::QueueError;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An item travelling from the requester pool to the resolver pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A hostname to resolve
    Lookup(String),

    /// Stop the resolver thread that receives this
    Shutdown,
}

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,

    /// Number of puts that found the queue full and had to wait
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    /// Get number of enqueued items
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Get number of dequeued items
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Get backpressure event count
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }
}

/// Fixed-capacity blocking FIFO queue
///
/// Safe for any number of concurrent producers and consumers. Items come out
/// in the order they went in; there is no ordering guarantee among threads
/// waiting on the same side.
pub struct BoundedQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: usize,
    stats: Arc<QueueStats>,
}

impl<T> BoundedQueue<T> {
    /// Create a new queue holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            capacity,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Insert an item at the tail, blocking while the queue is full
    pub fn put(&self, item: T) -> Result<(), QueueError> {
        let item = match self.sender.try_send(item) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Full(item)) => {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                item
            }
            Err(TrySendError::Disconnected(_)) => return Err(QueueError::Disconnected),
        };

        self.sender
            .send(item)
            .map_err(|_| QueueError::Disconnected)?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove the item at the head, blocking while the queue is empty
    pub fn get(&self) -> Result<T, QueueError> {
        let item = self.receiver.recv().map_err(|_| QueueError::Disconnected)?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Ok(item)
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the number of pending items, for diagnostics only
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the queue is empty (snapshot)
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_queue_fifo() {
        let queue = BoundedQueue::new(4);

        queue.put("a".to_string()).unwrap();
        queue.put("b".to_string()).unwrap();
        queue.put("c".to_string()).unwrap();
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.get().unwrap(), "a");
        assert_eq!(queue.get().unwrap(), "b");
        assert_eq!(queue.get().unwrap(), "c");
        assert!(queue.is_empty());
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn test_zero_capacity_rejected() {
        let _ = BoundedQueue::<String>::new(0);
    }

    #[test]
    fn test_full_queue_blocks_until_get() {
        let queue = Arc::new(BoundedQueue::new(2));
        let third_done = Arc::new(AtomicBool::new(false));

        queue.put("a").unwrap();
        queue.put("b").unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            let third_done = Arc::clone(&third_done);
            thread::spawn(move || {
                queue.put("c").unwrap();
                third_done.store(true, Ordering::SeqCst);
            })
        };

        // The third put must still be parked on the full queue
        thread::sleep(Duration::from_millis(200));
        assert!(!third_done.load(Ordering::SeqCst));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().unwrap(), "a");
        producer.join().unwrap();
        assert!(third_done.load(Ordering::SeqCst));

        assert_eq!(queue.get().unwrap(), "b");
        assert_eq!(queue.get().unwrap(), "c");
        assert_eq!(queue.stats().backpressure_count(), 1);
    }

    #[test]
    fn test_empty_queue_blocks_until_put() {
        let queue = Arc::new(BoundedQueue::new(1));
        let got = Arc::new(AtomicBool::new(false));

        let consumer = {
            let queue = Arc::clone(&queue);
            let got = Arc::clone(&got);
            thread::spawn(move || {
                let item = queue.get().unwrap();
                got.store(true, Ordering::SeqCst);
                item
            })
        };

        thread::sleep(Duration::from_millis(200));
        assert!(!got.load(Ordering::SeqCst));

        queue.put(WorkItem::Lookup("example.com".into())).unwrap();
        let item = consumer.join().unwrap();
        assert_eq!(item, WorkItem::Lookup("example.com".into()));
    }

    #[test]
    fn test_multi_producer_multi_consumer_no_loss() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 3;
        const PER_PRODUCER: usize = 500;

        let queue = Arc::new(BoundedQueue::new(3));
        let overflow = Arc::new(AtomicBool::new(false));

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let overflow = Arc::clone(&overflow);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    loop {
                        if queue.len() > queue.capacity() {
                            overflow.store(true, Ordering::SeqCst);
                        }
                        match queue.get().unwrap() {
                            WorkItem::Lookup(name) => seen.push(name),
                            WorkItem::Shutdown => break,
                        }
                    }
                    seen
                })
            })
            .collect();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.put(WorkItem::Lookup(format!("host-{p}-{i}"))).unwrap();
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        for _ in 0..CONSUMERS {
            queue.put(WorkItem::Shutdown).unwrap();
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for consumer in consumers {
            for name in consumer.join().unwrap() {
                *counts.entry(name).or_default() += 1;
            }
        }

        assert!(!overflow.load(Ordering::SeqCst));
        assert_eq!(counts.len(), PRODUCERS * PER_PRODUCER);
        assert!(counts.values().all(|&n| n == 1));

        let stats = queue.stats();
        assert_eq!(stats.enqueued(), (PRODUCERS * PER_PRODUCER + CONSUMERS) as u64);
        assert_eq!(stats.dequeued(), stats.enqueued());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_single_producer_order_preserved() {
        let queue = Arc::new(BoundedQueue::new(2));

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..100u32 {
                    queue.put(i).unwrap();
                }
            })
        };

        let received: Vec<u32> = (0..100).map(|_| queue.get().unwrap()).collect();
        producer.join().unwrap();

        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }
}
