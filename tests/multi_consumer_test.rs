/*!
 * Multi-Consumer Tests
 * Weak fairness: no duplicate delivery, no lost item, surplus consumers stay parked
 */

use handoff_queue::BlockingHandoffQueue;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_fewer_items_than_consumers() {
    const CONSUMERS: usize = 6;
    const ITEMS: u32 = 4;

    let queue = Arc::new(BlockingHandoffQueue::new());
    let returned = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = queue.clone();
            let returned = returned.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let item = queue.receive();
                returned.fetch_add(1, Ordering::SeqCst);
                tx.send(item).unwrap();
            })
        })
        .collect();
    drop(tx);

    // Let every consumer park on the empty queue
    thread::sleep(Duration::from_millis(100));

    for i in 0..ITEMS {
        queue.append(i).unwrap();
    }

    let mut received = Vec::new();
    for _ in 0..ITEMS {
        let item = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("consumer should have received an item");
        received.push(item.expect("items were available, not end-of-stream"));
    }

    // Surplus consumers must still be blocked
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(returned.load(Ordering::SeqCst), ITEMS as usize);

    received.sort_unstable();
    assert_eq!(received, (0..ITEMS).collect::<Vec<_>>());

    // Closing releases the rest with end-of-stream
    queue.close().unwrap();
    for _ in 0..(CONSUMERS - ITEMS as usize) {
        let item = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(item, None);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_consumers_share_stream_without_duplicates() {
    const CONSUMERS: usize = 4;
    const ITEMS: usize = 2_000;

    let queue = Arc::new(BlockingHandoffQueue::new());

    let handles: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || queue.iter().collect::<Vec<usize>>())
        })
        .collect();

    for i in 0..ITEMS {
        queue.append(i).unwrap();
    }
    queue.close().unwrap();

    let mut seen = HashSet::new();
    let mut total = 0;
    for handle in handles {
        let items = handle.join().unwrap();

        // Each consumer observes a subsequence of the global order
        assert!(items.windows(2).all(|w| w[0] < w[1]));

        total += items.len();
        seen.extend(items);
    }

    assert_eq!(total, ITEMS);
    assert_eq!(seen.len(), ITEMS);
}

#[test]
fn test_close_wakes_every_blocked_consumer() {
    const CONSUMERS: usize = 8;

    let queue = Arc::new(BlockingHandoffQueue::<u8>::new());
    let finished = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = queue.clone();
            let finished = finished.clone();
            thread::spawn(move || {
                let item = queue.receive();
                finished.fetch_add(1, Ordering::SeqCst);
                item
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    let start = Instant::now();
    queue.close().unwrap();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), None);
    }
    assert_eq!(finished.load(Ordering::SeqCst), CONSUMERS);
    assert!(start.elapsed() < Duration::from_secs(1));
}
