use super::*;
use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn first_publish_wins() {
    let slot = PublishOnce::new();
    let first = slot.publish(1);
    let second = slot.publish(2);
    assert!(first.won);
    assert!(!second.won);
    assert_eq!(*second.value, 1);
    assert!(Arc::ptr_eq(&first.value, &second.value));
}

#[test]
fn get_or_publish_skips_compute_when_published() {
    let slot = PublishOnce::new();
    slot.publish("a");
    let out = slot.get_or_publish(|| panic!("must not compute"));
    assert_eq!(*out.value, "a");
}

#[test]
fn racing_publishers_converge_on_one_value() {
    let slot = Arc::new(PublishOnce::new());
    let barrier = Arc::new(Barrier::new(8));
    let winners = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let slot = Arc::clone(&slot);
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                barrier.wait();
                let out = slot.get_or_publish(|| i);
                if out.won {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
                out.value
            })
        })
        .collect();
    let values: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
}
