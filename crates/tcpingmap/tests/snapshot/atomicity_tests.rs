//! Readers racing a publisher only ever see whole snapshots

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tcpingmap::{ProbeResult, Snapshot, SnapshotStore};

const ENTRIES: usize = 64;

fn generation(value: u32) -> Snapshot {
    (0..ENTRIES)
        .map(|i| (format!("Region-City{i} (ISP)"), ProbeResult::new(Some(f64::from(value)))))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reads_see_whole_snapshots() {
    let store = Arc::new(SnapshotStore::in_memory());
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut observed = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let Some(snapshot) = store.read() else { continue };
                    assert_eq!(snapshot.len(), ENTRIES);

                    let mut values = snapshot.iter().map(|(_, result)| result.average_delay_ms);
                    let first = values.next().flatten();
                    assert!(values.all(|value| value == first), "mixed generations observed");
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    for value in 0..500 {
        store.publish(generation(value)).await.unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().expect("reader thread panicked");
    }

    let last = store.read().unwrap();
    assert_eq!(last.get("Region-City0 (ISP)"), Some(&ProbeResult::new(Some(499.0))));
}

#[tokio::test]
async fn test_publish_replaces_wholesale() {
    let store = SnapshotStore::in_memory();
    store.publish(generation(1)).await.unwrap();

    let smaller: Snapshot =
        [("Other-City (ISP)".to_string(), ProbeResult::no_data())].into_iter().collect();
    store.publish(smaller.clone()).await.unwrap();

    let current = store.read().unwrap();
    assert_eq!(current.as_ref(), &smaller);
    assert!(current.get("Region-City0 (ISP)").is_none());
}
