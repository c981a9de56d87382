use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use bytes::Bytes;
use reqwest::Url;
use scws::{
    download::{batch_size, BatchDownloader, SegmentSource},
    manifest::InitializationVector,
    merge::concatenate,
    segment::SegmentDescriptor,
    ScwsError, ScwsResult,
};

use crate::common::{encrypt, segment_data, IV, KEY};

#[derive(Default)]
struct TestSource {
    encrypted: bool,
    fail_at: Option<usize>,

    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: Mutex<Vec<usize>>,
    finished: Mutex<HashSet<usize>>,
}

impl TestSource {
    fn plain() -> Self {
        Self::default()
    }

    fn encrypted() -> Self {
        Self {
            encrypted: true,
            ..Default::default()
        }
    }

    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Default::default()
        }
    }
}

impl SegmentSource for TestSource {
    async fn fetch_segment(&self, segment: &SegmentDescriptor) -> ScwsResult<Bytes> {
        let index = segment.index;
        self.started.lock().unwrap().push(index);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        // later segments of a batch finish first
        tokio::time::sleep(Duration::from_millis(20 - (index % 10) as u64 * 2)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().unwrap().insert(index);

        if self.fail_at == Some(index) {
            return Err(ScwsError::HttpError(reqwest::StatusCode::NOT_FOUND));
        }
        let data = segment_data(index);
        Ok(if self.encrypted {
            Bytes::from(encrypt(&data))
        } else {
            Bytes::from(data)
        })
    }
}

fn descriptors(total: usize) -> Vec<SegmentDescriptor> {
    (0..total)
        .map(|index| {
            let symbolic_name = format!("0000-{index:04}.ts");
            SegmentDescriptor {
                index,
                resolved_url: Url::parse(&format!("https://cdn.example/hls/{symbolic_name}"))
                    .unwrap(),
                symbolic_name,
            }
        })
        .collect()
}

fn expected(total: usize) -> Vec<u8> {
    (0..total).flat_map(segment_data).collect()
}

#[tokio::test]
async fn test_reassembles_in_order() -> anyhow::Result<()> {
    for total in [0, 1, 2, 9, 10, 11, 23, 57] {
        let source = Arc::new(TestSource::plain());
        let slots = BatchDownloader::new(source.clone())
            .fetch_and_decrypt(&descriptors(total), &KEY, None)
            .await?;
        assert_eq!(slots.len(), total);

        let output = concatenate(slots)?;
        assert_eq!(output, expected(total));
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= batch_size(total).max(1));
    }
    Ok(())
}

#[tokio::test]
async fn test_batches_run_behind_a_barrier() -> anyhow::Result<()> {
    let total = 23;
    let size = batch_size(total);
    let source = Arc::new(TestSource::plain());
    BatchDownloader::new(source.clone())
        .fetch_and_decrypt(&descriptors(total), &KEY, None)
        .await?;

    // every segment of batch n starts before any segment of batch n + 1
    let started = source.started.lock().unwrap().clone();
    let batches: Vec<usize> = started.iter().map(|index| index / size).collect();
    assert!(batches.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), size);

    Ok(())
}

#[tokio::test]
async fn test_decrypts_with_shared_iv() -> anyhow::Result<()> {
    let total = 13;
    let source = Arc::new(TestSource::encrypted());
    let slots = BatchDownloader::new(source)
        .fetch_and_decrypt(&descriptors(total), &KEY, Some(InitializationVector(IV)))
        .await?;

    assert_eq!(concatenate(slots)?, expected(total));
    Ok(())
}

#[tokio::test]
async fn test_missing_iv_copies_bytes() -> anyhow::Result<()> {
    let total = 4;
    let source = Arc::new(TestSource::encrypted());
    // no IV: ciphertext is passed through, even with an unusable key
    let slots = BatchDownloader::new(source)
        .fetch_and_decrypt(&descriptors(total), &[], None)
        .await?;

    let output = concatenate(slots)?;
    let ciphertext: Vec<u8> = (0..total).flat_map(|i| encrypt(&segment_data(i))).collect();
    assert_eq!(output, ciphertext);
    Ok(())
}

#[tokio::test]
async fn test_invalid_key_is_reported() {
    let source = Arc::new(TestSource::encrypted());
    let result = BatchDownloader::new(source.clone())
        .fetch_and_decrypt(&descriptors(3), &KEY[..8], Some(InitializationVector(IV)))
        .await;

    assert!(matches!(result, Err(ScwsError::InvalidKey(8))));
    assert!(source.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failure_stops_after_current_batch() {
    let total = 30;
    let size = batch_size(total);
    let source = Arc::new(TestSource::failing_at(4));

    let result = BatchDownloader::new(source.clone())
        .fetch_and_decrypt(&descriptors(total), &KEY, None)
        .await;
    assert!(matches!(
        result,
        Err(ScwsError::HttpError(reqwest::StatusCode::NOT_FOUND))
    ));

    // the failing batch settles completely, nothing after it starts
    let finished = source.finished.lock().unwrap().clone();
    let failed_batch = 4 / size;
    let expected: HashSet<usize> = (0..(failed_batch + 1) * size).collect();
    assert_eq!(finished, expected);
    assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wrong_key_does_not_yield_plaintext() {
    let source = Arc::new(TestSource::encrypted());
    let mut wrong_key = KEY;
    wrong_key[3] ^= 0x5a;

    let result = BatchDownloader::new(source)
        .fetch_and_decrypt(&descriptors(2), &wrong_key, Some(InitializationVector(IV)))
        .await;
    match result {
        Ok(slots) => assert!(concatenate(slots).map_or(true, |o| o != expected(2))),
        Err(e) => assert!(matches!(e, ScwsError::UnpadError(_))),
    }
}
