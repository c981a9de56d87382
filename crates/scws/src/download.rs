use std::{future::Future, sync::Arc};

use bytes::Bytes;
use futures::future::join_all;

use crate::{
    decrypt::SegmentKey,
    error::ScwsResult,
    manifest::InitializationVector,
    segment::SegmentDescriptor,
    util::http::HttpClient,
};

/// Upper bound of batches a download is split into.
pub const MAX_BATCHES: usize = 10;

/// Anything able to produce the raw bytes of a segment.
pub trait SegmentSource {
    fn fetch_segment(
        &self,
        segment: &SegmentDescriptor,
    ) -> impl Future<Output = ScwsResult<Bytes>> + Send;
}

impl SegmentSource for HttpClient {
    fn fetch_segment(
        &self,
        segment: &SegmentDescriptor,
    ) -> impl Future<Output = ScwsResult<Bytes>> + Send {
        self.get_bytes(segment.resolved_url.clone())
    }
}

impl<T> SegmentSource for Arc<T>
where
    T: SegmentSource + Send + Sync,
{
    fn fetch_segment(
        &self,
        segment: &SegmentDescriptor,
    ) -> impl Future<Output = ScwsResult<Bytes>> + Send {
        self.as_ref().fetch_segment(segment)
    }
}

/// Segments per batch, so that a download never has more than
/// [`MAX_BATCHES`] batches.
pub fn batch_size(total: usize) -> usize {
    total.div_ceil(MAX_BATCHES)
}

/// Downloads segments batch by batch.
///
/// Segments of one batch are fetched and decrypted concurrently. The next
/// batch starts only after every segment of the current one has settled.
pub struct BatchDownloader<S> {
    source: S,
}

impl<S> BatchDownloader<S>
where
    S: SegmentSource + Sync,
{
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns one slot per segment, in the order of `segments`.
    ///
    /// When `iv` is `None` the stream is not encrypted and `key` is ignored.
    /// The first failure of a batch aborts the download once that batch has
    /// settled.
    pub async fn fetch_and_decrypt(
        &self,
        segments: &[SegmentDescriptor],
        key: &[u8],
        iv: Option<InitializationVector>,
    ) -> ScwsResult<Vec<Option<Bytes>>> {
        let key = iv.map(|iv| SegmentKey::new(key, iv)).transpose()?;

        let total = segments.len();
        let mut slots: Vec<Option<Bytes>> = vec![None; total];
        if total == 0 {
            return Ok(slots);
        }

        let size = batch_size(total);
        let batches = total.div_ceil(size);
        log::info!(
            "Start downloading {total} segments in {batches} batch(es), decryption {}.",
            if key.is_some() { "enabled" } else { "disabled" }
        );

        for (batch, chunk) in segments.chunks(size).enumerate() {
            let offset = batch * size;
            let results = join_all(
                chunk
                    .iter()
                    .map(|segment| self.fetch_segment(segment, key.as_ref())),
            )
            .await;

            let mut failure = None;
            for (i, (segment, result)) in chunk.iter().zip(results).enumerate() {
                match result {
                    Ok(data) => slots[offset + i] = Some(data),
                    Err(e) => {
                        log::error!("Processing {} failed. {e}", segment.symbolic_name);
                        failure.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }

            let downloaded = offset + chunk.len();
            let percentage = downloaded as f32 / total as f32 * 100.;
            log::info!(
                "Batch {}/{batches} finished. ({downloaded} / {total} or {percentage:.2}%)",
                batch + 1
            );
        }

        Ok(slots)
    }

    async fn fetch_segment(
        &self,
        segment: &SegmentDescriptor,
        key: Option<&SegmentKey>,
    ) -> ScwsResult<Bytes> {
        let bytes = self.source.fetch_segment(segment).await?;
        match key {
            Some(key) => Ok(Bytes::from(key.decrypt(&bytes)?)),
            None => Ok(bytes),
        }
    }
}
