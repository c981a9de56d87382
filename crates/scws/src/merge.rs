use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::{fs::File, io::AsyncWriteExt};

use crate::{
    error::{ScwsError, ScwsResult},
    manifest::Manifest,
};

/// Concatenates downloaded segments in slot order.
///
/// A missing or empty slot means a segment was lost on the way, which is
/// reported instead of producing a truncated stream.
pub fn concatenate(slots: Vec<Option<Bytes>>) -> ScwsResult<Bytes> {
    let total = slots
        .iter()
        .map(|slot| slot.as_ref().map_or(0, Bytes::len))
        .sum();

    let mut output = BytesMut::with_capacity(total);
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(data) if !data.is_empty() => output.extend_from_slice(&data),
            _ => return Err(ScwsError::EmptySegment(index)),
        }
    }
    Ok(output.freeze())
}

pub async fn write_output<P>(output_path: P, data: &[u8]) -> ScwsResult<()>
where
    P: AsRef<Path>,
{
    let mut output = File::create(output_path.as_ref()).await?;
    output.write_all(data).await?;
    output.flush().await?;

    log::info!(
        "All finished. Please checkout your files at {}",
        output_path.as_ref().display()
    );
    Ok(())
}

/// Exports a playlist that players can consume directly.
pub async fn write_playlist<P>(output_path: P, manifest: Manifest) -> ScwsResult<()>
where
    P: AsRef<Path>,
{
    let text = manifest.with_allow_cache().to_string();
    write_output(output_path, text.as_bytes()).await
}
