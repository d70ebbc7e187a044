//! # Stream Synchronization
//!
//! Locates the start of the record stream after the port is opened.

use super::constants::{HEADER_SIZE, SYNC_MARKER};
use crate::error::Result;
use crate::serial::port_trait::ByteSource;
use tracing::{debug, info};

/// Skip to the first record of the stream
///
/// Consumes bytes until [`SYNC_MARKER`] has been seen, then discards the
/// [`HEADER_SIZE`]-byte device header that follows it. Blocks until the
/// marker arrives; there is no timeout.
///
/// # Returns
///
/// * `Result<usize>` - Number of bytes skipped before the marker
///
/// # Errors
///
/// Returns `Io` if the source closes or fails before the header is consumed
pub async fn synchronize<S: ByteSource + ?Sized>(source: &mut S) -> Result<usize> {
    debug!("Waiting for sync marker {:02X?}", SYNC_MARKER);

    let consumed = source.read_until(&SYNC_MARKER).await?;
    let skipped = consumed - SYNC_MARKER.len();

    let mut header = [0u8; HEADER_SIZE];
    source.read_exact(&mut header).await?;

    info!("Stream synchronized ({} bytes skipped)", skipped);
    debug!("Device header: {:02X?}", header);

    Ok(skipped)
}
