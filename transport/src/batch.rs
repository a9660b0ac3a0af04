//! Outbound batch assembly shared by both transports.

use std::sync::Arc;

use bitstream::BitWriter;
use parking_lot::Mutex;
use tracing::error;
use wire::{write_frame, Frame, PacketTable};

use crate::error::TransportResult;

/// Checks a frame against the table before it is committed to any
/// connection's batch, so a bad value cannot leave a stream half-written.
pub(crate) fn validate_frame(table: &PacketTable, frame: &Frame) -> TransportResult<()> {
    let mut scratch = BitWriter::new();
    write_frame(table, &mut scratch, frame)?;
    Ok(())
}

/// Appends a validated frame to a pending batch.
pub(crate) fn encode_pending(table: &PacketTable, writer: &Arc<Mutex<BitWriter>>, frame: &Frame) {
    let mut writer = writer.lock();
    if let Err(err) = write_frame(table, &mut writer, frame) {
        // validate_frame ran first, so this indicates a table mismatch.
        error!(%err, "dropping frame that failed to encode");
    }
}

/// Terminates a non-empty batch with the sentinel and takes its bytes.
pub(crate) fn seal_batch(table: &PacketTable, writer: &mut BitWriter) -> Option<Vec<u8>> {
    if writer.bits_written() == 0 {
        return None;
    }
    if let Err(err) = write_frame(table, writer, &Frame::BatchEnd) {
        error!(%err, "failed to seal batch");
        return None;
    }
    Some(writer.drain())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_seals_to_nothing() {
        let table = PacketTable::builder().build();
        let mut writer = BitWriter::new();
        assert_eq!(seal_batch(&table, &mut writer), None);
    }

    #[test]
    fn sealed_batch_ends_with_sentinel() {
        let table = PacketTable::builder().build();
        let mut writer = BitWriter::new();
        write_frame(&table, &mut writer, &Frame::Disconnect).unwrap();
        let bytes = seal_batch(&table, &mut writer).unwrap();
        // Disconnect tag 3 in bits 0-2, sentinel 0 in bits 3-5, zero pad.
        assert_eq!(bytes, vec![0b0000_0011]);
        // Sealing consumed the pending bits.
        assert_eq!(writer.bits_written(), 0);
    }
}
