use crate::error::{MapError, Result};

/// Width in bytes of one record in a refs blob.
pub const RECORD_WIDTH: usize = 10;

/// One decoded record of a refs blob, before the referenced id is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefRecord {
    pub id: u32,
    pub order: u16,
    pub freq: u16,
    pub cites: u16,
}

fn le16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn le32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decodes the refs blob of paper `id`.
///
/// Layout per record: referenced id (`u32`), reference order, reference
/// frequency and the referenced paper's cite count at export time (`u16`
/// each), all little-endian.
pub fn decode_refs(id: u32, blob: &[u8]) -> Result<Vec<RefRecord>> {
    if blob.len() % RECORD_WIDTH != 0 {
        return Err(MapError::Format {
            id,
            len: blob.len(),
        });
    }

    Ok(blob
        .chunks_exact(RECORD_WIDTH)
        .map(|record| RefRecord {
            id: le32(&record[0..4]),
            order: le16(&record[4..6]),
            freq: le16(&record[6..8]),
            cites: le16(&record[8..10]),
        })
        .collect())
}

pub fn encode_refs(records: &[RefRecord]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(records.len() * RECORD_WIDTH);
    for record in records {
        blob.extend_from_slice(&record.id.to_le_bytes());
        blob.extend_from_slice(&record.order.to_le_bytes());
        blob.extend_from_slice(&record.freq.to_le_bytes());
        blob.extend_from_slice(&record.cites.to_le_bytes());
    }
    blob
}
