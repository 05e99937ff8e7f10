//! Composite big-endian key encoding for the index databases.
//!
//! Index databases use raw byte keys built from big-endian u64 segments
//! (and UUID bytes for refset items) so that LMDB's lexicographic key
//! order gives cheap prefix scans: all entries for a component are
//! contiguous under its 8-byte prefix.

use sct_types::SctId;
use uuid::Uuid;

/// Encodes a single id prefix.
pub fn one(a: SctId) -> [u8; 8] {
    a.to_be_bytes()
}

/// Encodes an (a, b) pair.
pub fn pair(a: SctId, b: SctId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&a.to_be_bytes());
    key[8..].copy_from_slice(&b.to_be_bytes());
    key
}

/// Encodes an (a, b, c) triple.
pub fn triple(a: SctId, b: SctId, c: SctId) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&a.to_be_bytes());
    key[8..16].copy_from_slice(&b.to_be_bytes());
    key[16..].copy_from_slice(&c.to_be_bytes());
    key
}

/// Encodes a (source, type, group, destination) relationship edge.
pub fn edge(source: SctId, type_id: SctId, group: u32, destination: SctId) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..8].copy_from_slice(&source.to_be_bytes());
    key[8..16].copy_from_slice(&type_id.to_be_bytes());
    key[16..20].copy_from_slice(&group.to_be_bytes());
    key[20..].copy_from_slice(&destination.to_be_bytes());
    key
}

/// Encodes an (a, b, item-uuid) refset membership key.
pub fn membership(a: SctId, b: SctId, item: &Uuid) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&a.to_be_bytes());
    key[8..16].copy_from_slice(&b.to_be_bytes());
    key[16..].copy_from_slice(item.as_bytes());
    key
}

/// Reads the big-endian u64 at a byte offset.
pub fn read_u64(key: &[u8], offset: usize) -> SctId {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&key[offset..offset + 8]);
    u64::from_be_bytes(buf)
}

/// Reads the big-endian u32 at a byte offset.
pub fn read_u32(key: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&key[offset..offset + 4]);
    u32::from_be_bytes(buf)
}

/// Reads the UUID at a byte offset.
pub fn read_uuid(key: &[u8], offset: usize) -> Uuid {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&key[offset..offset + 16]);
    Uuid::from_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips() {
        let key = edge(24700007, 116680003, 2, 6118003);
        assert_eq!(read_u64(&key, 0), 24700007);
        assert_eq!(read_u64(&key, 8), 116680003);
        assert_eq!(read_u32(&key, 16), 2);
        assert_eq!(read_u64(&key, 20), 6118003);
    }

    #[test]
    fn test_membership_round_trips() {
        let item = Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
        let key = membership(24700007, 447562003, &item);
        assert_eq!(read_u64(&key, 0), 24700007);
        assert_eq!(read_u64(&key, 8), 447562003);
        assert_eq!(read_uuid(&key, 16), item);
    }

    #[test]
    fn test_prefix_ordering_groups_by_leading_id() {
        // Big-endian encoding keeps all keys for one id contiguous.
        let a = pair(1, u64::MAX);
        let b = pair(2, 0);
        assert!(a < b);
    }
}
