//! Recursive Length Prefix container encoding
//!
//! Byte strings and nested lists, each length-prefixed. Decoding is strict:
//! only the canonical encoding of an item is accepted, so that
//! `encode(decode(b)) == b` holds for every accepted input.

use ethers_core::types::U256;

const SHORT_STRING_OFFSET: u8 = 0x80;
const LONG_STRING_OFFSET: u8 = 0xb7;
const SHORT_LIST_OFFSET: u8 = 0xc0;
const LONG_LIST_OFFSET: u8 = 0xf7;

/// Payloads shorter than this use the single-byte length form
const SHORT_PAYLOAD_LIMIT: usize = 56;

/// Deepest list nesting accepted by [`decode`]
pub const MAX_DEPTH: usize = 16;

/// A decoded RLP item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn is_list(&self) -> bool {
        matches!(self, RlpItem::List(_))
    }

    /// The byte-string payload, or `None` for a list
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(bytes) => Some(bytes.as_slice()),
            RlpItem::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Some(items.as_slice()),
            RlpItem::Bytes(_) => None,
        }
    }

    /// Minimal big-endian form of an integer (zero is the empty string)
    pub fn from_u256(value: &U256) -> Self {
        RlpItem::Bytes(u256_to_trimmed_bytes(value))
    }
}

/// RLP decoding failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RlpError {
    #[error("input is empty")]
    Empty,

    #[error("item at offset {offset} needs {needed} bytes, only {available} available")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("single byte 0x{0:02x} below 0x80 must not be prefixed")]
    NonCanonicalSingleByte(u8),

    #[error("length of length has a leading zero byte")]
    LeadingZeroLength,

    #[error("long form used for a payload of {0} bytes")]
    NonCanonicalLength(usize),

    #[error("length prefix does not fit in usize")]
    LengthOverflow,

    #[error("{0} trailing bytes after the top-level item")]
    TrailingBytes(usize),

    #[error("lists nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Encode an item
pub fn encode(item: &RlpItem) -> Vec<u8> {
    match item {
        RlpItem::Bytes(bytes) => encode_bytes(bytes),
        RlpItem::List(items) => encode_list(items),
    }
}

/// Encode a byte string
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < SHORT_STRING_OFFSET {
        return vec![data[0]];
    }
    let mut encoded = encode_header(data.len(), SHORT_STRING_OFFSET, LONG_STRING_OFFSET);
    encoded.extend_from_slice(data);
    encoded
}

/// Encode a list of items
pub fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let mut content = Vec::new();
    for item in items {
        content.extend_from_slice(&encode(item));
    }

    let mut encoded = encode_header(content.len(), SHORT_LIST_OFFSET, LONG_LIST_OFFSET);
    encoded.extend_from_slice(&content);
    encoded
}

fn encode_header(len: usize, short_offset: u8, long_offset: u8) -> Vec<u8> {
    if len < SHORT_PAYLOAD_LIMIT {
        vec![short_offset + len as u8]
    } else {
        let len_bytes = encode_length(len);
        let mut header = Vec::with_capacity(1 + len_bytes.len());
        header.push(long_offset + len_bytes.len() as u8);
        header.extend_from_slice(&len_bytes);
        header
    }
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

/// Decode exactly one item spanning the whole input
pub fn decode(data: &[u8]) -> Result<RlpItem, RlpError> {
    if data.is_empty() {
        return Err(RlpError::Empty);
    }
    let (item, consumed) = decode_item(data, 0, 0)?;
    if consumed != data.len() {
        return Err(RlpError::TrailingBytes(data.len() - consumed));
    }
    Ok(item)
}

/// Decode the item starting at `offset`, returning it with the offset just past it.
///
/// `depth` counts the lists enclosing the item.
fn decode_item(data: &[u8], offset: usize, depth: usize) -> Result<(RlpItem, usize), RlpError> {
    let prefix = *data.get(offset).ok_or(RlpError::UnexpectedEnd {
        offset,
        needed: 1,
        available: 0,
    })?;

    match prefix {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), offset + 1)),
        0x80..=0xb7 => {
            let len = (prefix - SHORT_STRING_OFFSET) as usize;
            let start = offset + 1;
            let payload = take(data, start, len)?;
            if len == 1 && payload[0] < SHORT_STRING_OFFSET {
                return Err(RlpError::NonCanonicalSingleByte(payload[0]));
            }
            Ok((RlpItem::Bytes(payload.to_vec()), start + len))
        }
        0xb8..=0xbf => {
            let (start, len) = decode_long_length(data, offset, prefix - LONG_STRING_OFFSET)?;
            let payload = take(data, start, len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), start + len))
        }
        0xc0..=0xf7 => {
            let len = (prefix - SHORT_LIST_OFFSET) as usize;
            let start = offset + 1;
            let items = decode_list_payload(data, start, len, depth)?;
            Ok((RlpItem::List(items), start + len))
        }
        0xf8..=0xff => {
            let (start, len) = decode_long_length(data, offset, prefix - LONG_LIST_OFFSET)?;
            let items = decode_list_payload(data, start, len, depth)?;
            Ok((RlpItem::List(items), start + len))
        }
    }
}

fn decode_list_payload(
    data: &[u8],
    start: usize,
    len: usize,
    depth: usize,
) -> Result<Vec<RlpItem>, RlpError> {
    if depth >= MAX_DEPTH {
        return Err(RlpError::TooDeep(MAX_DEPTH));
    }
    take(data, start, len)?;
    let end = start + len;
    let mut items = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let (item, next) = decode_item(&data[..end], cursor, depth + 1)?;
        items.push(item);
        cursor = next;
    }
    Ok(items)
}

/// Read a long-form length; returns (payload start, payload length)
fn decode_long_length(data: &[u8], offset: usize, len_of_len: u8) -> Result<(usize, usize), RlpError> {
    let len_of_len = len_of_len as usize;
    let len_bytes = take(data, offset + 1, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(RlpError::LeadingZeroLength);
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(RlpError::LengthOverflow);
    }
    let len = len_bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if len < SHORT_PAYLOAD_LIMIT {
        return Err(RlpError::NonCanonicalLength(len));
    }
    Ok((offset + 1 + len_of_len, len))
}

fn take(data: &[u8], start: usize, len: usize) -> Result<&[u8], RlpError> {
    let available = data.len().saturating_sub(start);
    let end = start.checked_add(len).ok_or(RlpError::LengthOverflow)?;
    if end > data.len() {
        return Err(RlpError::UnexpectedEnd {
            offset: start,
            needed: len,
            available,
        });
    }
    Ok(&data[start..end])
}

/// Minimal big-endian bytes of an integer
pub fn u256_to_trimmed_bytes(value: &U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let start = buf.iter().position(|&b| b != 0).unwrap_or(buf.len());
    buf[start..].to_vec()
}

/// Big-endian bytes to integer; `None` when wider than 256 bits
pub fn u256_from_bytes(bytes: &[u8]) -> Option<U256> {
    if bytes.len() > 32 {
        return None;
    }
    Some(U256::from_big_endian(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_single_bytes() {
        assert_eq!(encode_bytes(&[]), vec![0x80]);
        assert_eq!(encode_bytes(&[0x00]), vec![0x00]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_bytes(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(encode_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn test_encode_long_string() {
        let data = vec![0xaa; 56];
        let encoded = encode_bytes(&data);
        assert_eq!(&encoded[..2], &[0xb8, 56]);
        assert_eq!(encoded.len(), 58);

        let data = vec![0xaa; 1024];
        let encoded = encode_bytes(&data);
        assert_eq!(&encoded[..3], &[0xb9, 0x04, 0x00]);
    }

    #[test]
    fn test_encode_lists() {
        assert_eq!(encode_list(&[]), vec![0xc0]);

        // [ [], [[]], [ [], [[]] ] ]
        let set = RlpItem::List(vec![
            RlpItem::List(vec![]),
            RlpItem::List(vec![RlpItem::List(vec![])]),
            RlpItem::List(vec![
                RlpItem::List(vec![]),
                RlpItem::List(vec![RlpItem::List(vec![])]),
            ]),
        ]);
        assert_eq!(
            encode(&set),
            vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]
        );
    }

    #[test]
    fn test_decode_inverts_encode() {
        let item = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::Bytes(vec![]),
            RlpItem::List(vec![RlpItem::Bytes(vec![0x01; 70])]),
        ]);
        let encoded = encode(&item);
        assert_eq!(decode(&encoded).unwrap(), item);
    }

    #[test]
    fn test_decode_rejects_prefixed_single_byte() {
        assert_eq!(
            decode(&[0x81, 0x05]),
            Err(RlpError::NonCanonicalSingleByte(0x05))
        );
    }

    #[test]
    fn test_decode_rejects_long_form_for_short_payload() {
        let mut data = vec![0xb8, 0x02];
        data.extend_from_slice(&[0xaa, 0xbb]);
        assert_eq!(decode(&data), Err(RlpError::NonCanonicalLength(2)));
    }

    #[test]
    fn test_decode_rejects_leading_zero_length() {
        let mut data = vec![0xb9, 0x00, 0x40];
        data.extend_from_slice(&[0xaa; 64]);
        assert_eq!(decode(&data), Err(RlpError::LeadingZeroLength));
    }

    #[test]
    fn test_decode_rejects_truncated_and_trailing() {
        assert!(matches!(
            decode(&[0x83, b'd', b'o']),
            Err(RlpError::UnexpectedEnd { .. })
        ));
        assert_eq!(decode(&[0x80, 0x80]), Err(RlpError::TrailingBytes(1)));
        assert_eq!(decode(&[]), Err(RlpError::Empty));
    }

    #[test]
    fn test_decode_list_item_overrunning_parent() {
        // The outer list claims 2 bytes but its inner string needs 3
        assert!(matches!(
            decode(&[0xc2, 0x82, 0xaa, 0xbb]),
            Err(RlpError::UnexpectedEnd { .. })
        ));
    }

    fn nested_lists(depth: usize) -> Vec<u8> {
        // Headers are built innermost first, then laid out outermost first
        let mut headers = Vec::with_capacity(depth);
        let mut len = 1;
        for _ in 0..depth {
            let header = encode_header(len, SHORT_LIST_OFFSET, LONG_LIST_OFFSET);
            len += header.len();
            headers.push(header);
        }
        let mut encoded: Vec<u8> = headers.into_iter().rev().flatten().collect();
        encoded.push(0xc0);
        encoded
    }

    #[test]
    fn test_decode_rejects_deep_nesting() {
        assert_eq!(decode(&nested_lists(20_000)), Err(RlpError::TooDeep(MAX_DEPTH)));
        assert_eq!(decode(&nested_lists(MAX_DEPTH)), Err(RlpError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_decode_accepts_nesting_up_to_limit() {
        let mut item = RlpItem::List(vec![]);
        for _ in 1..MAX_DEPTH {
            item = RlpItem::List(vec![item]);
        }
        assert_eq!(decode(&encode(&item)).unwrap(), item);
    }

    #[test]
    fn test_u256_trimming() {
        assert!(u256_to_trimmed_bytes(&U256::zero()).is_empty());
        assert_eq!(u256_to_trimmed_bytes(&U256::from(0xad5au64)), vec![0xad, 0x5a]);
        assert_eq!(u256_to_trimmed_bytes(&U256::MAX), vec![0xff; 32]);
        assert_eq!(u256_from_bytes(&[0xad, 0x5a]), Some(U256::from(0xad5au64)));
        assert_eq!(u256_from_bytes(&[0x01; 33]), None);
    }
}
