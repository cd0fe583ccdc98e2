//! Utilities for `keel-mpt`

use alloy_rlp::{Buf, Header};
use alloy_trie::Nibbles;

/// Returns the number of elements in an RLP list, without consuming the passed buffer beyond it.
pub(crate) fn rlp_list_element_length(buf: &mut &[u8]) -> alloy_rlp::Result<usize> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    let len_after_consume = buf.len() - header.payload_length;

    let mut list_element_length = 0;
    while buf.len() > len_after_consume {
        let header = Header::decode(buf)?;
        buf.advance(header.payload_length);
        list_element_length += 1;
    }
    Ok(list_element_length)
}

/// Unpacks a compact-encoded path into nibbles, prepending the odd-length nibble if present.
pub(crate) fn unpack_path_to_nibbles(first: Option<u8>, rest: &[u8]) -> Nibbles {
    let rest = Nibbles::unpack(rest);
    match first {
        Some(first) => {
            let mut nibbles = alloc::vec::Vec::with_capacity(rest.len() + 1);
            nibbles.push(first);
            nibbles.extend_from_slice(rest.as_slice());
            Nibbles::from_nibbles_unchecked(nibbles)
        }
        None => rest,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_list_element_length() {
        // [0x01, "dog", []]
        let rlp = hex!("c60183646f67c0");
        assert_eq!(rlp_list_element_length(&mut rlp.as_slice()).unwrap(), 3);
    }

    #[test]
    fn test_list_element_length_rejects_string() {
        let rlp = hex!("83646f67");
        assert_eq!(
            rlp_list_element_length(&mut rlp.as_slice()),
            Err(alloy_rlp::Error::UnexpectedString)
        );
    }

    #[test]
    fn test_unpack_odd_path() {
        let nibbles = unpack_path_to_nibbles(Some(0x0a), &[0xbc]);
        assert_eq!(nibbles.as_slice(), &[0x0a, 0x0b, 0x0c]);
        let nibbles = unpack_path_to_nibbles(None, &[0xbc]);
        assert_eq!(nibbles.as_slice(), &[0x0b, 0x0c]);
    }
}
