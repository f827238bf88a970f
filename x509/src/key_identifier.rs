//! Key identifiers derived from a public key (RFC 5280 Section 4.2.1.2).

use asn1::OctetString;
use sha1::{Digest, Sha1};

use crate::algorithm::SubjectPublicKeyInfo;

/// Method (1): the SHA-1 of the subjectPublicKey bits, excluding tag,
/// length and the unused-bits octet.
pub fn key_identifier(spki: &SubjectPublicKeyInfo) -> OctetString {
    OctetString::from(Sha1::digest(spki.key_bytes()).to_vec())
}

/// Method (2): the low 60 bits of the SHA-1 prefixed with the four bits `0100`.
pub fn truncated_key_identifier(spki: &SubjectPublicKeyInfo) -> OctetString {
    let digest = Sha1::digest(spki.key_bytes());
    let mut id = digest[12..].to_vec();
    id[0] = (id[0] & 0x0f) | 0x40;
    OctetString::from(id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::resolve::Resolve;
    use hex_literal::hex;

    pub(crate) fn ed25519_spki() -> SubjectPublicKeyInfo {
        SubjectPublicKeyInfo::from_der(&hex!(
            "302a300506032b657003210019bf44096984cdfe8541bac167dc3b96c85086aa30b6b6cb0c5c38ad703166e1"
        ))
        .unwrap()
    }

    #[test]
    fn test_key_identifier_is_sha1_of_key_bits() {
        assert_eq!(
            hex!("a28cc1f86e5960d3e03ae75c962c97a8d448293c").as_slice(),
            key_identifier(&ed25519_spki()).as_bytes()
        );
    }

    #[test]
    fn test_truncated_key_identifier() {
        // last 8 bytes 96 2c 97 a8 d4 48 29 3c, top nibble 9 replaced by 4
        let id = truncated_key_identifier(&ed25519_spki());
        assert_eq!(hex!("462c97a8d448293c").as_slice(), id.as_bytes());
        assert_eq!(0x40, id.as_bytes()[0] & 0xf0);
    }
}
