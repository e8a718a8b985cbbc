//! # Data Integrity Multikey
//!
//! This crate provides encoding and decoding of the secp256k1 key material used
//! by the Data Integrity BIP340 cryptosuites.
//!
//! ## Multikey Format
//!
//! A Multikey string consists of:
//! - a multibase prefix (`z` for base58-btc, the only base accepted here)
//! - a varint-encoded multicodec tag identifying the key kind
//! - the key bytes, whose layout depends on the tag:
//!   - `0x1301` secp256k1 private key: 32-byte scalar
//!   - `0xe7` secp256k1 public key: 1 parity byte + 32-byte x coordinate
//!   - `0x2561` secp256k1 x-only public key: 32-byte x coordinate
//!
//! ## Examples
//!
//! ```rust
//! use data_integrity_multikey::{Codec, Error, Multikey};
//!
//! let key = Multikey::new(Codec::Secp256k1XOnly, vec![7_u8; 32]);
//! let encoded = key.encode();
//! assert!(encoded.starts_with('z'));
//!
//! let decoded: Multikey = encoded.parse()?;
//! assert_eq!(decoded.codec(), Codec::Secp256k1XOnly);
//! assert_eq!(decoded.x_only_public_key()?, [7_u8; 32]);
//! # Ok::<(), Error>(())
//! ```

use multibase::Base;
use onlyerror::Error;
use std::{fmt, str::FromStr};

/// Multicodec tag for a secp256k1 public key (parity byte + x coordinate).
pub const SECP256K1_PUB_CODEC: u64 = 0xe7;

/// Multicodec tag for a BIP340 x-only secp256k1 public key.
pub const SECP256K1_XONLY_CODEC: u64 = 0x2561;

/// Multicodec tag for a secp256k1 private key.
pub const SECP256K1_PRIV_CODEC: u64 = 0x1301;

/// Length of a secp256k1 secret scalar or x-only coordinate.
pub const KEY_LEN: usize = 32;

/// Byte offset of the secret scalar in a decoded private Multikey.
pub const PRIVATE_SCALAR_OFFSET: usize = 2;

/// Byte offset of the x coordinate in a decoded public Multikey.
pub const PUBLIC_X_OFFSET: usize = 3;

/// Errors that can occur during Multikey encoding/decoding
#[derive(Debug, Error)]
pub enum Error {
    /// Multikey must start with 'z' (base58-btc)
    MultibasePrefix,

    /// Invalid multibase encoding
    #[error("Invalid multibase encoding: {0}")]
    Multibase(#[from] multibase::Error),

    /// Invalid varint codec prefix
    #[error("Invalid varint codec prefix: {0}")]
    Varint(#[from] unsigned_varint::decode::Error),

    /// Unsupported multicodec tag
    #[error("Unsupported multicodec tag: {0:#x}")]
    UnsupportedCodec(u64),

    /// Key material too short for its layout
    #[error("Invalid key material: expected at least {0} bytes, found {1}")]
    KeyLength(usize, usize),

    /// Key kind does not match the requested operation
    #[error("Multikey with codec {0} cannot be used as {1}")]
    WrongCodec(Codec, &'static str),
}

/// Multicodec key kinds supported by the BIP340 cryptosuites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// secp256k1 public key with a leading parity byte
    Secp256k1Pub,
    /// BIP340 x-only public key
    Secp256k1XOnly,
    /// secp256k1 secret scalar
    Secp256k1Priv,
}

impl Codec {
    /// The multicodec tag value.
    pub fn tag(self) -> u64 {
        match self {
            Codec::Secp256k1Pub => SECP256K1_PUB_CODEC,
            Codec::Secp256k1XOnly => SECP256K1_XONLY_CODEC,
            Codec::Secp256k1Priv => SECP256K1_PRIV_CODEC,
        }
    }
}

impl TryFrom<u64> for Codec {
    type Error = Error;

    fn try_from(tag: u64) -> Result<Self, Self::Error> {
        match tag {
            SECP256K1_PUB_CODEC => Ok(Codec::Secp256k1Pub),
            SECP256K1_XONLY_CODEC => Ok(Codec::Secp256k1XOnly),
            SECP256K1_PRIV_CODEC => Ok(Codec::Secp256k1Priv),
            _ => Err(Error::UnsupportedCodec(tag)),
        }
    }
}

impl From<Codec> for u64 {
    fn from(codec: Codec) -> Self {
        codec.tag()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Secp256k1Pub => f.write_str("secp256k1-pub"),
            Codec::Secp256k1XOnly => f.write_str("secp256k1-xonly"),
            Codec::Secp256k1Priv => f.write_str("secp256k1-priv"),
        }
    }
}

/// A decoded Multikey: a codec tag and the key bytes that follow it.
#[derive(Clone, PartialEq, Eq)]
pub struct Multikey {
    codec: Codec,
    bytes: Vec<u8>,
}

impl Multikey {
    /// Create a Multikey from a codec and its raw key bytes (without the varint prefix).
    pub fn new(codec: Codec, bytes: Vec<u8>) -> Self {
        Self { codec, bytes }
    }

    /// Decode a multibase string into a codec tag and raw key bytes.
    pub fn decode(multibase: &str) -> Result<Self, Error> {
        Self::from_prefixed_bytes(&decode_multibase(multibase)?)
    }

    /// Split multicodec-prefixed bytes into codec tag and raw key bytes.
    pub fn from_prefixed_bytes(prefixed: &[u8]) -> Result<Self, Error> {
        let (tag, rest) = unsigned_varint::decode::u64(prefixed)?;
        let codec = Codec::try_from(tag)?;

        Ok(Self {
            codec,
            bytes: rest.to_vec(),
        })
    }

    /// Varint-encode the codec tag, prepend it to the key bytes, and multibase-encode.
    pub fn encode(&self) -> String {
        multibase::encode(Base::Base58Btc, self.to_prefixed_bytes())
    }

    /// The multicodec-prefixed byte string.
    pub fn to_prefixed_bytes(&self) -> Vec<u8> {
        let mut buf = unsigned_varint::encode::u64_buffer();
        let prefix = unsigned_varint::encode::u64(self.codec.tag(), &mut buf);

        let mut data = Vec::with_capacity(prefix.len() + self.bytes.len());
        data.extend_from_slice(prefix);
        data.extend_from_slice(&self.bytes);
        data
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Raw key bytes without the codec prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The 32-byte secret scalar of a private Multikey.
    pub fn private_scalar(&self) -> Result<[u8; KEY_LEN], Error> {
        match self.codec {
            Codec::Secp256k1Priv => fixed_slice(&self.bytes, 0),
            codec => Err(Error::WrongCodec(codec, "a private key")),
        }
    }

    /// The 32-byte BIP340 x-only public key of a public Multikey.
    ///
    /// For `secp256k1-pub` keys the parity byte is skipped: BIP340 only needs x.
    pub fn x_only_public_key(&self) -> Result<[u8; KEY_LEN], Error> {
        match self.codec {
            Codec::Secp256k1Pub => fixed_slice(&self.bytes, 1),
            Codec::Secp256k1XOnly => fixed_slice(&self.bytes, 0),
            codec => Err(Error::WrongCodec(codec, "a public key")),
        }
    }
}

impl FromStr for Multikey {
    type Err = Error;

    fn from_str(multibase: &str) -> Result<Self, Self::Err> {
        Self::decode(multibase)
    }
}

impl fmt::Display for Multikey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Multikey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codec {
            Codec::Secp256k1Priv => write!(f, "Multikey({}, <redacted>)", self.codec),
            _ => write!(f, "Multikey({})", self.encode()),
        }
    }
}

/// Decode a base58-btc multibase string into its bytes (codec prefix included).
pub fn decode_multibase(encoded: &str) -> Result<Vec<u8>, Error> {
    if !encoded.starts_with('z') {
        return Err(Error::MultibasePrefix);
    }

    let (_, bytes) = multibase::decode(encoded)?;
    Ok(bytes)
}

/// Encode bytes as a base58-btc multibase string.
pub fn encode_multibase(bytes: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, bytes)
}

/// Return the secret scalar at bytes `2..34` of a decoded private Multikey.
pub fn extract_private_scalar(decoded: &[u8]) -> Result<[u8; KEY_LEN], Error> {
    fixed_slice(decoded, PRIVATE_SCALAR_OFFSET)
}

/// Return the x-only key after the 3-byte prefix (2-byte codec + parity) of a decoded public Multikey.
pub fn extract_x_only_public_key(decoded: &[u8]) -> Result<[u8; KEY_LEN], Error> {
    fixed_slice(decoded, PUBLIC_X_OFFSET)
}

fn fixed_slice(bytes: &[u8], offset: usize) -> Result<[u8; KEY_LEN], Error> {
    bytes
        .get(offset..offset + KEY_LEN)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(Error::KeyLength(offset + KEY_LEN, bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_varint_prefixes() {
        // Leading bytes from the multicodec table, varint-encoded.
        let pubkey = Multikey::new(Codec::Secp256k1Pub, vec![]);
        assert_eq!(pubkey.to_prefixed_bytes(), [0xe7, 0x01]);

        let xonly = Multikey::new(Codec::Secp256k1XOnly, vec![]);
        assert_eq!(xonly.to_prefixed_bytes(), [0xe1, 0x4a]);

        let privkey = Multikey::new(Codec::Secp256k1Priv, vec![]);
        assert_eq!(privkey.to_prefixed_bytes(), [0x81, 0x26]);
    }

    #[test]
    fn test_encode_decode_private_key() {
        let scalar = [0x42_u8; KEY_LEN];
        let encoded = Multikey::new(Codec::Secp256k1Priv, scalar.to_vec()).encode();

        let decoded = Multikey::decode(&encoded).unwrap();
        assert_eq!(decoded.codec(), Codec::Secp256k1Priv);
        assert_eq!(decoded.private_scalar().unwrap(), scalar);

        let raw = decode_multibase(&encoded).unwrap();
        assert_eq!(extract_private_scalar(&raw).unwrap(), scalar);
    }

    #[test]
    fn test_public_key_skips_parity_byte() {
        let mut bytes = vec![0x02];
        bytes.extend_from_slice(&[0x11; KEY_LEN]);
        let encoded = Multikey::new(Codec::Secp256k1Pub, bytes).encode();

        let decoded = Multikey::decode(&encoded).unwrap();
        assert_eq!(decoded.x_only_public_key().unwrap(), [0x11; KEY_LEN]);

        let raw = decode_multibase(&encoded).unwrap();
        assert_eq!(extract_x_only_public_key(&raw).unwrap(), [0x11; KEY_LEN]);
    }

    #[test]
    fn test_short_key_material() {
        let short = [0_u8; 33];
        assert!(matches!(
            extract_private_scalar(&short),
            Err(Error::KeyLength(34, 33))
        ));
        assert!(matches!(
            extract_x_only_public_key(&short),
            Err(Error::KeyLength(35, 33))
        ));

        let truncated = Multikey::new(Codec::Secp256k1Pub, vec![0x02; 20]);
        assert!(matches!(
            truncated.x_only_public_key(),
            Err(Error::KeyLength(..))
        ));
    }

    #[test]
    fn test_wrong_codec() {
        let xonly = Multikey::new(Codec::Secp256k1XOnly, vec![0; KEY_LEN]);
        assert!(matches!(
            xonly.private_scalar(),
            Err(Error::WrongCodec(Codec::Secp256k1XOnly, _))
        ));

        let privkey = Multikey::new(Codec::Secp256k1Priv, vec![0; KEY_LEN]);
        assert!(privkey.x_only_public_key().is_err());
    }

    #[test]
    fn test_invalid_encodings() {
        // Not base58-btc
        assert!(matches!(
            Multikey::decode("mAAAA"),
            Err(Error::MultibasePrefix)
        ));

        // '0' is outside the base58 alphabet
        assert!(matches!(
            Multikey::decode("z0OIl"),
            Err(Error::Multibase(_))
        ));

        // ed25519-pub (0xed) is not a supported tag
        let ed25519 = encode_multibase(&[0xed, 0x01, 0x00]);
        assert!(matches!(
            Multikey::decode(&ed25519),
            Err(Error::UnsupportedCodec(0xed))
        ));
    }

    #[test]
    fn test_debug_redacts_private_keys() {
        let privkey = Multikey::new(Codec::Secp256k1Priv, vec![9; KEY_LEN]);
        assert_eq!(format!("{privkey:?}"), "Multikey(secp256k1-priv, <redacted>)");
    }

    proptest! {
        #[test]
        fn prop_multikey_round_trip(
            codec in prop_oneof![
                Just(Codec::Secp256k1Pub),
                Just(Codec::Secp256k1XOnly),
                Just(Codec::Secp256k1Priv),
            ],
            bytes in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let key = Multikey::new(codec, bytes.clone());
            let decoded = Multikey::decode(&key.encode()).unwrap();

            prop_assert_eq!(decoded.codec(), codec);
            prop_assert_eq!(decoded.as_bytes(), &bytes[..]);
        }
    }
}
