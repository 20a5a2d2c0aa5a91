use serde::{Deserialize, Serialize};
use std::fmt;
use volley_schema::codec::decode_ascii_string;
use volley_schema::{ByteReader, DecodeError};

/// Correlation key carried by fire and detonation messages.
///
/// Ordering sorts by issuer first, so counters are only compared within one
/// issuer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventIdentifier {
    /// Issuing object identifier, trimmed.
    pub issuer: String,
    /// Event counter.
    pub counter: u16,
}

impl EventIdentifier {
    /// Creates an identifier.
    pub fn new(issuer: impl Into<String>, counter: u16) -> Self {
        Self {
            issuer: issuer.into(),
            counter,
        }
    }

    /// Decodes an `EventIdentifierStruct`: a 16-bit counter followed by an
    /// `RTIobjectId` aligned to four octets.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let counter = reader.read_u16_be()?;
        reader.align(4)?;
        let issuer = decode_ascii_string(&mut reader)?;
        Ok(Self::new(issuer.trim(), counter))
    }

    /// Encodes the identifier in the layout [`EventIdentifier::decode`] reads.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.counter.to_be_bytes().to_vec();
        out.extend_from_slice(&[0, 0]);
        out.extend(volley_schema::codec::encode_object_id(&self.issuer));
        out
    }

    /// Whether both identifiers come from the same issuer.
    pub fn same_issuer(&self, other: &EventIdentifier) -> bool {
        self.issuer == other.issuer
    }
}

impl fmt::Display for EventIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.issuer, self.counter)
    }
}
