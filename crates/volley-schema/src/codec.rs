//! Primitive codec seam and the default HLA layout.

use crate::decoder::{PrimitiveKind, Value};
use crate::errors::DecodeError;

/// Cursor over encoded bytes.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the first byte.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Skips padding so the next read starts on a multiple of `boundary`.
    pub fn align(&mut self, boundary: usize) -> Result<(), DecodeError> {
        if boundary <= 1 {
            return Ok(());
        }
        let padding = (boundary - self.position % boundary) % boundary;
        self.take(padding).map(|_| ())
    }

    /// Consumes `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.position,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Reads one octet.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i16`.
    pub fn read_i16_be(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i32`.
    pub fn read_i32_be(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `f32`.
    pub fn read_f32_be(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `f64`.
    pub fn read_f64_be(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    /// Reads an `i32` element count and checks it against the bytes left,
    /// given the minimum encoded size of one element.
    pub fn read_count(&mut self, min_element_size: usize) -> Result<usize, DecodeError> {
        let offset = self.position;
        let count = self.read_i32_be()?;
        let invalid = DecodeError::InvalidCount {
            offset,
            count: i64::from(count),
        };
        let count = usize::try_from(count).map_err(|_| invalid.clone())?;
        if count.saturating_mul(min_element_size.max(1)) > self.remaining() {
            return Err(invalid);
        }
        Ok(count)
    }
}

/// Wire layout of primitive kinds.
///
/// Composite layout (record field padding, array counts, variant
/// discriminants) is applied by [`DecoderNode`](crate::DecoderNode) using the
/// boundaries reported here.
pub trait PrimitiveCodec: Send + Sync {
    /// Octet boundary the primitive is aligned to inside composites.
    fn octet_boundary(&self, kind: PrimitiveKind) -> usize;

    /// Smallest number of bytes an encoded value occupies.
    fn min_size(&self, kind: PrimitiveKind) -> usize;

    /// Decodes one value of `kind` at the reader position.
    fn decode_primitive(
        &self,
        kind: PrimitiveKind,
        reader: &mut ByteReader<'_>,
    ) -> Result<Value, DecodeError>;
}

/// IEEE 1516-2010 basic data representation, big-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct HlaCodec;

impl PrimitiveCodec for HlaCodec {
    fn octet_boundary(&self, kind: PrimitiveKind) -> usize {
        match kind {
            PrimitiveKind::Octet | PrimitiveKind::AsciiChar => 1,
            PrimitiveKind::UnsignedInteger16BE => 2,
            PrimitiveKind::Float32BE
            | PrimitiveKind::UnsignedInteger32BE
            | PrimitiveKind::ObjectId => 4,
            PrimitiveKind::Float64BE => 8,
        }
    }

    fn min_size(&self, kind: PrimitiveKind) -> usize {
        match kind {
            PrimitiveKind::Octet | PrimitiveKind::AsciiChar => 1,
            PrimitiveKind::UnsignedInteger16BE => 2,
            PrimitiveKind::Float32BE
            | PrimitiveKind::UnsignedInteger32BE
            | PrimitiveKind::ObjectId => 4,
            PrimitiveKind::Float64BE => 8,
        }
    }

    fn decode_primitive(
        &self,
        kind: PrimitiveKind,
        reader: &mut ByteReader<'_>,
    ) -> Result<Value, DecodeError> {
        match kind {
            PrimitiveKind::Float32BE => reader.read_f32_be().map(Value::Float32),
            PrimitiveKind::Float64BE => reader.read_f64_be().map(Value::Float64),
            PrimitiveKind::Octet => reader.read_u8().map(Value::Octet),
            PrimitiveKind::AsciiChar => {
                let byte = reader.read_u8()?;
                if !byte.is_ascii() {
                    return Err(DecodeError::InvalidText(format!(
                        "byte 0x{:02x} is not ASCII",
                        byte
                    )));
                }
                Ok(Value::Char(char::from(byte)))
            }
            PrimitiveKind::ObjectId => decode_ascii_string(reader).map(Value::ObjectId),
            PrimitiveKind::UnsignedInteger16BE => reader.read_u16_be().map(Value::Unsigned16),
            PrimitiveKind::UnsignedInteger32BE => reader.read_u32_be().map(Value::Unsigned32),
        }
    }
}

/// Reads an `HLAASCIIstring`: `i32` count followed by that many ASCII bytes.
pub fn decode_ascii_string(reader: &mut ByteReader<'_>) -> Result<String, DecodeError> {
    let len = reader.read_count(1)?;
    let bytes = reader.take(len)?;
    if !bytes.is_ascii() {
        return Err(DecodeError::InvalidText("non-ASCII byte in string".to_string()));
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError::InvalidText(e.to_string()))
}

/// Reads an `HLAunicodeString`: `i32` count followed by UTF-16BE code units.
pub fn decode_unicode_string(reader: &mut ByteReader<'_>) -> Result<String, DecodeError> {
    reader.align(4)?;
    let len = reader.read_count(2)?;
    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(reader.read_u16_be()?);
    }
    String::from_utf16(&units).map_err(|e| DecodeError::InvalidText(e.to_string()))
}

/// Decodes a complete `HLAunicodeString` value.
pub fn unicode_string(bytes: &[u8]) -> Result<String, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::UnexpectedEnd {
            offset: 0,
            needed: 4,
            available: 0,
        });
    }
    decode_unicode_string(&mut ByteReader::new(bytes))
}

/// Decodes a variable array of `HLAunicodeString` values.
pub fn unicode_string_array(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.read_count(4)?;
    let mut strings = Vec::with_capacity(count);
    for _ in 0..count {
        strings.push(decode_unicode_string(&mut reader)?);
    }
    Ok(strings)
}

/// Encodes a string as `HLAunicodeString`.
pub fn encode_unicode_string(value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let mut out = Vec::with_capacity(4 + units.len() * 2);
    out.extend_from_slice(&(units.len() as i32).to_be_bytes());
    for unit in units {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Encodes strings as a variable array of `HLAunicodeString`.
pub fn encode_unicode_string_array(values: &[&str]) -> Vec<u8> {
    let mut out = (values.len() as i32).to_be_bytes().to_vec();
    for value in values {
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out.extend(encode_unicode_string(value));
    }
    out
}

/// Encodes an `RTIobjectId` / `HLAASCIIstring`.
pub fn encode_object_id(value: &str) -> Vec<u8> {
    let mut out = (value.len() as i32).to_be_bytes().to_vec();
    out.extend_from_slice(value.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_skips_padding() {
        let bytes = [1u8, 0, 0, 0, 0, 0, 0, 9];
        let mut reader = ByteReader::new(&bytes);
        reader.read_u8().unwrap();
        reader.align(4).unwrap();
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read_u32_be().unwrap(), 9);
    }

    #[test]
    fn count_larger_than_data_is_rejected() {
        let bytes = 100i32.to_be_bytes();
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            reader.read_count(1),
            Err(DecodeError::InvalidCount { count: 100, .. })
        ));
    }

    #[test]
    fn negative_count_is_rejected() {
        let bytes = (-1i32).to_be_bytes();
        let mut reader = ByteReader::new(&bytes);
        assert!(reader.read_count(1).is_err());
    }

    #[test]
    fn object_id_reads_ascii() {
        let bytes = encode_object_id("Munition-7");
        let value = HlaCodec
            .decode_primitive(PrimitiveKind::ObjectId, &mut ByteReader::new(&bytes))
            .unwrap();
        assert_eq!(value, Value::ObjectId("Munition-7".to_string()));
    }

    #[test]
    fn unicode_array_matches_encoder() {
        let bytes = encode_unicode_string_array(&["a/b/RPR-Base.xml", "Warfare.xml"]);
        assert_eq!(
            unicode_string_array(&bytes).unwrap(),
            vec!["a/b/RPR-Base.xml".to_string(), "Warfare.xml".to_string()]
        );
    }

    #[test]
    fn empty_unicode_string_fails() {
        assert!(unicode_string(&[]).is_err());
    }
}
