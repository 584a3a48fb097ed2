//! Fixed-width typed binary arrays.

use std::fmt;

use crate::model::Value;

/// Element type of a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BufferKind {
    Int8 = 0,
    Uint8 = 1,
    Uint8Clamped = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Float32 = 7,
    Float64 = 8,
    BigInt64 = 9,
    BigUint64 = 10,
}

impl BufferKind {
    pub const ALL: [BufferKind; 11] = [
        BufferKind::Int8,
        BufferKind::Uint8,
        BufferKind::Uint8Clamped,
        BufferKind::Int16,
        BufferKind::Uint16,
        BufferKind::Int32,
        BufferKind::Uint32,
        BufferKind::Float32,
        BufferKind::Float64,
        BufferKind::BigInt64,
        BufferKind::BigUint64,
    ];

    /// Bytes per element.
    pub fn element_size(self) -> usize {
        match self {
            BufferKind::Int8 | BufferKind::Uint8 | BufferKind::Uint8Clamped => 1,
            BufferKind::Int16 | BufferKind::Uint16 => 2,
            BufferKind::Int32 | BufferKind::Uint32 | BufferKind::Float32 => 4,
            BufferKind::Float64 | BufferKind::BigInt64 | BufferKind::BigUint64 => 8,
        }
    }

    /// The constructor name, which is also the buffer's tag.
    pub fn name(self) -> &'static str {
        match self {
            BufferKind::Int8 => "Int8Array",
            BufferKind::Uint8 => "Uint8Array",
            BufferKind::Uint8Clamped => "Uint8ClampedArray",
            BufferKind::Int16 => "Int16Array",
            BufferKind::Uint16 => "Uint16Array",
            BufferKind::Int32 => "Int32Array",
            BufferKind::Uint32 => "Uint32Array",
            BufferKind::Float32 => "Float32Array",
            BufferKind::Float64 => "Float64Array",
            BufferKind::BigInt64 => "BigInt64Array",
            BufferKind::BigUint64 => "BigUint64Array",
        }
    }

    fn is_bigint(self) -> bool {
        matches!(self, BufferKind::BigInt64 | BufferKind::BigUint64)
    }
}

/// A typed array over little-endian bytes.
///
/// Elements can be read and overwritten but the length is fixed.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer {
    kind: BufferKind,
    bytes: Vec<u8>,
}

impl Buffer {
    /// Creates a zero-filled buffer of `len` elements.
    pub fn new(kind: BufferKind, len: usize) -> Self {
        Self {
            kind,
            bytes: vec![0; len * kind.element_size()],
        }
    }

    /// Wraps raw bytes. Returns `None` unless the length is a whole
    /// number of elements.
    pub fn from_bytes(kind: BufferKind, bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() % kind.element_size() == 0).then_some(Self { kind, bytes })
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.element_size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reads element `index` as a number (or bigint for the 64-bit integer kinds).
    pub fn get(&self, index: usize) -> Option<Value> {
        let size = self.kind.element_size();
        let start = index.checked_mul(size)?;
        let chunk = self.bytes.get(start..start.checked_add(size)?)?;
        let mut raw = [0u8; 8];
        raw[..size].copy_from_slice(chunk);

        let value = match self.kind {
            BufferKind::Int8 => Value::Number(chunk[0] as i8 as f64),
            BufferKind::Uint8 | BufferKind::Uint8Clamped => Value::Number(chunk[0] as f64),
            BufferKind::Int16 => Value::Number(i16::from_le_bytes([raw[0], raw[1]]) as f64),
            BufferKind::Uint16 => Value::Number(u16::from_le_bytes([raw[0], raw[1]]) as f64),
            BufferKind::Int32 => {
                Value::Number(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64)
            }
            BufferKind::Uint32 => {
                Value::Number(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64)
            }
            BufferKind::Float32 => {
                Value::Number(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64)
            }
            BufferKind::Float64 => Value::Number(f64::from_le_bytes(raw)),
            BufferKind::BigInt64 => Value::BigInt(i64::from_le_bytes(raw) as i128),
            BufferKind::BigUint64 => Value::BigInt(u64::from_le_bytes(raw) as i128),
        };
        Some(value)
    }

    /// Writes element `index`, converting with wrap-around (or clamping
    /// for `Uint8Clamped`).
    ///
    /// Returns false if the index is out of range or the value has the
    /// wrong numeric family (numbers for bigint kinds or vice versa).
    pub fn set(&mut self, index: usize, value: &Value) -> bool {
        let size = self.kind.element_size();
        let Some(range) = index
            .checked_mul(size)
            .and_then(|start| Some(start..start.checked_add(size)?))
            .filter(|range| range.end <= self.bytes.len())
        else {
            return false;
        };
        let encoded: [u8; 8] = match (self.kind.is_bigint(), value) {
            (false, Value::Number(n)) => encode_number(self.kind, *n),
            (true, Value::BigInt(i)) => (*i as u64).to_le_bytes(),
            _ => return false,
        };
        self.bytes[range].copy_from_slice(&encoded[..size]);
        true
    }
}

fn encode_number(kind: BufferKind, n: f64) -> [u8; 8] {
    let int = if n.is_finite() { n.trunc() as i64 } else { 0 };
    let mut out = [0u8; 8];
    match kind {
        BufferKind::Int8 | BufferKind::Uint8 => out[0] = int as u8,
        BufferKind::Uint8Clamped => {
            out[0] = if n.is_nan() { 0 } else { n.clamp(0.0, 255.0).round_ties_even() as u8 }
        }
        BufferKind::Int16 | BufferKind::Uint16 => out[..2].copy_from_slice(&(int as u16).to_le_bytes()),
        BufferKind::Int32 | BufferKind::Uint32 => out[..4].copy_from_slice(&(int as u32).to_le_bytes()),
        BufferKind::Float32 => out[..4].copy_from_slice(&(n as f32).to_le_bytes()),
        BufferKind::Float64 => out = n.to_le_bytes(),
        BufferKind::BigInt64 | BufferKind::BigUint64 => {}
    }
    out
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.name())?;
        f.debug_list()
            .entries((0..self.len()).filter_map(|i| self.get(i)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_index_is_out_of_range() {
        let mut buf = Buffer::new(BufferKind::Float64, 2);
        assert!(buf.get(usize::MAX).is_none());
        assert!(buf.get(usize::MAX / 4).is_none());
        assert!(!buf.set(usize::MAX / 4, &Value::from(1)));
        assert!(buf.set(1, &Value::from(1)));
    }

    #[test]
    fn test_from_bytes_checks_width() {
        assert!(Buffer::from_bytes(BufferKind::Uint16, vec![1, 2, 3]).is_none());
        let buf = Buffer::from_bytes(BufferKind::Uint16, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(buf.len(), 2);
        assert!(matches!(buf.get(0), Some(Value::Number(n)) if n == 513.0));
        assert!(buf.get(2).is_none());
    }

    #[test]
    fn test_set_wraps_and_clamps() {
        let mut wrapping = Buffer::new(BufferKind::Uint8, 1);
        assert!(wrapping.set(0, &Value::Number(257.0)));
        assert!(matches!(wrapping.get(0), Some(Value::Number(n)) if n == 1.0));

        let mut clamped = Buffer::new(BufferKind::Uint8Clamped, 1);
        assert!(clamped.set(0, &Value::Number(300.0)));
        assert!(matches!(clamped.get(0), Some(Value::Number(n)) if n == 255.0));

        let mut signed = Buffer::new(BufferKind::Int8, 1);
        assert!(signed.set(0, &Value::Number(-1.0)));
        assert!(matches!(signed.get(0), Some(Value::Number(n)) if n == -1.0));
    }

    #[test]
    fn test_bigint_kinds() {
        let mut buf = Buffer::new(BufferKind::BigInt64, 2);
        assert!(!buf.set(0, &Value::Number(1.0)));
        assert!(buf.set(1, &Value::BigInt(-5)));
        assert!(matches!(buf.get(1), Some(Value::BigInt(-5))));
        assert!(!buf.set(2, &Value::BigInt(1)));
    }
}
