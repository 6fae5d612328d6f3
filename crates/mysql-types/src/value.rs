//! MySQL value representation.

use bytes::Bytes;

/// A MySQL value that can represent any supported column or parameter type.
///
/// This enum provides a type-safe way to handle values that may be of
/// various types, including NULL. It is the null sentinel returned by
/// scalar execution when a batch produces no rows.
#[derive(Debug, Clone, PartialEq)]
pub enum MySqlValue {
    /// NULL value.
    Null,
    /// Signed integer (TINYINT, SMALLINT, MEDIUMINT, INT, BIGINT).
    Int(i64),
    /// Unsigned integer (any integer column with the UNSIGNED flag).
    UInt(u64),
    /// 32-bit floating point (FLOAT).
    Float(f32),
    /// 64-bit floating point (DOUBLE).
    Double(f64),
    /// String value (CHAR, VARCHAR, TEXT, DECIMAL, JSON).
    Text(String),
    /// Binary value (BINARY, VARBINARY, BLOB, and undecoded temporals).
    Bytes(Bytes),
}

impl MySqlValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as an i64, if it is an integer that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get the value as a u64, if it is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get the value as an f64, if it is floating point.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is textual.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i8> for MySqlValue {
    fn from(v: i8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i16> for MySqlValue {
    fn from(v: i16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i32> for MySqlValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for MySqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u8> for MySqlValue {
    fn from(v: u8) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<u16> for MySqlValue {
    fn from(v: u16) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<u32> for MySqlValue {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<u64> for MySqlValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f32> for MySqlValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for MySqlValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for MySqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MySqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Bytes> for MySqlValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<u8>> for MySqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl<T: Into<MySqlValue>> From<Option<T>> for MySqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_null_checks() {
        assert!(MySqlValue::Null.is_null());
        assert!(!MySqlValue::Int(0).is_null());
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(MySqlValue::from(42i32).as_i64(), Some(42));
        assert_eq!(MySqlValue::from(42u16).as_u64(), Some(42));
        // Cross-sign conversions succeed only when the value fits.
        assert_eq!(MySqlValue::UInt(u64::MAX).as_i64(), None);
        assert_eq!(MySqlValue::Int(-1).as_u64(), None);
        assert_eq!(MySqlValue::Int(7).as_u64(), Some(7));
    }

    #[test]
    fn test_float_widening() {
        assert_eq!(MySqlValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(MySqlValue::Double(2.5).as_f64(), Some(2.5));
        assert_eq!(MySqlValue::Int(1).as_f64(), None);
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(MySqlValue::from(None::<i32>), MySqlValue::Null);
        assert_eq!(MySqlValue::from(Some(3i32)), MySqlValue::Int(3));
    }

    #[test]
    fn test_text_and_bytes() {
        assert_eq!(MySqlValue::from("abc").as_str(), Some("abc"));
        assert_eq!(
            MySqlValue::from(vec![1u8, 2, 3]).as_bytes(),
            Some(&[1u8, 2, 3][..])
        );
    }
}
