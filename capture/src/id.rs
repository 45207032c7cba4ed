//! Content hashes and per-kind object ids.
//!
//! A [`Hash64`] is the 64-bit content hash that identifies an object across
//! the whole system. In the textual document it renders as a decimal string
//! so that parsers without 64-bit integer support survive; in the archive it
//! is a little-endian `u64`.
//!
//! Object ids are thin per-kind newtypes over an opaque `u64`. On the record
//! side the value is whatever handle the application registered; on the
//! replay side it is the handle the consumer's sink returned for the
//! dependency. Identity sinks simply return the content hash, so no raw
//! integer reinterpretation is ever needed.

/// A 64-bit content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash64(u64);

impl Hash64 {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw hash value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Little-endian wire bytes (archive record header form).
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Parse the decimal-string rendering used by the textual document.
    ///
    /// Leading `+`, whitespace, and hex prefixes are all rejected; the only
    /// accepted form is the ASCII decimal digits of the `u64`.
    #[must_use]
    pub fn parse_decimal(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u64>().ok().map(Self)
    }
}

impl std::fmt::Display for Hash64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a per-kind id newtype over an opaque `u64`.
macro_rules! define_object_ids {
    ( $( $(#[$meta:meta])* $name:ident ),+ $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u64);

            impl $name {
                #[must_use]
                pub const fn new(value: u64) -> Self {
                    Self(value)
                }

                /// The raw id value.
                #[must_use]
                pub const fn value(self) -> u64 {
                    self.0
                }
            }

            impl From<Hash64> for $name {
                /// Identity-handle construction: the hash IS the handle.
                fn from(hash: Hash64) -> Self {
                    Self(hash.value())
                }
            }
        )+
    };
}

define_object_ids! {
    /// Reference to a recorded sampler.
    SamplerId,
    /// Reference to a recorded descriptor set layout.
    SetLayoutId,
    /// Reference to a recorded pipeline layout.
    PipelineLayoutId,
    /// Reference to a recorded shader module.
    ShaderModuleId,
    /// Reference to a recorded render pass.
    RenderPassId,
    /// Reference to a recorded pipeline (compute or graphics; base-pipeline
    /// references may point at either, so the namespace is shared).
    PipelineId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip() {
        for v in [0u64, 1, 42, u64::from(u32::MAX), u64::MAX] {
            let h = Hash64::new(v);
            assert_eq!(Hash64::parse_decimal(&h.to_string()), Some(h));
        }
    }

    #[test]
    fn decimal_rejects_non_digits() {
        assert_eq!(Hash64::parse_decimal(""), None);
        assert_eq!(Hash64::parse_decimal("0x10"), None);
        assert_eq!(Hash64::parse_decimal("-1"), None);
        assert_eq!(Hash64::parse_decimal("+1"), None);
        assert_eq!(Hash64::parse_decimal(" 1"), None);
        // One past u64::MAX.
        assert_eq!(Hash64::parse_decimal("18446744073709551616"), None);
    }

    #[test]
    fn identity_handle_construction() {
        let h = Hash64::new(77);
        assert_eq!(SamplerId::from(h).value(), 77);
        assert_eq!(PipelineId::from(h).value(), 77);
    }
}
