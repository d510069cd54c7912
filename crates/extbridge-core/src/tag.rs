//! ABI-stable type tags and the value classifier.
//!
//! Native extension code identifies host values by small integer codes.
//! The code assignments here are part of the stable ABI and must never be
//! renumbered. [`classify`] is the single mapping from a host [`Value`] to
//! its tag: a total, pure function implemented as an exhaustive match over
//! the closed value enum, so a newly added value category fails to compile
//! until it is given a tag.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{BridgeError, Result};
use crate::value::Value;

/// Bits of a raw tag byte that carry the tag code.
pub const TAG_MASK: u8 = 0x1f;

/// ABI-stable structural type tag.
///
/// Codes 0x10, 0x17..=0x19, 0x1e and 0x1f are unassigned. The
/// `Imemo`/`Node`/`Iclass`/`Zombie` codes exist in the ABI for the host
/// runtime's internal bookkeeping objects; [`classify`] never produces
/// them, but native code may hand them back across the boundary.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum TypeTag {
    None = 0x00,
    Object = 0x01,
    Class = 0x02,
    Module = 0x03,
    Float = 0x04,
    String = 0x05,
    Regexp = 0x06,
    Array = 0x07,
    Hash = 0x08,
    Struct = 0x09,
    Bignum = 0x0a,
    File = 0x0b,
    Data = 0x0c,
    Match = 0x0d,
    Complex = 0x0e,
    Rational = 0x0f,
    Nil = 0x11,
    True = 0x12,
    False = 0x13,
    Symbol = 0x14,
    Fixnum = 0x15,
    Undef = 0x16,
    Imemo = 0x1a,
    Node = 0x1b,
    Iclass = 0x1c,
    Zombie = 0x1d,
}

impl TypeTag {
    /// The raw ABI code for this tag.
    pub fn code(self) -> u8 {
        self.into()
    }

    /// Decode a raw tag byte coming across the boundary.
    ///
    /// High bits outside [`TAG_MASK`] are ignored. An in-range but
    /// unassigned code is a programming defect on the native side and
    /// reported as [`BridgeError::InternalClassification`].
    pub fn from_raw(raw: u8) -> Result<Self> {
        let code = raw & TAG_MASK;
        TypeTag::try_from(code).map_err(|_| BridgeError::InternalClassification(code))
    }

    /// Whether [`has_tag`] is defined for this tag.
    ///
    /// Membership tests are only supported for the tags native code
    /// actually probes: strings, arrays, symbols, files and the
    /// nil/boolean/fixnum singletons.
    pub fn supports_membership(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::Array
                | TypeTag::Symbol
                | TypeTag::File
                | TypeTag::Nil
                | TypeTag::True
                | TypeTag::False
                | TypeTag::Fixnum
        )
    }
}

/// Classify a host value into its ABI type tag.
///
/// Total and pure: every value maps to exactly one tag, and repeated calls
/// on the same value agree.
pub fn classify(value: &Value) -> TypeTag {
    match value {
        Value::Undef => TypeTag::Undef,
        Value::Nil => TypeTag::Nil,
        Value::True => TypeTag::True,
        Value::False => TypeTag::False,
        Value::Fixnum(_) => TypeTag::Fixnum,
        Value::Bignum(_) => TypeTag::Bignum,
        Value::Float(_) => TypeTag::Float,
        Value::Str(_) => TypeTag::String,
        Value::Symbol(_) => TypeTag::Symbol,
        Value::Regexp(_) => TypeTag::Regexp,
        Value::Array(_) => TypeTag::Array,
        Value::Hash(_) => TypeTag::Hash,
        Value::Struct(_) => TypeTag::Struct,
        Value::File(_) => TypeTag::File,
        Value::Data(_) => TypeTag::Data,
        Value::Complex(_) => TypeTag::Complex,
        Value::Rational(_) => TypeTag::Rational,
        Value::Object(_) => TypeTag::Object,
        Value::Class(_) => TypeTag::Class,
        Value::Module(_) => TypeTag::Module,
    }
}

/// Membership test: does `value` classify to `tag`?
///
/// Only defined for the subset reported by
/// [`TypeTag::supports_membership`]; anything else is
/// [`BridgeError::UnsupportedTag`].
pub fn has_tag(value: &Value, tag: TypeTag) -> Result<bool> {
    if !tag.supports_membership() {
        return Err(BridgeError::UnsupportedTag(tag));
    }
    Ok(classify(value) == tag)
}

/// Require that `value` classifies to `tag`, or fail with
/// [`BridgeError::TypeMismatch`] carrying both tags.
pub fn require_tag(value: &Value, tag: TypeTag) -> Result<()> {
    let actual = classify(value);
    if actual == tag {
        Ok(())
    } else {
        Err(BridgeError::TypeMismatch {
            expected: tag,
            actual,
        })
    }
}
