//! utils.rs
//! Small helpers shared across modules.

use std::fmt;
use num_enum::TryFromPrimitive;

use crate::constants::EXPAND_FLOOR;

/// Next capacity for an output buffer that ran out of room: 1.5x, at least `EXPAND_FLOOR`.
pub fn expand_size(old: usize) -> usize {
    if old == 0 {
        return EXPAND_FLOOR;
    }
    old.saturating_add(old >> 1).max(EXPAND_FLOOR)
}

/// Generous upper estimate of compressed size for codecs without an exact bound.
pub fn compress_bound_hint(len: usize) -> usize {
    len.saturating_add(len >> 3).saturating_add(128)
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}
