//! Helpers over [`rmp::Marker`].

pub use rmp::Marker;

/// Returns a human-readable family name for a tag byte.
pub fn family_name(tag: u8) -> &'static str {
    match Marker::from_u8(tag) {
        Marker::FixPos(_)
        | Marker::FixNeg(_)
        | Marker::U8
        | Marker::U16
        | Marker::U32
        | Marker::U64
        | Marker::I8
        | Marker::I16
        | Marker::I32
        | Marker::I64 => "int",
        Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => "map",
        Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => "array",
        Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => "str",
        Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => "bin",
        Marker::Null => "nil",
        Marker::True | Marker::False => "bool",
        Marker::F32 | Marker::F64 => "float",
        Marker::FixExt1
        | Marker::FixExt2
        | Marker::FixExt4
        | Marker::FixExt8
        | Marker::FixExt16
        | Marker::Ext8
        | Marker::Ext16
        | Marker::Ext32 => "ext",
        _ => "reserved",
    }
}

/// Bytes that follow `marker` before a value's length (or, for scalars, the
/// value itself) is complete. Ext counts its type byte.
pub fn header_width(marker: Marker) -> usize {
    match marker {
        Marker::U8 | Marker::I8 | Marker::Str8 | Marker::Bin8 => 1,
        Marker::U16
        | Marker::I16
        | Marker::Str16
        | Marker::Bin16
        | Marker::Array16
        | Marker::Map16 => 2,
        Marker::U32
        | Marker::I32
        | Marker::F32
        | Marker::Str32
        | Marker::Bin32
        | Marker::Array32
        | Marker::Map32 => 4,
        Marker::U64 | Marker::I64 | Marker::F64 => 8,
        Marker::FixExt1
        | Marker::FixExt2
        | Marker::FixExt4
        | Marker::FixExt8
        | Marker::FixExt16 => 1,
        Marker::Ext8 => 2,
        Marker::Ext16 => 3,
        Marker::Ext32 => 5,
        _ => 0,
    }
}
