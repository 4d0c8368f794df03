//! Supported element types and their flattened byte representation.
//!
//! Data entries store arrays of POD elements as consecutive little-endian
//! values. Fixed-size aggregates ([T; N] vectors/matrices) flatten to
//! their base numeric type; the stored array length counts base elements.
//! String and interned-string arrays store string-cache ids rather than
//! inline text.

use half::f16;

use crate::errors::{Error, FormatError};
use crate::string_cache::StringCache;

/// On-disk element type tag of a data entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    I8 = 0,
    U8 = 1,
    I16 = 2,
    U16 = 3,
    I32 = 4,
    U32 = 5,
    I64 = 6,
    U64 = 7,
    F16 = 8,
    F32 = 9,
    F64 = 10,
    String = 11,
    InternedString = 12,
}

impl DataType {
    pub(crate) fn tag(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self, FormatError> {
        Ok(match tag {
            0 => DataType::I8,
            1 => DataType::U8,
            2 => DataType::I16,
            3 => DataType::U16,
            4 => DataType::I32,
            5 => DataType::U32,
            6 => DataType::I64,
            7 => DataType::U64,
            8 => DataType::F16,
            9 => DataType::F32,
            10 => DataType::F64,
            11 => DataType::String,
            12 => DataType::InternedString,
            _ => return Err(FormatError::UnknownDataType(tag)),
        })
    }
}

mod private {
    pub trait SealedScalar {}
    pub trait SealedElement {}
}

/// A fixed-width numeric base type.
pub trait Scalar: private::SealedScalar + Copy {
    #[doc(hidden)]
    const DATA_TYPE: DataType;
    #[doc(hidden)]
    const WIDTH: usize;
    #[doc(hidden)]
    fn put(self, out: &mut Vec<u8>);
    #[doc(hidden)]
    fn take(bytes: &[u8]) -> Self;
}

/// An element type storable in a data entry.
///
/// Implemented for the numeric scalars, fixed-size aggregates of them,
/// [String], and [Interned]. Sealed; the set of supported types is part
/// of the on-disk format.
pub trait Element: private::SealedElement + Sized {
    const DATA_TYPE: DataType;

    /// Base elements per logical item (> 1 for aggregates).
    #[doc(hidden)]
    const FLATTEN: u64;

    #[doc(hidden)]
    fn encode(items: &[Self], cache: &mut StringCache) -> Vec<u8>;

    #[doc(hidden)]
    fn decode(bytes: &[u8], length: u64, cache: &StringCache) -> Result<Vec<Self>, Error>;
}

fn expect_len(bytes: &[u8], length: u64, width: usize) -> Result<(), Error> {
    if length.checked_mul(width as u64) != Some(bytes.len() as u64) {
        return Err(FormatError::Truncated("data").into());
    }
    Ok(())
}

macro_rules! impl_scalar {
    ($t:ty, $dt:ident) => {
        impl private::SealedScalar for $t {}
        impl private::SealedElement for $t {}

        impl Scalar for $t {
            const DATA_TYPE: DataType = DataType::$dt;
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn take(bytes: &[u8]) -> Self {
                <$t>::from_le_bytes(bytes.try_into().unwrap())
            }
        }

        impl Element for $t {
            const DATA_TYPE: DataType = DataType::$dt;
            const FLATTEN: u64 = 1;

            fn encode(items: &[Self], _cache: &mut StringCache) -> Vec<u8> {
                let mut out = Vec::with_capacity(items.len() * Self::WIDTH);
                for item in items {
                    item.put(&mut out);
                }
                out
            }

            fn decode(bytes: &[u8], length: u64, _cache: &StringCache) -> Result<Vec<Self>, Error> {
                expect_len(bytes, length, Self::WIDTH)?;
                Ok(bytes.chunks_exact(Self::WIDTH).map(Self::take).collect())
            }
        }
    };
}

impl_scalar!(i8, I8);
impl_scalar!(u8, U8);
impl_scalar!(i16, I16);
impl_scalar!(u16, U16);
impl_scalar!(i32, I32);
impl_scalar!(u32, U32);
impl_scalar!(i64, I64);
impl_scalar!(u64, U64);
impl_scalar!(f16, F16);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

impl<T: Scalar, const N: usize> private::SealedElement for [T; N] {}

impl<T: Scalar, const N: usize> Element for [T; N] {
    const DATA_TYPE: DataType = T::DATA_TYPE;
    const FLATTEN: u64 = N as u64;

    fn encode(items: &[Self], _cache: &mut StringCache) -> Vec<u8> {
        let mut out = Vec::with_capacity(items.len() * N * T::WIDTH);
        for item in items {
            for component in item {
                component.put(&mut out);
            }
        }
        out
    }

    fn decode(bytes: &[u8], length: u64, _cache: &StringCache) -> Result<Vec<Self>, Error> {
        if N == 0 || length % N as u64 != 0 {
            return Err(FormatError::BadAggregateLength {
                length,
                arity: N as u64,
            }
            .into());
        }
        expect_len(bytes, length, T::WIDTH)?;
        Ok(bytes
            .chunks_exact(N * T::WIDTH)
            .map(|chunk| {
                std::array::from_fn(|i| T::take(&chunk[i * T::WIDTH..(i + 1) * T::WIDTH]))
            })
            .collect())
    }
}

fn encode_names<'a>(names: impl Iterator<Item = &'a str>, cache: &mut StringCache) -> Vec<u8> {
    let mut out = Vec::new();
    for name in names {
        out.extend_from_slice(&cache.intern(name).to_le_bytes());
    }
    out
}

fn decode_names(bytes: &[u8], length: u64, cache: &StringCache) -> Result<Vec<String>, Error> {
    expect_len(bytes, length, 8)?;
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let id = u64::from_le_bytes(chunk.try_into().unwrap());
            cache
                .get(id)
                .map(str::to_owned)
                .ok_or_else(|| FormatError::UnknownStringId(id).into())
        })
        .collect()
}

impl private::SealedElement for String {}

impl Element for String {
    const DATA_TYPE: DataType = DataType::String;
    const FLATTEN: u64 = 1;

    fn encode(items: &[Self], cache: &mut StringCache) -> Vec<u8> {
        encode_names(items.iter().map(String::as_str), cache)
    }

    fn decode(bytes: &[u8], length: u64, cache: &StringCache) -> Result<Vec<Self>, Error> {
        decode_names(bytes, length, cache)
    }
}

/// A string stored through the string cache under the interned-string
/// data type, distinguishing it from plain string entries for consumers
/// that treat interned names specially.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Interned(pub String);

impl From<&str> for Interned {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Display for Interned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl private::SealedElement for Interned {}

impl Element for Interned {
    const DATA_TYPE: DataType = DataType::InternedString;
    const FLATTEN: u64 = 1;

    fn encode(items: &[Self], cache: &mut StringCache) -> Vec<u8> {
        encode_names(items.iter().map(|i| i.0.as_str()), cache)
    }

    fn decode(bytes: &[u8], length: u64, cache: &StringCache) -> Result<Vec<Self>, Error> {
        Ok(decode_names(bytes, length, cache)?
            .into_iter()
            .map(Interned)
            .collect())
    }
}
