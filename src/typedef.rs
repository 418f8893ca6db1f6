//! This module contains the code types shared by the NIfTI-2, CIFTI-2 and
//! GIFTI formats. Primitive integer codes can be converted to these types
//! and vice-versa; GIFTI refers to the same data types by name.

use crate::error::{FormatError, Result};
use byteordered::{ByteOrdered, Endian};
use num_derive::FromPrimitive;
use std::io::Read;

/// Data type for representing a NIFTI value type in a volume or data array.
/// Methods for reading values of that type from a source are also included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NiftiType {
    /// unsigned char.
    // NIFTI_TYPE_UINT8           2
    Uint8 = 2,
    /// signed short.
    // NIFTI_TYPE_INT16           4
    Int16 = 4,
    /// signed int.
    // NIFTI_TYPE_INT32           8
    Int32 = 8,
    /// 32 bit float.
    // NIFTI_TYPE_FLOAT32        16
    Float32 = 16,
    /// 64 bit float = double.
    // NIFTI_TYPE_FLOAT64        64
    Float64 = 64,
    /// signed char.
    // NIFTI_TYPE_INT8          256
    Int8 = 256,
    /// unsigned short.
    // NIFTI_TYPE_UINT16        512
    Uint16 = 512,
    /// unsigned int.
    // NIFTI_TYPE_UINT32        768
    Uint32 = 768,
    /// signed long long.
    // NIFTI_TYPE_INT64        1024
    Int64 = 1024,
    /// unsigned long long.
    // NIFTI_TYPE_UINT64       1280
    Uint64 = 1280,
}

impl NiftiType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use NiftiType::*;
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 => 4,
            Int64 | Uint64 | Float64 => 8,
        }
    }

    /// The name GIFTI uses for this data type (`DataType` attribute).
    pub fn gifti_name(self) -> &'static str {
        use NiftiType::*;
        match self {
            Uint8 => "NIFTI_TYPE_UINT8",
            Int8 => "NIFTI_TYPE_INT8",
            Int16 => "NIFTI_TYPE_INT16",
            Uint16 => "NIFTI_TYPE_UINT16",
            Int32 => "NIFTI_TYPE_INT32",
            Uint32 => "NIFTI_TYPE_UINT32",
            Int64 => "NIFTI_TYPE_INT64",
            Uint64 => "NIFTI_TYPE_UINT64",
            Float32 => "NIFTI_TYPE_FLOAT32",
            Float64 => "NIFTI_TYPE_FLOAT64",
        }
    }

    /// Parse a GIFTI `DataType` attribute value.
    pub fn from_gifti_name(name: &str) -> Result<NiftiType> {
        use NiftiType::*;
        [
            Uint8, Int8, Int16, Uint16, Int32, Uint32, Int64, Uint64, Float32, Float64,
        ]
        .iter()
        .copied()
        .find(|t| t.gifti_name() == name.trim())
        .ok_or_else(|| FormatError::InvalidDataType(name.to_string()))
    }

    /// Read a single primitive value from a source, widened to `f64`.
    pub fn read_primitive_value<S, E>(self, source: &mut ByteOrdered<S, E>) -> Result<f64>
    where
        S: Read,
        E: Endian,
    {
        let value = match self {
            NiftiType::Uint8 => f64::from(source.read_u8()?),
            NiftiType::Int8 => f64::from(source.read_i8()?),
            NiftiType::Int16 => f64::from(source.read_i16()?),
            NiftiType::Uint16 => f64::from(source.read_u16()?),
            NiftiType::Int32 => f64::from(source.read_i32()?),
            NiftiType::Uint32 => f64::from(source.read_u32()?),
            // 64-bit integers beyond 2^53 lose precision; mask and label
            // values never get there
            NiftiType::Int64 => source.read_i64()? as f64,
            NiftiType::Uint64 => source.read_u64()? as f64,
            NiftiType::Float32 => f64::from(source.read_f32()?),
            NiftiType::Float64 => source.read_f64()?,
        };
        Ok(value)
    }
}

/// An enum type for representing a NIFTI intent code.
/// Only the CIFTI-2 codes are listed.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Intent {
    /// default: no intention is indicated in the header.
    None = 0,
    /// CIFTI-2 dense connectivity (`.dconn.nii`).
    ConnDense = 3001,
    /// CIFTI-2 dense data series (`.dtseries.nii`).
    ConnDenseSeries = 3002,
    /// CIFTI-2 dense scalars (`.dscalar.nii`).
    ConnDenseScalar = 3006,
    /// CIFTI-2 dense labels (`.dlabel.nii`).
    ConnDenseLabel = 3007,
}

impl Intent {
    /// The `intent_name` string stored alongside CIFTI-2 intent codes.
    pub fn cifti_intent_name(self) -> Option<&'static str> {
        match self {
            Intent::ConnDense => Some("ConnDense"),
            Intent::ConnDenseSeries => Some("ConnDenseSeries"),
            Intent::ConnDenseScalar => Some("ConnDenseScalar"),
            Intent::ConnDenseLabel => Some("ConnDenseLabel"),
            _ => None,
        }
    }
}
