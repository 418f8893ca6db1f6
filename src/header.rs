//! This module defines the `Nifti2Header` struct, the 540-byte header
//! which every CIFTI-2 file starts with.

use crate::error::{FormatError, Result};
use crate::typedef::{Intent, NiftiType};
use crate::util::{from_fixed_bytes, to_fixed_bytes};
use byteordered::{ByteOrdered, Endian, Endianness};
use num_traits::FromPrimitive;
use std::io::{Read, Write};

/// Size of a NIfTI-2 header in bytes, which is also the first field.
pub const NIFTI2_HEADER_SIZE: i32 = 540;
/// Magic code for single-file NIfTI-2 (".nii").
pub const MAGIC_CODE_NIP2: &[u8; 8] = b"n+2\0\r\n\x1a\n";
/// Magic code for NIfTI-2 header files (".hdr").
pub const MAGIC_CODE_NI2: &[u8; 8] = b"ni2\0\r\n\x1a\n";

/// The NIfTI-2 header data type.
/// All fields are public and named after the fields of `nifti2.h`.
#[derive(Debug, Clone, PartialEq)]
pub struct Nifti2Header {
    /// Header size, must be 540
    pub sizeof_hdr: i32,
    /// Magic code
    pub magic: [u8; 8],
    /// Defines the data type!
    pub datatype: i16,
    /// Number of bits per voxel
    pub bitpix: i16,
    /// Data array dimensions
    pub dim: [i64; 8],
    /// 1st intent parameter
    pub intent_p1: f64,
    /// 2nd intent parameter
    pub intent_p2: f64,
    /// 3rd intent parameter
    pub intent_p3: f64,
    /// Grid spacings
    pub pixdim: [f64; 8],
    /// Offset into .nii file to reach the data
    pub vox_offset: i64,
    /// Data scaling: slope
    pub scl_slope: f64,
    /// Data scaling: offset
    pub scl_inter: f64,
    /// Max display intensity
    pub cal_max: f64,
    /// Min display intensity
    pub cal_min: f64,
    /// Time for 1 slice
    pub slice_duration: f64,
    /// Time axis shift
    pub toffset: f64,
    /// First slice index
    pub slice_start: i64,
    /// Last slice index
    pub slice_end: i64,
    /// Any text you like
    pub descrip: [u8; 80],
    /// Auxiliary filename
    pub aux_file: [u8; 24],
    /// NIFTI_XFORM_* code
    pub qform_code: i32,
    /// NIFTI_XFORM_* code
    pub sform_code: i32,
    /// Quaternion b, c, d params and x, y, z shifts
    pub quatern: [f64; 6],
    /// 1st row affine transform
    pub srow_x: [f64; 4],
    /// 2nd row affine transform
    pub srow_y: [f64; 4],
    /// 3rd row affine transform
    pub srow_z: [f64; 4],
    /// Slice timing order
    pub slice_code: i32,
    /// Units of pixdim[1..4]
    pub xyzt_units: i32,
    /// NIFTI_INTENT_* code
    pub intent_code: i32,
    /// 'name' or meaning of data
    pub intent_name: [u8; 16],
    /// MRI slice ordering
    pub dim_info: u8,
    /// Unused, zero filled
    pub unused_str: [u8; 15],

    /// Original data Endianness
    pub endianness: Endianness,
}

impl Default for Nifti2Header {
    fn default() -> Nifti2Header {
        Nifti2Header {
            sizeof_hdr: NIFTI2_HEADER_SIZE,
            magic: *MAGIC_CODE_NIP2,
            datatype: 0,
            bitpix: 0,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            pixdim: [1.; 8],
            vox_offset: 544,
            scl_slope: 1.,
            scl_inter: 0.,
            cal_max: 0.,
            cal_min: 0.,
            slice_duration: 0.,
            toffset: 0.,
            slice_start: 0,
            slice_end: 0,
            descrip: [0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern: [0.; 6],
            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],
            slice_code: 0,
            xyzt_units: 0,
            intent_code: 0,
            intent_name: [0; 16],
            dim_info: 0,
            unused_str: [0; 15],
            endianness: Endianness::Little,
        }
    }
}

impl Nifti2Header {
    /// Read a NIfTI-2 header from the given byte stream. The byte order is
    /// detected from the `sizeof_hdr` field and kept in `endianness`.
    /// It is assumed that the input is currently at the start of the header.
    pub fn from_reader<S: Read>(mut input: S) -> Result<Nifti2Header> {
        let mut sizeof_hdr = [0u8; 4];
        input.read_exact(&mut sizeof_hdr)?;

        let endianness = if i32::from_le_bytes(sizeof_hdr) == NIFTI2_HEADER_SIZE {
            Endianness::Little
        } else if i32::from_be_bytes(sizeof_hdr) == NIFTI2_HEADER_SIZE {
            Endianness::Big
        } else {
            return Err(FormatError::InvalidNifti2);
        };

        let mut h = Nifti2Header {
            endianness,
            ..Nifti2Header::default()
        };
        parse_header_2(&mut h, ByteOrdered::runtime(input, endianness))?;

        if &h.magic != MAGIC_CODE_NIP2 && &h.magic != MAGIC_CODE_NI2 {
            Err(FormatError::InvalidNifti2)
        } else {
            Ok(h)
        }
    }

    /// Write this header to the given sink, always in little endian.
    /// The sink receives exactly 540 bytes.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = ByteOrdered::le(writer);
        w.write_i32(NIFTI2_HEADER_SIZE)?;
        w.write_all(&self.magic)?;
        w.write_i16(self.datatype)?;
        w.write_i16(self.bitpix)?;
        for d in &self.dim {
            w.write_i64(*d)?;
        }
        w.write_f64(self.intent_p1)?;
        w.write_f64(self.intent_p2)?;
        w.write_f64(self.intent_p3)?;
        for p in &self.pixdim {
            w.write_f64(*p)?;
        }
        w.write_i64(self.vox_offset)?;
        w.write_f64(self.scl_slope)?;
        w.write_f64(self.scl_inter)?;
        w.write_f64(self.cal_max)?;
        w.write_f64(self.cal_min)?;
        w.write_f64(self.slice_duration)?;
        w.write_f64(self.toffset)?;
        w.write_i64(self.slice_start)?;
        w.write_i64(self.slice_end)?;
        w.write_all(&self.descrip)?;
        w.write_all(&self.aux_file)?;
        w.write_i32(self.qform_code)?;
        w.write_i32(self.sform_code)?;
        for f in self
            .quatern
            .iter()
            .chain(&self.srow_x)
            .chain(&self.srow_y)
            .chain(&self.srow_z)
        {
            w.write_f64(*f)?;
        }
        w.write_i32(self.slice_code)?;
        w.write_i32(self.xyzt_units)?;
        w.write_i32(self.intent_code)?;
        w.write_all(&self.intent_name)?;
        w.write_u8(self.dim_info)?;
        w.write_all(&self.unused_str)?;
        Ok(())
    }

    /// Get the data type as a validated enum.
    pub fn data_type(&self) -> Result<NiftiType> {
        NiftiType::from_i16(self.datatype)
            .ok_or_else(|| FormatError::InvalidDataType(self.datatype.to_string()))
    }

    /// Get the intent as a validated enum, if the code is known.
    pub fn intent(&self) -> Option<Intent> {
        Intent::from_i32(self.intent_code)
    }

    /// Set the intent code and, for CIFTI-2 intents, the intent name.
    pub fn set_intent(&mut self, intent: Intent) {
        self.intent_code = intent as i32;
        self.intent_name = to_fixed_bytes(intent.cifti_intent_name().unwrap_or(""));
    }

    /// The intent name as a string.
    pub fn intent_name_str(&self) -> String {
        from_fixed_bytes(&self.intent_name)
    }

    /// The used dimensions (`dim[1..=dim[0]]`).
    pub fn dim(&self) -> Result<&[i64]> {
        let ndim = self.dim[0];
        if ndim < 1 || ndim > 7 || self.dim[1..=ndim as usize].iter().any(|d| *d < 0) {
            return Err(FormatError::InvalidNifti2);
        }
        Ok(&self.dim[1..=ndim as usize])
    }
}

/// remainder of header parsing, after `sizeof_hdr`
fn parse_header_2<S, E>(h: &mut Nifti2Header, mut input: ByteOrdered<S, E>) -> Result<()>
where
    S: Read,
    E: Endian,
{
    h.sizeof_hdr = NIFTI2_HEADER_SIZE;
    input.read_exact(&mut h.magic)?;
    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    for v in &mut h.dim {
        *v = input.read_i64()?;
    }
    h.intent_p1 = input.read_f64()?;
    h.intent_p2 = input.read_f64()?;
    h.intent_p3 = input.read_f64()?;
    for v in &mut h.pixdim {
        *v = input.read_f64()?;
    }
    h.vox_offset = input.read_i64()?;
    h.scl_slope = input.read_f64()?;
    h.scl_inter = input.read_f64()?;
    h.cal_max = input.read_f64()?;
    h.cal_min = input.read_f64()?;
    h.slice_duration = input.read_f64()?;
    h.toffset = input.read_f64()?;
    h.slice_start = input.read_i64()?;
    h.slice_end = input.read_i64()?;
    input.read_exact(&mut h.descrip)?;
    input.read_exact(&mut h.aux_file)?;
    h.qform_code = input.read_i32()?;
    h.sform_code = input.read_i32()?;
    for v in &mut h.quatern {
        *v = input.read_f64()?;
    }
    for v in &mut h.srow_x {
        *v = input.read_f64()?;
    }
    for v in &mut h.srow_y {
        *v = input.read_f64()?;
    }
    for v in &mut h.srow_z {
        *v = input.read_f64()?;
    }
    h.slice_code = input.read_i32()?;
    h.xyzt_units = input.read_i32()?;
    h.intent_code = input.read_i32()?;
    input.read_exact(&mut h.intent_name)?;
    h.dim_info = input.read_u8()?;
    input.read_exact(&mut h.unused_str)?;
    Ok(())
}
