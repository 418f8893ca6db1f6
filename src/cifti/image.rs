//! Reading and writing whole CIFTI-2 files: a NIfTI-2 header, one CIFTI-2
//! XML extension, then the matrix.

use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::document::CiftiHeader;
use crate::error::{FormatError, Result};
use crate::extension::{Extender, Extension, ExtensionSequence, ECODE_CIFTI};
use crate::header::{Nifti2Header, NIFTI2_HEADER_SIZE};
use crate::typedef::{Intent, NiftiType};
use crate::util::is_gz_file;

/// A CIFTI-2 matrix together with its axes. Rows follow the axis of
/// dimension 0, columns the axis of dimension 1.
#[derive(Debug, PartialEq, Clone)]
pub struct CiftiImage {
    header: CiftiHeader,
    data: Array2<f32>,
}

impl CiftiImage {
    /// Pair a matrix with its axes.
    ///
    /// # Errors
    ///
    /// `FormatError::ShapeMismatch` if the matrix shape disagrees with the
    /// axis lengths, `FormatError::InvalidCifti` if the header does not
    /// describe exactly two dimensions.
    pub fn new(header: CiftiHeader, data: Array2<f32>) -> Result<CiftiImage> {
        let (rows, cols) = data.dim();
        let (expected_rows, expected_cols) = matrix_shape(&header)?;
        let rows_ok = expected_rows.map_or(true, |n| n == rows);
        let cols_ok = expected_cols.map_or(true, |n| n == cols);
        if !rows_ok || !cols_ok {
            return Err(FormatError::ShapeMismatch(
                rows,
                cols,
                expected_rows.unwrap_or(rows),
                expected_cols.unwrap_or(cols),
            ));
        }
        Ok(CiftiImage { header, data })
    }

    /// The axes of this image.
    pub fn header(&self) -> &CiftiHeader {
        &self.header
    }

    /// The matrix, rows by columns.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Read only the CIFTI-2 header of a file, skipping the matrix.
    /// Gzip compressed files are recognized by their `.gz` extension.
    pub fn read_header<P: AsRef<Path>>(path: P) -> Result<CiftiHeader> {
        let (_, header) = Self::open_with(path, |source| {
            let (nifti, header) = read_prelude(source)?;
            Ok((nifti, header))
        })?;
        Ok(header)
    }

    /// Read a whole CIFTI-2 file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CiftiImage> {
        let (data, header) = Self::open_with(path, |source| {
            let (nifti, header) = read_prelude(&mut *source)?;
            let data = read_matrix(&nifti, source)?;
            Ok((data, header))
        })?;
        CiftiImage::new(header, data)
    }

    /// Read a whole CIFTI-2 file from a stream positioned at the header.
    pub fn from_reader<S: Read>(mut source: S) -> Result<CiftiImage> {
        let (nifti, header) = read_prelude(&mut source)?;
        let data = read_matrix(&nifti, &mut source)?;
        CiftiImage::new(header, data)
    }

    fn open_with<P, T, F>(path: P, f: F) -> Result<(T, CiftiHeader)>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut dyn Read) -> Result<(T, CiftiHeader)>,
    {
        let file = BufReader::new(File::open(&path)?);
        if is_gz_file(&path) {
            f(&mut GzDecoder::new(file))
        } else {
            let mut file = file;
            f(&mut file)
        }
    }

    /// Write this image as a dense scalar file (`.dscalar.nii`).
    /// Gzip compression is used if the path ends in `.gz`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(&path)?);
        if is_gz_file(&path) {
            let mut e = GzEncoder::new(writer, Compression::default());
            self.write_to(&mut e)?;
            let _ = e.finish()?;
        } else {
            let mut writer = writer;
            self.write_to(&mut writer)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Write the header, extension and matrix to a byte sink.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let xml = self.header.to_xml()?;
        let extensions =
            ExtensionSequence::new(vec![Extension::padded(ECODE_CIFTI, xml.into_bytes())]);

        let (rows, cols) = self.data.dim();
        let mut nifti = Nifti2Header {
            dim: [6, 1, 1, 1, 1, rows as i64, cols as i64, 1],
            datatype: NiftiType::Float32 as i16,
            bitpix: 32,
            vox_offset: NIFTI2_HEADER_SIZE as i64 + extensions.byte_len() as i64,
            ..Nifti2Header::default()
        };
        nifti.set_intent(Intent::ConnDenseScalar);

        nifti.write_to(&mut writer)?;
        extensions.write_to(&mut writer)?;

        // column major: the row index varies fastest
        let mut w = ByteOrdered::le(writer);
        for v in self.data.t().iter() {
            w.write_f32(*v)?;
        }
        Ok(())
    }
}

/// Expected (rows, cols) from the axes, where the axis lengths are known.
fn matrix_shape(header: &CiftiHeader) -> Result<(Option<usize>, Option<usize>)> {
    match header.axes() {
        [rows, cols] => Ok((rows.len(), cols.len())),
        axes => Err(FormatError::InvalidCifti(format!(
            "expected 2 matrix dimensions, found {}",
            axes.len()
        ))),
    }
}

/// Read the NIfTI-2 header and the CIFTI-2 XML, leaving the source at the
/// start of the matrix. The extensions are expected to fill the space up
/// to `vox_offset`.
fn read_prelude<S: Read>(mut source: S) -> Result<(Nifti2Header, CiftiHeader)> {
    let nifti = Nifti2Header::from_reader(&mut source)?;
    let ext_len = nifti.vox_offset - NIFTI2_HEADER_SIZE as i64;
    if ext_len < 4 {
        return Err(FormatError::MissingCiftiExtension);
    }
    let extender = match Extender::from_reader_optional(&mut source)? {
        Some(e) if e.has_extensions() => e,
        _ => return Err(FormatError::MissingCiftiExtension),
    };

    let mut source = ByteOrdered::runtime(source, nifti.endianness);
    let extensions = ExtensionSequence::from_reader(extender, &mut source, ext_len as usize - 4)?;
    let xml = extensions
        .find(ECODE_CIFTI)
        .ok_or(FormatError::MissingCiftiExtension)?;
    let text = std::str::from_utf8(xml.data_trimmed())
        .map_err(|_| FormatError::InvalidCifti("extension is not UTF-8".to_string()))?;
    let header = CiftiHeader::from_xml(text)?;

    Ok((nifti, header))
}

fn read_matrix<S: Read>(nifti: &Nifti2Header, source: S) -> Result<Array2<f32>> {
    let dim = nifti.dim()?;
    if dim.len() < 6 || dim[..4].iter().any(|d| *d != 1) {
        return Err(FormatError::InvalidCifti(format!(
            "unexpected matrix dimensions {:?}",
            dim
        )));
    }
    let rows = dim[4] as usize;
    let cols = dim[5] as usize;
    let data_type = nifti.data_type()?;
    let (slope, inter) = if nifti.scl_slope == 0. {
        (1., 0.)
    } else {
        (nifti.scl_slope, nifti.scl_inter)
    };

    let mut source = ByteOrdered::runtime(source, nifti.endianness);
    let count = rows.checked_mul(cols).ok_or(FormatError::InvalidNifti2)?;
    let mut values = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let v = data_type.read_primitive_value(&mut source)?;
        values.push((v * slope + inter) as f32);
    }
    Array2::from_shape_vec((cols, rows), values)
        .map(|m| m.reversed_axes())
        .map_err(|_| FormatError::IncompatibleLength(count, rows * cols))
}
