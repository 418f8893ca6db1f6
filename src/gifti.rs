//! Reading of GIFTI surface data files (`.func.gii`, `.shape.gii`, ...).
//!
//! A GIFTI file is an XML document holding a sequence of data arrays. For
//! functional files each array stores one value per vertex of a single
//! hemisphere's surface mesh. Array payloads are either plain ASCII or
//! base64 encoded binary, optionally zlib compressed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteordered::{ByteOrdered, Endianness};
use flate2::bufread::GzDecoder;
use flate2::read::{GzDecoder as GzStreamDecoder, ZlibDecoder};
use ndarray::{concatenate, Array2, ArrayView2, Axis, ShapeBuilder};
use quick_xml::events::Event;
use quick_xml::Reader;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{FormatError, Result};
use crate::typedef::NiftiType;
use crate::util::is_gz_file;
use crate::xml;

/// How the payload of a data array is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Whitespace separated numbers.
    Ascii,
    /// Base64 encoded binary.
    Base64Binary,
    /// Base64 encoded, zlib compressed binary.
    GZipBase64Binary,
    /// Binary data kept in a separate file. Not supported for reading.
    ExternalFileBinary,
}

impl Encoding {
    /// Parse an `Encoding` attribute value.
    pub fn from_name(name: &str) -> Result<Encoding> {
        match name.trim() {
            "ASCII" => Ok(Encoding::Ascii),
            "Base64Binary" => Ok(Encoding::Base64Binary),
            "GZipBase64Binary" => Ok(Encoding::GZipBase64Binary),
            "ExternalFileBinary" => Ok(Encoding::ExternalFileBinary),
            other => Err(FormatError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// Memory layout of a multi-dimensional data array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingOrder {
    /// Last index varies fastest.
    RowMajor,
    /// First index varies fastest.
    ColumnMajor,
}

/// One `DataArray` element of a GIFTI file, with its payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftiDataArray {
    /// The `Intent` attribute, e.g. `NIFTI_INTENT_NONE`.
    pub intent: String,
    /// Declared element type of the payload.
    pub data_type: NiftiType,
    /// Dimensions; the first one is the vertex count.
    pub dims: Vec<usize>,
    /// Layout of the payload for arrays with more than one dimension.
    pub indexing_order: IndexingOrder,
    /// How the payload was encoded on disk.
    pub encoding: Encoding,
    /// Byte order of binary payloads.
    pub endian: Endianness,
    /// Array level `MetaData` name/value pairs.
    pub metadata: Vec<(String, String)>,
    /// Decoded values in storage order.
    pub data: Vec<f64>,
}

impl GiftiDataArray {
    /// Number of rows (vertices) of this array.
    pub fn vertex_count(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// View the array as a vertices-by-columns matrix. One-dimensional arrays
    /// have a single column; trailing dimensions are flattened into columns.
    pub fn as_matrix(&self) -> Result<Array2<f64>> {
        let rows = self.vertex_count();
        let cols = element_count(self.dims.get(1..).unwrap_or(&[]))?;
        let shape = match self.indexing_order {
            IndexingOrder::RowMajor => (rows, cols).into_shape(),
            IndexingOrder::ColumnMajor => (rows, cols).f(),
        };
        Array2::from_shape_vec(shape, self.data.clone()).map_err(|_| {
            FormatError::IncompatibleLength(self.data.len(), rows.saturating_mul(cols))
        })
    }
}

/// A GIFTI file: file level metadata and its data arrays, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GiftiImage {
    /// The `Version` attribute of the root element.
    pub version: String,
    /// File level `MetaData` name/value pairs.
    pub metadata: Vec<(String, String)>,
    /// Data arrays in document order.
    pub data_arrays: Vec<GiftiDataArray>,
}

/// Per-vertex values of a surface file: all data arrays of a GIFTI file
/// side by side, one row per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    matrix: Array2<f64>,
}

impl VertexData {
    /// Wrap a vertices-by-columns matrix.
    pub fn new(matrix: Array2<f64>) -> Self {
        VertexData { matrix }
    }

    /// Build from one column of values per data array. All columns must
    /// have the same length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut matrix = Array2::zeros((rows, columns.len()));
        for (j, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(FormatError::InconsistentVertexCount(rows, column.len()));
            }
            for (i, v) in column.iter().enumerate() {
                matrix[[i, j]] = *v;
            }
        }
        Ok(VertexData { matrix })
    }

    /// Number of vertices (rows).
    pub fn vertex_count(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of value columns across all arrays.
    pub fn column_count(&self) -> usize {
        self.matrix.ncols()
    }

    /// The underlying vertices-by-columns matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

impl GiftiImage {
    /// Read a GIFTI file. If the file's name ends with ".gz", the file is
    /// assumed to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<GiftiImage> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            GiftiImage::from_reader(GzDecoder::new(file))
        } else {
            GiftiImage::from_reader(file)
        }
    }

    /// Read a GIFTI document from the given byte stream.
    pub fn from_reader<S: Read>(mut input: S) -> Result<GiftiImage> {
        let mut text = String::new();
        let _ = input.read_to_string(&mut text)?;
        GiftiImage::from_xml(&text)
    }

    /// Parse a GIFTI document.
    pub fn from_xml(text: &str) -> Result<GiftiImage> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut parser = Parser::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = xml::tag_name(&e);
                    let attrs = xml::attributes(&e)?;
                    parser.start(name, attrs)?;
                }
                Event::Empty(e) => {
                    let name = xml::tag_name(&e);
                    let attrs = xml::attributes(&e)?;
                    parser.start(name, attrs)?;
                    parser.end()?;
                }
                Event::End(_) => parser.end()?,
                Event::Text(t) => parser.text.push_str(&xml::text(&t)?),
                Event::CData(c) => parser.text.push_str(&xml::cdata(c)),
                Event::Eof => break,
                _ => {}
            }
        }
        parser.finish()
    }

    /// Stack all data arrays into a single vertices-by-columns matrix.
    ///
    /// # Errors
    ///
    /// - `FormatError::InvalidGifti` if the file has no data arrays.
    /// - `FormatError::InconsistentVertexCount` if the arrays disagree on
    ///   the number of vertices.
    pub fn vertex_data(&self) -> Result<VertexData> {
        let first = self
            .data_arrays
            .first()
            .ok_or_else(|| FormatError::InvalidGifti("no data arrays".to_string()))?;
        let expected = first.vertex_count();
        let matrices = self
            .data_arrays
            .iter()
            .map(|a| {
                if a.vertex_count() != expected {
                    Err(FormatError::InconsistentVertexCount(expected, a.vertex_count()))
                } else {
                    a.as_matrix()
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<ArrayView2<f64>> = matrices.iter().map(|m| m.view()).collect();
        let matrix = concatenate(Axis(1), &views)
            .map_err(|_| FormatError::InvalidGifti("cannot stack data arrays".to_string()))?;
        Ok(VertexData::new(matrix))
    }
}

/// Read a GIFTI file (`.gii` or `.gii.gz`).
pub fn read_gifti<P: AsRef<Path>>(path: P) -> Result<GiftiImage> {
    GiftiImage::from_file(path)
}

/// Event driven state of the document parser.
#[derive(Debug, Default)]
struct Parser {
    stack: Vec<String>,
    text: String,
    seen_root: bool,
    declared_arrays: Option<usize>,
    image: GiftiImage,
    pending: Option<PendingArray>,
    md_name: String,
    md_value: String,
}

/// Attributes of a `DataArray` whose payload has not been seen yet.
#[derive(Debug)]
struct PendingArray {
    attrs: HashMap<String, String>,
    metadata: Vec<(String, String)>,
    payload: Option<String>,
}

impl Parser {
    fn start(&mut self, name: String, attrs: HashMap<String, String>) -> Result<()> {
        if !self.seen_root {
            if name != "GIFTI" {
                return Err(FormatError::InvalidGifti(format!(
                    "root element is `{}`",
                    name
                )));
            }
            self.seen_root = true;
            self.image.version = attrs.get("Version").cloned().unwrap_or_default();
            self.declared_arrays = match attrs.get("NumberOfDataArrays") {
                Some(n) => Some(parse_count("NumberOfDataArrays", n)?),
                None => None,
            };
        } else if name == "DataArray" {
            self.pending = Some(PendingArray {
                attrs,
                metadata: Vec::new(),
                payload: None,
            });
        } else if name == "MD" {
            self.md_name.clear();
            self.md_value.clear();
        }
        self.stack.push(name);
        self.text.clear();
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let name = match self.stack.pop() {
            Some(name) => name,
            None => return Err(FormatError::InvalidGifti("unbalanced elements".to_string())),
        };
        let text = std::mem::take(&mut self.text);
        match name.as_str() {
            "Name" => self.md_name = text.trim().to_string(),
            "Value" => self.md_value = text.trim().to_string(),
            "MD" => {
                let entry = (
                    std::mem::take(&mut self.md_name),
                    std::mem::take(&mut self.md_value),
                );
                match self.pending.as_mut() {
                    Some(array) => array.metadata.push(entry),
                    None => self.image.metadata.push(entry),
                }
            }
            "Data" => {
                if let Some(array) = self.pending.as_mut() {
                    array.payload = Some(text);
                }
            }
            "DataArray" => {
                if let Some(array) = self.pending.take() {
                    self.image.data_arrays.push(array.decode()?);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<GiftiImage> {
        if !self.seen_root {
            return Err(FormatError::InvalidGifti("empty document".to_string()));
        }
        if !self.stack.is_empty() {
            return Err(FormatError::InvalidGifti("unbalanced elements".to_string()));
        }
        if let Some(n) = self.declared_arrays {
            if n != self.image.data_arrays.len() {
                return Err(FormatError::InvalidGifti(format!(
                    "NumberOfDataArrays is {}, found {}",
                    n,
                    self.image.data_arrays.len()
                )));
            }
        }
        Ok(self.image)
    }
}

impl PendingArray {
    fn attr(&self, key: &str) -> Result<&str> {
        self.attrs
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| FormatError::InvalidGifti(format!("DataArray lacks `{}`", key)))
    }

    fn decode(self) -> Result<GiftiDataArray> {
        let data_type = NiftiType::from_gifti_name(self.attr("DataType")?)?;
        let encoding = Encoding::from_name(self.attr("Encoding")?)?;
        let ndim = parse_count("Dimensionality", self.attr("Dimensionality")?)?;
        let dims = (0..ndim)
            .map(|i| {
                let key = format!("Dim{}", i);
                parse_count(&key, self.attr(&key)?)
            })
            .collect::<Result<Vec<_>>>()?;
        let indexing_order = match self.attrs.get("ArrayIndexingOrder").map(|s| s.trim()) {
            Some("ColumnMajorOrder") => IndexingOrder::ColumnMajor,
            _ => IndexingOrder::RowMajor,
        };
        let endian = match self.attrs.get("Endian").map(|s| s.trim()) {
            Some("BigEndian") => Endianness::Big,
            _ => Endianness::Little,
        };
        let intent = self.attrs.get("Intent").cloned().unwrap_or_default();

        let expected = element_count(&dims)?;
        let payload = self.payload.unwrap_or_default();
        let data = match encoding {
            Encoding::Ascii => decode_ascii(&payload)?,
            Encoding::Base64Binary => {
                let bytes = decode_base64(&payload)?;
                decode_binary(&bytes, data_type, endian)?
            }
            Encoding::GZipBase64Binary => {
                let bytes = inflate(&decode_base64(&payload)?)?;
                decode_binary(&bytes, data_type, endian)?
            }
            Encoding::ExternalFileBinary => {
                return Err(FormatError::UnsupportedEncoding(
                    "ExternalFileBinary".to_string(),
                ))
            }
        };
        if data.len() != expected {
            return Err(FormatError::IncompatibleLength(data.len(), expected));
        }

        Ok(GiftiDataArray {
            intent,
            data_type,
            dims,
            indexing_order,
            encoding,
            endian,
            metadata: self.metadata,
            data,
        })
    }
}

/// Number of values a `DataArray` holds. A zero trailing dimension is only
/// accepted together with zero vertices.
fn element_count(dims: &[usize]) -> Result<usize> {
    let rows = dims.first().copied().unwrap_or(0);
    if rows > 0 && dims.iter().skip(1).any(|d| *d == 0) {
        return Err(FormatError::InvalidGifti(format!(
            "zero sized dimension in {:?}",
            dims
        )));
    }
    dims.iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| FormatError::InvalidGifti(format!("dimensions {:?} overflow", dims)))
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| FormatError::InvalidGifti(format!("bad `{}` value `{}`", key, value)))
}

fn decode_ascii(payload: &str) -> Result<Vec<f64>> {
    payload
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| FormatError::InvalidGifti(format!("bad ASCII value `{}`", tok)))
        })
        .collect()
}

fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64.decode(compact.as_bytes())?)
}

/// Inflate a compressed payload. The format mandates zlib, but gzip
/// streams are accepted as well.
fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let _ = GzStreamDecoder::new(bytes).read_to_end(&mut out)?;
    } else {
        let _ = ZlibDecoder::new(bytes).read_to_end(&mut out)?;
    }
    Ok(out)
}

fn decode_binary(bytes: &[u8], data_type: NiftiType, endian: Endianness) -> Result<Vec<f64>> {
    let size = data_type.size_of();
    if bytes.len() % size != 0 {
        return Err(FormatError::InvalidGifti(format!(
            "{} payload bytes is not a multiple of {}",
            bytes.len(),
            size
        )));
    }
    let count = bytes.len() / size;
    let mut source = ByteOrdered::runtime(bytes, endian);
    (0..count)
        .map(|_| data_type.read_primitive_value(&mut source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn document(arrays: &str, n: usize) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE GIFTI SYSTEM "http://www.nitrc.org/frs/download.php/115/gifti.dtd">
<GIFTI Version="1.0" NumberOfDataArrays="{}">
  <MetaData>
    <MD>
      <Name><![CDATA[AnatomicalStructurePrimary]]></Name>
      <Value><![CDATA[CortexLeft]]></Value>
    </MD>
  </MetaData>
  <LabelTable/>
{}
</GIFTI>"#,
            n, arrays
        )
    }

    fn ascii_array(values: &str, n: usize) -> String {
        format!(
            r#"<DataArray Intent="NIFTI_INTENT_NONE" DataType="NIFTI_TYPE_FLOAT32"
  ArrayIndexingOrder="RowMajorOrder" Dimensionality="1" Dim0="{}" Encoding="ASCII"
  Endian="LittleEndian" ExternalFileName="" ExternalFileOffset="">
  <MetaData><MD><Name>Name</Name><Value>roi</Value></MD></MetaData>
  <Data>{}</Data>
</DataArray>"#,
            n, values
        )
    }

    fn data_array(attrs: &str, data: &str) -> String {
        format!("<DataArray {}><Data>{}</Data></DataArray>", attrs, data)
    }

    #[test]
    fn reads_ascii_array_and_metadata() {
        let doc = document(&ascii_array("0 1 0\n0 1", 5), 1);
        let img = GiftiImage::from_xml(&doc).unwrap();
        assert_eq!(img.version, "1.0");
        assert_eq!(
            img.metadata,
            vec![("AnatomicalStructurePrimary".to_string(), "CortexLeft".to_string())]
        );
        assert_eq!(img.data_arrays.len(), 1);
        let a = &img.data_arrays[0];
        assert_eq!(a.data, vec![0., 1., 0., 0., 1.]);
        assert_eq!(a.dims, vec![5]);
        assert_eq!(a.metadata, vec![("Name".to_string(), "roi".to_string())]);
        assert_eq!(a.encoding, Encoding::Ascii);
    }

    #[test]
    fn reads_base64_and_compressed_arrays() {
        let values: Vec<i32> = vec![1, 0, 0, 1];
        let mut raw = Vec::new();
        for v in &values {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let plain = BASE64.encode(&raw);
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw).unwrap();
        let packed = BASE64.encode(enc.finish().unwrap());

        let common = r#"DataType="NIFTI_TYPE_INT32" Dimensionality="1" Dim0="4"
            Endian="LittleEndian""#;
        let arrays = format!(
            "{}\n{}",
            data_array(&format!(r#"{} Encoding="Base64Binary""#, common), &plain),
            data_array(&format!(r#"{} Encoding="GZipBase64Binary""#, common), &packed),
        );
        let img = GiftiImage::from_xml(&document(&arrays, 2)).unwrap();
        assert_eq!(img.data_arrays[0].data, vec![1., 0., 0., 1.]);
        assert_eq!(img.data_arrays[1].data, vec![1., 0., 0., 1.]);
    }

    #[test]
    fn big_endian_binary() {
        let raw: Vec<u8> = [2.0f32, -1.0]
            .iter()
            .flat_map(|v| v.to_be_bytes().to_vec())
            .collect();
        let arrays = data_array(
            r#"DataType="NIFTI_TYPE_FLOAT32" Dimensionality="1" Dim0="2"
            Encoding="Base64Binary" Endian="BigEndian""#,
            &BASE64.encode(&raw),
        );
        let img = GiftiImage::from_xml(&document(&arrays, 1)).unwrap();
        assert_eq!(img.data_arrays[0].data, vec![2.0, -1.0]);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let doc = document(&ascii_array("0 1 0", 5), 1);
        assert!(matches!(
            GiftiImage::from_xml(&doc),
            Err(FormatError::IncompatibleLength(3, 5))
        ));
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let arrays = data_array(
            r#"DataType="NIFTI_TYPE_FLOAT32" Dimensionality="2"
            Dim0="18446744073709551615" Dim1="2" Encoding="ASCII""#,
            "1 0",
        );
        assert!(matches!(
            GiftiImage::from_xml(&document(&arrays, 1)),
            Err(FormatError::InvalidGifti(_))
        ));
    }

    #[test]
    fn zero_columns_need_zero_vertices() {
        let arrays = data_array(
            r#"DataType="NIFTI_TYPE_FLOAT32" Dimensionality="2"
            Dim0="4611686018427387904" Dim1="0" Encoding="ASCII""#,
            "",
        );
        assert!(matches!(
            GiftiImage::from_xml(&document(&arrays, 1)),
            Err(FormatError::InvalidGifti(_))
        ));

        let arrays = data_array(
            r#"DataType="NIFTI_TYPE_FLOAT32" Dimensionality="2" Dim0="0" Dim1="0"
            Encoding="ASCII""#,
            "",
        );
        let img = GiftiImage::from_xml(&document(&arrays, 1)).unwrap();
        assert_eq!(img.data_arrays[0].vertex_count(), 0);
    }

    #[test]
    fn declared_array_count_is_checked() {
        let doc = document(&ascii_array("0 1", 2), 2);
        assert!(GiftiImage::from_xml(&doc).is_err());
    }

    #[test]
    fn external_files_are_rejected() {
        let arrays = data_array(
            r#"DataType="NIFTI_TYPE_FLOAT32" Dimensionality="1" Dim0="2"
            Encoding="ExternalFileBinary" ExternalFileName="x.bin""#,
            "",
        );
        assert!(matches!(
            GiftiImage::from_xml(&document(&arrays, 1)),
            Err(FormatError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn wrong_root_is_rejected() {
        assert!(GiftiImage::from_xml("<CIFTI Version=\"2\"/>").is_err());
    }

    #[test]
    fn two_dimensional_arrays_become_columns() {
        let matrix = |order: &str| {
            let attrs = format!(
                r#"DataType="NIFTI_TYPE_FLOAT32" ArrayIndexingOrder="{}"
                Dimensionality="2" Dim0="3" Dim1="2" Encoding="ASCII""#,
                order
            );
            document(&data_array(&attrs, "0 1 0 0 1 0"), 1)
        };
        let img = GiftiImage::from_xml(&matrix("RowMajorOrder")).unwrap();
        let vd = img.vertex_data().unwrap();
        assert_eq!(vd.vertex_count(), 3);
        assert_eq!(vd.column_count(), 2);
        assert_eq!(vd.matrix()[[0, 1]], 1.0);
        assert_eq!(vd.matrix()[[2, 0]], 1.0);

        let img = GiftiImage::from_xml(&matrix("ColumnMajorOrder")).unwrap();
        let vd = img.vertex_data().unwrap();
        assert_eq!(vd.matrix()[[1, 0]], 1.0);
        assert_eq!(vd.matrix()[[1, 1]], 1.0);
        assert_eq!(vd.matrix()[[0, 1]], 0.0);
    }

    #[test]
    fn arrays_are_stacked_side_by_side() {
        let arrays = format!("{}\n{}", ascii_array("0 1 0", 3), ascii_array("1 0 0", 3));
        let img = GiftiImage::from_xml(&document(&arrays, 2)).unwrap();
        let vd = img.vertex_data().unwrap();
        assert_eq!(vd.vertex_count(), 3);
        assert_eq!(vd.column_count(), 2);
        assert_eq!(vd.matrix()[[0, 1]], 1.0);
        assert_eq!(vd.matrix()[[1, 0]], 1.0);
    }

    #[test]
    fn mismatched_vertex_counts_are_rejected() {
        let arrays = format!("{}\n{}", ascii_array("0 1 0", 3), ascii_array("1 0", 2));
        let img = GiftiImage::from_xml(&document(&arrays, 2)).unwrap();
        assert!(matches!(
            img.vertex_data(),
            Err(FormatError::InconsistentVertexCount(3, 2))
        ));
    }

    #[test]
    fn no_arrays_is_an_error() {
        let img = GiftiImage::from_xml(&document("", 0)).unwrap();
        assert!(img.vertex_data().is_err());
    }
}
