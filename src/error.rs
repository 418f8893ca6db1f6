//! Types for error handling go here.

use crate::cifti::BrainStructure;
use crate::typedef::NiftiType;
use quick_error::quick_error;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for the file format readers and writers.
    #[derive(Debug)]
    pub enum FormatError {
        /// Attempted to read an invalid GIFTI file.
        InvalidGifti(reason: String) {
            display("Invalid GIFTI file: {}", reason)
        }
        /// Attempted to read an invalid NIfTI-2 file.
        InvalidNifti2 {
            display("Invalid NIfTI-2 file")
        }
        /// The NIfTI-2 file carries no CIFTI extension.
        MissingCiftiExtension {
            display("NIfTI-2 file has no CIFTI-2 extension")
        }
        /// The CIFTI-2 XML or matrix layout is not valid.
        InvalidCifti(reason: String) {
            display("Invalid CIFTI-2 file: {}", reason)
        }
        /// An unrecognized brain structure name.
        UnknownStructure(name: String) {
            display("Unknown brain structure `{}`", name)
        }
        /// A data type name or code that is not recognized.
        InvalidDataType(name: String) {
            display("Invalid data type `{}`", name)
        }
        /// A data type that this crate does not read.
        UnsupportedDataType(t: NiftiType) {
            display("Unsupported data type {:?}", t)
        }
        /// An array encoding that this crate does not read.
        UnsupportedEncoding(name: String) {
            display("Unsupported data array encoding `{}`", name)
        }
        /// The number of decoded elements does not match the declared dimensions.
        IncompatibleLength(got: usize, expected: usize) {
            display("Data has {} elements, but the dimensions require {}", got, expected)
        }
        /// The data arrays of a surface file disagree on the vertex count.
        InconsistentVertexCount(first: usize, other: usize) {
            display("Data arrays disagree on the vertex count ({} vs {})", first, other)
        }
        /// Attempted to write a matrix whose shape does not match its axes.
        ShapeMismatch(rows: usize, cols: usize, expected_rows: usize, expected_cols: usize) {
            display(
                "Data shape {}x{} does not match the axes ({}x{})",
                rows, cols, expected_rows, expected_cols
            )
        }
        /// XML error
        Xml(err: quick_xml::Error) {
            from()
            source(err)
        }
        /// Base64 error
        Base64(err: base64::DecodeError) {
            from()
            source(err)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

quick_error! {
    /// Error type for the conversion pipeline. Every variant except `Io`
    /// is scoped to a single input file.
    #[derive(Debug)]
    pub enum ConvertError {
        /// The file name carries neither a `LEFT` nor a `RIGHT` token.
        HemisphereUnresolved(file_name: String) {
            display("Cannot determine hemisphere for file: {}", file_name)
        }
        /// The template has no brain model entries for the hemisphere.
        HemisphereAbsent(structure: BrainStructure) {
            display("Template has no entries for {}", structure.cifti_name())
        }
        /// The path has no usable file name.
        InvalidFileName(path: PathBuf) {
            display("Not a valid input file name: {}", path.display())
        }
        /// Failed to load the ROI source file.
        SourceLoad(path: PathBuf, err: FormatError) {
            display("Failed to load ROI file {}: {}", path.display(), err)
            source(err)
        }
        /// Failed to load the template file.
        TemplateLoad(path: PathBuf, err: FormatError) {
            display("Failed to load template {}: {}", path.display(), err)
            source(err)
        }
        /// Failed to build or write the output file.
        OutputWrite(path: PathBuf, err: FormatError) {
            display("Failed to write {}: {}", path.display(), err)
            source(err)
        }
        /// The external tool could not be launched or exited with failure.
        ExternalTool(description: String) {
            display("External tool failed: {}", description)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

/// Alias type for results originated from the format readers and writers.
pub type Result<T> = ::std::result::Result<T, FormatError>;

/// Alias type for results originated from the conversion pipeline.
pub type ConvertResult<T> = ::std::result::Result<T, ConvertError>;
