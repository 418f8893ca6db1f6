//! This module contains definitions for the extension and related types.
//! Extensions are optional data frames sitting before the data.
//! When present, an extender frame of 4 bytes follows the header,
//! with the first byte set to something other than 0. CIFTI-2 keeps its
//! XML document in one such extension.

use crate::error::{FormatError, Result};
use byteordered::{ByteOrdered, Endian};
use std::io::{ErrorKind as IoErrorKind, Read, Write};

/// Extension code of a CIFTI-2 XML extension (`NIFTI_ECODE_CIFTI`).
pub const ECODE_CIFTI: i32 = 32;

/// Data type for the extender code.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Extender([u8; 4]);

impl Extender {
    /// Fetch the extender code from the given source, while
    /// being possible to not be available.
    /// Returns `None` if the source reaches EoF prematurely.
    /// Any other I/O error is delegated to a `FormatError`.
    pub fn from_reader_optional<S: Read>(mut source: S) -> Result<Option<Self>> {
        let mut extension = [0u8; 4];
        match source.read_exact(&mut extension) {
            Ok(()) => Ok(Some(extension.into())),
            Err(ref e) if e.kind() == IoErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(FormatError::from(e)),
        }
    }

    /// Whether extensions should exist upon this extender code.
    pub fn has_extensions(&self) -> bool {
        self.0[0] != 0
    }

    /// Get the extender's bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Extender {
    fn from(extender: [u8; 4]) -> Self {
        Extender(extender)
    }
}

/// Data type for the raw contents of an extension.
/// Users of this type have to reinterpret the data
/// to suit their needs.
#[derive(Debug, PartialEq, Clone)]
pub struct Extension {
    esize: i32,
    ecode: i32,
    edata: Vec<u8>,
}

impl Extension {
    /// Create an extension from its code and payload. The payload is zero
    /// padded so that the full size (`8 + edata.len()`) is a multiple of 16.
    pub fn padded(ecode: i32, mut edata: Vec<u8>) -> Self {
        let full = 8 + edata.len();
        let padded = (full + 15) / 16 * 16;
        edata.resize(padded - 8, 0);
        Extension {
            esize: padded as i32,
            ecode,
            edata,
        }
    }

    /// Obtain the claimed extension raw size (`esize` field).
    pub fn size(&self) -> i32 {
        self.esize
    }

    /// Obtain the extension's code (`ecode` field).
    pub fn code(&self) -> i32 {
        self.ecode
    }

    /// Obtain the extension's data (`edata` field).
    pub fn data(&self) -> &[u8] {
        &self.edata
    }

    /// The extension data up to the first '\0', which is how text
    /// payloads such as the CIFTI-2 XML are terminated.
    pub fn data_trimmed(&self) -> &[u8] {
        let end = self
            .edata
            .iter()
            .position(|b| *b == 0)
            .unwrap_or_else(|| self.edata.len());
        &self.edata[..end]
    }
}

/// Data type for aggregating the extender code and
/// all extensions.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ExtensionSequence {
    extender: Extender,
    extensions: Vec<Extension>,
}

impl<'a> IntoIterator for &'a ExtensionSequence {
    type Item = &'a Extension;
    type IntoIter = ::std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl ExtensionSequence {
    /// Create a sequence holding the given extensions. The extender flag
    /// is set whenever the sequence is not empty.
    pub fn new(extensions: Vec<Extension>) -> Self {
        let extender = if extensions.is_empty() {
            Extender::default()
        } else {
            Extender([1, 0, 0, 0])
        };
        ExtensionSequence {
            extender,
            extensions,
        }
    }

    /// Read a sequence of extensions from a source, up until `len` bytes.
    pub fn from_reader<S, E>(
        extender: Extender,
        source: &mut ByteOrdered<S, E>,
        len: usize,
    ) -> Result<Self>
    where
        S: Read,
        E: Endian,
    {
        let mut extensions = Vec::new();
        if extender.has_extensions() {
            let mut offset = 0;
            while offset < len {
                let esize = source.read_i32()?;
                let ecode = source.read_i32()?;
                if esize < 8 || offset + esize as usize > len {
                    return Err(FormatError::InvalidNifti2);
                }
                let mut edata = vec![0u8; esize as usize - 8];
                source.read_exact(&mut edata)?;
                extensions.push(Extension {
                    esize,
                    ecode,
                    edata,
                });
                offset += esize as usize;
            }
        }

        Ok(ExtensionSequence {
            extender,
            extensions,
        })
    }

    /// Write the extender code followed by all extensions, little endian.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = ByteOrdered::le(writer);
        w.write_all(self.extender.as_bytes())?;
        for e in &self.extensions {
            w.write_i32(e.esize)?;
            w.write_i32(e.ecode)?;
            w.write_all(&e.edata)?;
        }
        Ok(())
    }

    /// Obtain an iterator to the extensions.
    pub fn iter(&self) -> ::std::slice::Iter<Extension> {
        self.extensions.iter()
    }

    /// Find the first extension with the given code.
    pub fn find(&self, ecode: i32) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.ecode == ecode)
    }

    /// Whether the sequence of extensions is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Obtain the number of extensions available.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Total number of bytes this sequence occupies in a file,
    /// including the 4-byte extender.
    pub fn byte_len(&self) -> usize {
        4 + self.extensions.iter().map(|e| e.esize as usize).sum::<usize>()
    }

    /// Get the extender code from this extension sequence.
    pub fn extender(&self) -> Extender {
        self.extender
    }
}
