//! CIFTI-2 files: a NIfTI-2 container whose extension holds an XML
//! document describing what every matrix index refers to.
//!
//! Only dense files are understood in full. Rows and columns may map to
//! named scalars or to brain models; other mapping kinds are recognized
//! by name so that their brain model axis can still be used.

pub mod axis;
pub mod document;
pub mod image;

pub use self::axis::{
    BrainModel, BrainModelAxis, BrainModelEntry, BrainStructure, ModelIndex, ModelType,
    ScalarAxis, VolumeGeometry,
};
pub use self::document::{CiftiAxis, CiftiHeader};
pub use self::image::CiftiImage;
