//! Conversion of surface region-of-interest masks into dense scalar
//! CIFTI-2 files.
//!
//! ROI masks stored as GIFTI functional files (`.func.gii`) are mapped
//! onto the brain model axis of a reference CIFTI-2 template, written as
//! one-row dense scalar files (`.dscalar.nii`) and then expanded to the
//! template's full column space with Connectome Workbench's
//! `wb_command -cifti-create-dense-from-template`.
//!
//! The crate also carries the format layer this needs: a GIFTI reader and
//! a CIFTI-2 (NIfTI-2 plus XML extension) reader and writer.
//!
//! # Example
//!
//! ```no_run
//! use roicifti::{batch, Config};
//!
//! let config = Config::new("template.dscalar.nii", "wb_command")
//!     .input_dir("rois")
//!     .output_dir("out");
//! let summary = batch::run(&config)?;
//! println!("{} of {} files converted", summary.converted, summary.seen);
//! # Ok::<(), roicifti::error::ConvertError>(())
//! ```
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

pub mod batch;
pub mod cifti;
pub mod config;
pub mod error;
pub mod expander;
pub mod extension;
pub mod gifti;
pub mod header;
pub mod mapper;
pub mod processor;
pub mod typedef;
mod util;
mod xml;

pub use batch::{run, BatchSummary};
pub use cifti::{BrainModelAxis, BrainStructure, CiftiHeader, CiftiImage, ScalarAxis};
pub use config::Config;
pub use error::{ConvertError, ConvertResult, FormatError, Result};
pub use expander::{DensifyOutcome, Expander, ToolRunner};
pub use gifti::{read_gifti, GiftiImage, VertexData};
pub use header::Nifti2Header;
pub use mapper::{map_roi_to_indices, mask_row, Hemisphere, RoiMembership};
pub use processor::{FileProcessor, GridSink, Processed, SurfaceSource, TemplateSource};
