//! The axes of a CIFTI-2 matrix.
//!
//! A brain model axis maps every flat index along one matrix dimension to a
//! brain structure and, within it, to a surface vertex or a volume voxel.
//! A scalar axis simply names each index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{FormatError, Result};

macro_rules! brain_structures {
    ($($variant:ident => $name:literal,)+) => {
        /// A CIFTI-2 brain structure (`BrainStructure` attribute).
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        pub enum BrainStructure {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
        }

        impl BrainStructure {
            /// All known structures, in declaration order.
            pub const ALL: &'static [BrainStructure] = &[$(BrainStructure::$variant,)+];

            /// The CIFTI-2 name, e.g. `CIFTI_STRUCTURE_CORTEX_LEFT`.
            pub fn cifti_name(self) -> &'static str {
                match self {
                    $(BrainStructure::$variant => $name,)+
                }
            }
        }
    };
}

brain_structures! {
    AccumbensLeft => "CIFTI_STRUCTURE_ACCUMBENS_LEFT",
    AccumbensRight => "CIFTI_STRUCTURE_ACCUMBENS_RIGHT",
    AllWhiteMatter => "CIFTI_STRUCTURE_ALL_WHITE_MATTER",
    AllGreyMatter => "CIFTI_STRUCTURE_ALL_GREY_MATTER",
    AmygdalaLeft => "CIFTI_STRUCTURE_AMYGDALA_LEFT",
    AmygdalaRight => "CIFTI_STRUCTURE_AMYGDALA_RIGHT",
    BrainStem => "CIFTI_STRUCTURE_BRAIN_STEM",
    CaudateLeft => "CIFTI_STRUCTURE_CAUDATE_LEFT",
    CaudateRight => "CIFTI_STRUCTURE_CAUDATE_RIGHT",
    CerebellarWhiteMatterLeft => "CIFTI_STRUCTURE_CEREBELLAR_WHITE_MATTER_LEFT",
    CerebellarWhiteMatterRight => "CIFTI_STRUCTURE_CEREBELLAR_WHITE_MATTER_RIGHT",
    Cerebellum => "CIFTI_STRUCTURE_CEREBELLUM",
    CerebellumLeft => "CIFTI_STRUCTURE_CEREBELLUM_LEFT",
    CerebellumRight => "CIFTI_STRUCTURE_CEREBELLUM_RIGHT",
    CerebralWhiteMatterLeft => "CIFTI_STRUCTURE_CEREBRAL_WHITE_MATTER_LEFT",
    CerebralWhiteMatterRight => "CIFTI_STRUCTURE_CEREBRAL_WHITE_MATTER_RIGHT",
    Cortex => "CIFTI_STRUCTURE_CORTEX",
    CortexLeft => "CIFTI_STRUCTURE_CORTEX_LEFT",
    CortexRight => "CIFTI_STRUCTURE_CORTEX_RIGHT",
    DiencephalonVentralLeft => "CIFTI_STRUCTURE_DIENCEPHALON_VENTRAL_LEFT",
    DiencephalonVentralRight => "CIFTI_STRUCTURE_DIENCEPHALON_VENTRAL_RIGHT",
    HippocampusLeft => "CIFTI_STRUCTURE_HIPPOCAMPUS_LEFT",
    HippocampusRight => "CIFTI_STRUCTURE_HIPPOCAMPUS_RIGHT",
    Invalid => "CIFTI_STRUCTURE_INVALID",
    Other => "CIFTI_STRUCTURE_OTHER",
    OtherGreyMatter => "CIFTI_STRUCTURE_OTHER_GREY_MATTER",
    OtherWhiteMatter => "CIFTI_STRUCTURE_OTHER_WHITE_MATTER",
    PallidumLeft => "CIFTI_STRUCTURE_PALLIDUM_LEFT",
    PallidumRight => "CIFTI_STRUCTURE_PALLIDUM_RIGHT",
    PutamenLeft => "CIFTI_STRUCTURE_PUTAMEN_LEFT",
    PutamenRight => "CIFTI_STRUCTURE_PUTAMEN_RIGHT",
    ThalamusLeft => "CIFTI_STRUCTURE_THALAMUS_LEFT",
    ThalamusRight => "CIFTI_STRUCTURE_THALAMUS_RIGHT",
}

impl FromStr for BrainStructure {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        BrainStructure::ALL
            .iter()
            .copied()
            .find(|b| b.cifti_name() == s)
            .ok_or_else(|| FormatError::UnknownStructure(s.to_string()))
    }
}

impl fmt::Display for BrainStructure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.cifti_name())
    }
}

/// Whether a brain model indexes surface vertices or volume voxels.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ModelType {
    /// `CIFTI_MODEL_TYPE_SURFACE`
    Surface,
    /// `CIFTI_MODEL_TYPE_VOXELS`
    Voxels,
}

impl ModelType {
    /// The CIFTI-2 name of the model type.
    pub fn cifti_name(self) -> &'static str {
        match self {
            ModelType::Surface => "CIFTI_MODEL_TYPE_SURFACE",
            ModelType::Voxels => "CIFTI_MODEL_TYPE_VOXELS",
        }
    }
}

impl FromStr for ModelType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "CIFTI_MODEL_TYPE_SURFACE" => Ok(ModelType::Surface),
            "CIFTI_MODEL_TYPE_VOXELS" => Ok(ModelType::Voxels),
            other => Err(FormatError::InvalidCifti(format!("unknown model type `{}`", other))),
        }
    }
}

/// Where one flat index of a brain model axis points to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ModelIndex {
    /// A vertex of the structure's surface mesh.
    Vertex(usize),
    /// A voxel (i, j, k) of the shared volume.
    Voxel([usize; 3]),
}

/// One entry of a brain model axis.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct BrainModelEntry {
    /// The structure this index belongs to.
    pub structure: BrainStructure,
    /// The vertex or voxel this index represents.
    pub index: ModelIndex,
}

impl BrainModelEntry {
    /// The surface vertex id, if this is a surface entry.
    pub fn vertex(&self) -> Option<usize> {
        match self.index {
            ModelIndex::Vertex(v) => Some(v),
            ModelIndex::Voxel(_) => None,
        }
    }
}

/// Geometry of the volume that voxel models refer to.
#[derive(Debug, PartialEq, Clone)]
pub struct VolumeGeometry {
    /// Volume dimensions (i, j, k).
    pub dimensions: [usize; 3],
    /// Unit exponent of the transform, -3 for millimeters.
    pub meter_exponent: i32,
    /// Voxel index to coordinate transform, row major.
    pub affine: [[f64; 4]; 4],
}

/// A contiguous run of axis entries sharing one structure, as stored in a
/// `BrainModel` element.
#[derive(Debug, PartialEq, Clone)]
pub struct BrainModel {
    /// Structure of the run.
    pub structure: BrainStructure,
    /// Surface or voxels.
    pub model_type: ModelType,
    /// Flat index of the first entry.
    pub index_offset: usize,
    /// Number of entries.
    pub index_count: usize,
    /// Vertex count of the surface, for surface models.
    pub surface_vertex_count: Option<usize>,
    /// Vertex or voxel of every entry.
    pub indices: Vec<ModelIndex>,
}

/// A brain model axis: the per-index mapping described in the module docs.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct BrainModelAxis {
    entries: Vec<BrainModelEntry>,
    surface_vertex_counts: BTreeMap<BrainStructure, usize>,
    volume: Option<VolumeGeometry>,
}

impl BrainModelAxis {
    /// Create an empty axis, optionally with a volume geometry for voxel models.
    pub fn new(volume: Option<VolumeGeometry>) -> Self {
        BrainModelAxis {
            entries: Vec::new(),
            surface_vertex_counts: BTreeMap::new(),
            volume,
        }
    }

    /// Append the given vertices of a structure's surface.
    ///
    /// # Errors
    ///
    /// Fails if a vertex is not below `surface_vertex_count`, or if the
    /// structure was already added with another vertex count.
    pub fn add_surface(
        &mut self,
        structure: BrainStructure,
        surface_vertex_count: usize,
        vertices: &[usize],
    ) -> Result<()> {
        if let Some(v) = vertices.iter().find(|v| **v >= surface_vertex_count) {
            return Err(FormatError::InvalidCifti(format!(
                "vertex {} out of range for {} ({} vertices)",
                v, structure, surface_vertex_count
            )));
        }
        let known = *self
            .surface_vertex_counts
            .entry(structure)
            .or_insert(surface_vertex_count);
        if known != surface_vertex_count {
            return Err(FormatError::InvalidCifti(format!(
                "{} declared with {} and {} vertices",
                structure, known, surface_vertex_count
            )));
        }
        self.entries
            .extend(vertices.iter().map(|v| BrainModelEntry {
                structure,
                index: ModelIndex::Vertex(*v),
            }));
        Ok(())
    }

    /// Append the given voxels of a structure.
    ///
    /// # Errors
    ///
    /// Fails if the axis has no volume geometry or a voxel lies outside it.
    pub fn add_voxels(&mut self, structure: BrainStructure, voxels: &[[usize; 3]]) -> Result<()> {
        let dims = match &self.volume {
            Some(volume) => volume.dimensions,
            None => {
                return Err(FormatError::InvalidCifti(format!(
                    "voxel model {} without a volume",
                    structure
                )))
            }
        };
        if let Some(ijk) = voxels
            .iter()
            .find(|ijk| ijk.iter().zip(&dims).any(|(i, d)| i >= d))
        {
            return Err(FormatError::InvalidCifti(format!(
                "voxel {:?} outside volume {:?}",
                ijk, dims
            )));
        }
        self.entries
            .extend(voxels.iter().map(|ijk| BrainModelEntry {
                structure,
                index: ModelIndex::Voxel(*ijk),
            }));
        Ok(())
    }

    /// Number of flat indices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the axis has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in axis order.
    pub fn iter(&self) -> ::std::slice::Iter<BrainModelEntry> {
        self.entries.iter()
    }

    /// The entry at a flat index.
    pub fn get(&self, index: usize) -> Option<&BrainModelEntry> {
        self.entries.get(index)
    }

    /// The volume geometry, if any.
    pub fn volume(&self) -> Option<&VolumeGeometry> {
        self.volume.as_ref()
    }

    /// Surface vertex count of a structure, if it is a surface structure here.
    pub fn surface_vertex_count(&self, structure: BrainStructure) -> Option<usize> {
        self.surface_vertex_counts.get(&structure).copied()
    }

    /// Distinct structures in order of first appearance.
    pub fn structures(&self) -> Vec<BrainStructure> {
        let mut out: Vec<BrainStructure> = Vec::new();
        for e in &self.entries {
            if !out.contains(&e.structure) {
                out.push(e.structure);
            }
        }
        out
    }

    /// The sub-axis of all entries belonging to `structure`, in axis order.
    /// The surface vertex count of that structure and the volume geometry
    /// are carried over.
    pub fn restrict_to(&self, structure: BrainStructure) -> BrainModelAxis {
        let entries: Vec<BrainModelEntry> = self
            .entries
            .iter()
            .filter(|e| e.structure == structure)
            .copied()
            .collect();
        let surface_vertex_counts = self
            .surface_vertex_counts
            .iter()
            .filter(|(s, _)| **s == structure)
            .map(|(s, n)| (*s, *n))
            .collect();
        BrainModelAxis {
            entries,
            surface_vertex_counts,
            volume: self.volume.clone(),
        }
    }

    /// Group the entries into contiguous brain models.
    pub fn models(&self) -> Vec<BrainModel> {
        let mut models: Vec<BrainModel> = Vec::new();
        for (i, e) in self.entries.iter().enumerate() {
            let model_type = match e.index {
                ModelIndex::Vertex(_) => ModelType::Surface,
                ModelIndex::Voxel(_) => ModelType::Voxels,
            };
            match models.last_mut() {
                Some(m) if m.structure == e.structure && m.model_type == model_type => {
                    m.index_count += 1;
                    m.indices.push(e.index);
                }
                _ => models.push(BrainModel {
                    structure: e.structure,
                    model_type,
                    index_offset: i,
                    index_count: 1,
                    surface_vertex_count: match model_type {
                        ModelType::Surface => self.surface_vertex_count(e.structure),
                        ModelType::Voxels => None,
                    },
                    indices: vec![e.index],
                }),
            }
        }
        models
    }
}

impl<'a> IntoIterator for &'a BrainModelAxis {
    type Item = &'a BrainModelEntry;
    type IntoIter = ::std::slice::Iter<'a, BrainModelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A scalar axis: one name per index.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ScalarAxis {
    names: Vec<String>,
}

impl ScalarAxis {
    /// Create a scalar axis from the map names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScalarAxis {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The map names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of maps.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there are no maps.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
