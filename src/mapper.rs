//! Translation of per-vertex ROI membership into positions along a
//! hemisphere's part of a template brain model axis.

use log::warn;
use ndarray::Array1;
use std::collections::BTreeSet;

use crate::cifti::{BrainModelAxis, BrainStructure};
use crate::error::{ConvertError, ConvertResult};
use crate::gifti::VertexData;

/// A cortical hemisphere.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Hemisphere {
    /// Left hemisphere
    Left,
    /// Right hemisphere
    Right,
}

impl Hemisphere {
    /// The cortex structure of this hemisphere.
    pub fn cortex_structure(self) -> BrainStructure {
        match self {
            Hemisphere::Left => BrainStructure::CortexLeft,
            Hemisphere::Right => BrainStructure::CortexRight,
        }
    }

    /// Detect the hemisphere from a file name, case insensitively.
    /// `RIGHT` is checked before `LEFT`, so a name holding both tokens
    /// resolves to the right hemisphere.
    pub fn from_file_name(file_name: &str) -> ConvertResult<Hemisphere> {
        let upper = file_name.to_uppercase();
        match (upper.contains("RIGHT"), upper.contains("LEFT")) {
            (true, true) => {
                warn!(
                    "File name {} names both hemispheres, using the right one",
                    file_name
                );
                Ok(Hemisphere::Right)
            }
            (true, false) => Ok(Hemisphere::Right),
            (false, true) => Ok(Hemisphere::Left),
            (false, false) => Err(ConvertError::HemisphereUnresolved(file_name.to_string())),
        }
    }
}

/// The set of surface vertex ids inside a region of interest.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct RoiMembership {
    vertices: BTreeSet<usize>,
}

impl RoiMembership {
    /// Vertices whose row holds the value 1 in any column.
    pub fn from_vertex_data(data: &VertexData) -> Self {
        let vertices = data
            .matrix()
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|v| *v == 1.))
            .map(|(i, _)| i)
            .collect();
        RoiMembership { vertices }
    }

    /// Membership from explicit vertex ids.
    pub fn from_vertices<I>(vertices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        RoiMembership {
            vertices: vertices.into_iter().collect(),
        }
    }

    /// Whether the vertex is in the region.
    pub fn contains(&self, vertex: usize) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Number of vertices in the region.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the region is empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of member ids at or above `vertex_count`.
    pub fn count_at_or_above(&self, vertex_count: usize) -> usize {
        self.vertices.range(vertex_count..).count()
    }
}

/// Restrict the template axis to the hemisphere's cortex and pick the
/// positions (in the restricted axis) whose vertex is in the ROI.
///
/// Positions are returned in ascending order. An empty ROI or an empty
/// restriction gives no positions; ROI ids the template never refers to
/// are ignored.
pub fn map_roi_to_indices(
    hemisphere: Hemisphere,
    template: &BrainModelAxis,
    roi: &RoiMembership,
) -> (BrainModelAxis, Vec<usize>) {
    let restricted = template.restrict_to(hemisphere.cortex_structure());
    let positions = restricted
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.vertex().map_or(false, |v| roi.contains(v)))
        .map(|(i, _)| i)
        .collect();
    (restricted, positions)
}

/// A row of `len` zeros with ones at the given positions.
/// Positions past the end are ignored.
pub fn mask_row(len: usize, positions: &[usize]) -> Array1<f32> {
    let mut row = Array1::zeros(len);
    for &p in positions {
        if let Some(v) = row.get_mut(p) {
            *v = 1.;
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn template() -> BrainModelAxis {
        let mut axis = BrainModelAxis::new(None);
        axis.add_surface(BrainStructure::CortexLeft, 6, &[0, 1, 2, 3, 4])
            .unwrap();
        axis.add_surface(BrainStructure::CortexRight, 4, &[3, 1]).unwrap();
        axis
    }

    #[test]
    fn hemisphere_detection() {
        assert_eq!(
            Hemisphere::from_file_name("Subject1_LEFT.func.gii").unwrap(),
            Hemisphere::Left
        );
        assert_eq!(
            Hemisphere::from_file_name("sub_right_v1.func.gii").unwrap(),
            Hemisphere::Right
        );
        assert_eq!(
            Hemisphere::from_file_name("LEFT_vs_RIGHT.func.gii").unwrap(),
            Hemisphere::Right
        );
        match Hemisphere::from_file_name("roiX.func.gii") {
            Err(ConvertError::HemisphereUnresolved(name)) => assert_eq!(name, "roiX.func.gii"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn membership_from_any_column() {
        let data = VertexData::new(array![[0., 0.], [1., 0.], [0., 1.], [2., 0.5]]);
        let roi = RoiMembership::from_vertex_data(&data);
        assert_eq!(roi, RoiMembership::from_vertices(vec![1, 2]));
        assert_eq!(roi.len(), 2);
        assert_eq!(roi.count_at_or_above(2), 1);
    }

    #[test]
    fn selects_positions_in_restricted_axis() {
        let roi = RoiMembership::from_vertices(vec![1, 4]);
        let (restricted, positions) = map_roi_to_indices(Hemisphere::Left, &template(), &roi);
        assert_eq!(restricted.len(), 5);
        assert_eq!(positions, vec![1, 4]);
        assert_eq!(mask_row(restricted.len(), &positions), array![0f32, 1., 0., 0., 1.]);

        let (restricted, positions) = map_roi_to_indices(Hemisphere::Right, &template(), &roi);
        assert_eq!(restricted.len(), 2);
        assert_eq!(positions, vec![1]);
    }

    #[test]
    fn empty_roi_gives_no_positions() {
        let (restricted, positions) =
            map_roi_to_indices(Hemisphere::Left, &template(), &RoiMembership::default());
        assert!(positions.is_empty());
        assert_eq!(mask_row(restricted.len(), &positions), Array1::<f32>::zeros(5));
    }

    #[test]
    fn full_roi_and_out_of_range_ids() {
        let roi = RoiMembership::from_vertices(0..100);
        let (restricted, positions) = map_roi_to_indices(Hemisphere::Left, &template(), &roi);
        assert_eq!(positions, (0..restricted.len()).collect::<Vec<_>>());

        let roi = RoiMembership::from_vertices(vec![0, 1, 2, 3]);
        let (_, positions) = map_roi_to_indices(Hemisphere::Left, &template(), &roi);
        assert_eq!(positions.len(), 4);
    }

    #[test]
    fn missing_hemisphere_restricts_to_nothing() {
        let mut axis = BrainModelAxis::new(None);
        axis.add_surface(BrainStructure::CortexLeft, 2, &[0, 1]).unwrap();
        let roi = RoiMembership::from_vertices(vec![0]);
        let (restricted, positions) = map_roi_to_indices(Hemisphere::Right, &axis, &roi);
        assert!(restricted.is_empty());
        assert!(positions.is_empty());
    }
}
