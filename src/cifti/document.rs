//! The CIFTI-2 XML document kept in the NIfTI-2 extension: reading it into
//! axes and writing axes back out.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;

use super::axis::{BrainModelAxis, BrainStructure, ModelType, ScalarAxis, VolumeGeometry};
use crate::error::{FormatError, Result};
use crate::xml;

/// The CIFTI-2 version this crate writes and accepts.
pub const CIFTI_VERSION: &str = "2";

const INDEX_TYPE_SCALARS: &str = "CIFTI_INDEX_TYPE_SCALARS";
const INDEX_TYPE_BRAIN_MODELS: &str = "CIFTI_INDEX_TYPE_BRAIN_MODELS";

/// The mapping along one matrix dimension.
#[derive(Debug, PartialEq, Clone)]
pub enum CiftiAxis {
    /// `CIFTI_INDEX_TYPE_SCALARS`
    Scalars(ScalarAxis),
    /// `CIFTI_INDEX_TYPE_BRAIN_MODELS`
    BrainModels(BrainModelAxis),
    /// Any other mapping (series, labels, parcels), kept by type name only.
    Unsupported(String),
}

impl CiftiAxis {
    /// Number of indices along this axis, when known.
    pub fn len(&self) -> Option<usize> {
        match self {
            CiftiAxis::Scalars(a) => Some(a.len()),
            CiftiAxis::BrainModels(a) => Some(a.len()),
            CiftiAxis::Unsupported(_) => None,
        }
    }
}

/// The axes of a CIFTI-2 matrix, one per matrix dimension.
#[derive(Debug, PartialEq, Clone)]
pub struct CiftiHeader {
    axes: Vec<CiftiAxis>,
}

impl CiftiHeader {
    /// A header with one axis per matrix dimension, in dimension order.
    pub fn from_axes(axes: Vec<CiftiAxis>) -> Self {
        CiftiHeader { axes }
    }

    /// Header of a dense scalar file: named maps along the rows, brain
    /// models along the columns.
    pub fn dense_scalar(scalars: ScalarAxis, brain_models: BrainModelAxis) -> Self {
        CiftiHeader {
            axes: vec![CiftiAxis::Scalars(scalars), CiftiAxis::BrainModels(brain_models)],
        }
    }

    /// All axes in dimension order.
    pub fn axes(&self) -> &[CiftiAxis] {
        &self.axes
    }

    /// The axis of one matrix dimension.
    pub fn axis(&self, dim: usize) -> Option<&CiftiAxis> {
        self.axes.get(dim)
    }

    /// The brain model axis of the given matrix dimension.
    ///
    /// # Errors
    ///
    /// `FormatError::InvalidCifti` if that dimension is missing or maps to
    /// something other than brain models.
    pub fn brain_model_axis(&self, dim: usize) -> Result<&BrainModelAxis> {
        match self.axes.get(dim) {
            Some(CiftiAxis::BrainModels(axis)) => Ok(axis),
            Some(_) => Err(FormatError::InvalidCifti(format!(
                "dimension {} does not map to brain models",
                dim
            ))),
            None => Err(FormatError::InvalidCifti(format!("no dimension {}", dim))),
        }
    }

    /// Parse a CIFTI-2 XML document.
    pub fn from_xml(text: &str) -> Result<CiftiHeader> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut parser = Parser::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    parser.start(xml::tag_name(&e), xml::attributes(&e)?)?;
                }
                Event::Empty(e) => {
                    parser.start(xml::tag_name(&e), xml::attributes(&e)?)?;
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

    /// Serialize to a CIFTI-2 XML document. The output only depends on
    /// the axes, so equal headers give identical bytes.
    pub fn to_xml(&self) -> Result<String> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        start(&mut w, "CIFTI", &[("Version", CIFTI_VERSION)])?;
        start(&mut w, "Matrix", &[])?;
        for (dim, axis) in self.axes.iter().enumerate() {
            let applies = dim.to_string();
            match axis {
                CiftiAxis::Scalars(scalars) => {
                    start(
                        &mut w,
                        "MatrixIndicesMap",
                        &[
                            ("AppliesToMatrixDimension", applies.as_str()),
                            ("IndicesMapToDataType", INDEX_TYPE_SCALARS),
                        ],
                    )?;
                    for name in scalars.names() {
                        start(&mut w, "NamedMap", &[])?;
                        text_element(&mut w, "MapName", &[], name)?;
                        end(&mut w, "NamedMap")?;
                    }
                    end(&mut w, "MatrixIndicesMap")?;
                }
                CiftiAxis::BrainModels(models) => {
                    start(
                        &mut w,
                        "MatrixIndicesMap",
                        &[
                            ("AppliesToMatrixDimension", applies.as_str()),
                            ("IndicesMapToDataType", INDEX_TYPE_BRAIN_MODELS),
                        ],
                    )?;
                    write_brain_models(&mut w, models)?;
                    end(&mut w, "MatrixIndicesMap")?;
                }
                CiftiAxis::Unsupported(kind) => {
                    return Err(FormatError::InvalidCifti(format!(
                        "cannot write a {} mapping",
                        kind
                    )))
                }
            }
        }
        end(&mut w, "Matrix")?;
        end(&mut w, "CIFTI")?;
        String::from_utf8(w.into_inner())
            .map_err(|_| FormatError::InvalidCifti("non UTF-8 XML".to_string()))
    }
}

fn write_brain_models(w: &mut Writer<Vec<u8>>, axis: &BrainModelAxis) -> Result<()> {
    if let Some(volume) = axis.volume() {
        let dims = volume
            .dimensions
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        start(w, "Volume", &[("VolumeDimensions", dims.as_str())])?;
        let exponent = volume.meter_exponent.to_string();
        let affine = volume
            .affine
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        text_element(
            w,
            "TransformationMatrixVoxelIndicesIJKtoXYZ",
            &[("MeterExponent", exponent.as_str())],
            &affine,
        )?;
        end(w, "Volume")?;
    }

    for model in axis.models() {
        let offset = model.index_offset.to_string();
        let count = model.index_count.to_string();
        let mut attrs = vec![
            ("IndexOffset", offset.as_str()),
            ("IndexCount", count.as_str()),
            ("ModelType", model.model_type.cifti_name()),
            ("BrainStructure", model.structure.cifti_name()),
        ];
        let nvertices = model.surface_vertex_count.map(|n| n.to_string());
        if let Some(n) = &nvertices {
            attrs.push(("SurfaceNumberOfVertices", n.as_str()));
        }
        start(w, "BrainModel", &attrs)?;
        match model.model_type {
            ModelType::Surface => {
                let vertices = model
                    .indices
                    .iter()
                    .filter_map(|i| match i {
                        super::axis::ModelIndex::Vertex(v) => Some(v.to_string()),
                        super::axis::ModelIndex::Voxel(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                text_element(w, "VertexIndices", &[], &vertices)?;
            }
            ModelType::Voxels => {
                let voxels = model
                    .indices
                    .iter()
                    .filter_map(|i| match i {
                        super::axis::ModelIndex::Voxel([a, b, c]) => {
                            Some(format!("{} {} {}", a, b, c))
                        }
                        super::axis::ModelIndex::Vertex(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                text_element(w, "VoxelIndicesIJK", &[], &voxels)?;
            }
        }
        end(w, "BrainModel")?;
    }
    Ok(())
}

fn start(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut e = BytesStart::new(name);
    for attr in attrs {
        e.push_attribute(*attr);
    }
    w.write_event(Event::Start(e))?;
    Ok(())
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(
    w: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    start(w, name, attrs)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    end(w, name)
}

/// A `BrainModel` element whose indices have been read but not validated.
#[derive(Debug)]
struct RawModel {
    offset: usize,
    count: usize,
    model_type: ModelType,
    structure: BrainStructure,
    nvertices: Option<usize>,
    indices: Vec<usize>,
}

/// A `MatrixIndicesMap` being read.
#[derive(Debug, Default)]
struct RawMap {
    dims: Vec<usize>,
    kind: String,
    names: Vec<String>,
    volume_dims: Option<[usize; 3]>,
    meter_exponent: i32,
    affine: Option<[[f64; 4]; 4]>,
    models: Vec<RawModel>,
}

#[derive(Debug, Default)]
struct Parser {
    stack: Vec<String>,
    text: String,
    seen_root: bool,
    map: Option<RawMap>,
    axes: HashMap<usize, CiftiAxis>,
}

impl Parser {
    fn start(&mut self, name: String, attrs: HashMap<String, String>) -> Result<()> {
        if !self.seen_root {
            if name != "CIFTI" {
                return Err(invalid(format!("root element is `{}`", name)));
            }
            match attrs.get("Version").map(|v| v.trim()) {
                Some("2") | Some("2.0") => {}
                other => return Err(invalid(format!("unsupported version {:?}", other))),
            }
            self.seen_root = true;
        } else {
            match name.as_str() {
                "MatrixIndicesMap" => {
                    let dims = required(&attrs, "AppliesToMatrixDimension")?
                        .split(',')
                        .map(|d| parse_num::<usize>("AppliesToMatrixDimension", d))
                        .collect::<Result<Vec<_>>>()?;
                    let kind = required(&attrs, "IndicesMapToDataType")?.trim().to_string();
                    self.map = Some(RawMap {
                        dims,
                        kind,
                        ..RawMap::default()
                    });
                }
                "Volume" => {
                    let dims = required(&attrs, "VolumeDimensions")?
                        .split(',')
                        .map(|d| parse_num::<usize>("VolumeDimensions", d))
                        .collect::<Result<Vec<_>>>()?;
                    if dims.len() != 3 {
                        return Err(invalid("VolumeDimensions needs 3 values".to_string()));
                    }
                    if let Some(map) = self.map.as_mut() {
                        map.volume_dims = Some([dims[0], dims[1], dims[2]]);
                    }
                }
                "TransformationMatrixVoxelIndicesIJKtoXYZ" => {
                    let exponent =
                        parse_num::<i32>("MeterExponent", required(&attrs, "MeterExponent")?)?;
                    if let Some(map) = self.map.as_mut() {
                        map.meter_exponent = exponent;
                    }
                }
                "BrainModel" => {
                    let model = RawModel {
                        offset: parse_num("IndexOffset", required(&attrs, "IndexOffset")?)?,
                        count: parse_num("IndexCount", required(&attrs, "IndexCount")?)?,
                        model_type: required(&attrs, "ModelType")?.parse()?,
                        structure: required(&attrs, "BrainStructure")?.parse()?,
                        nvertices: match attrs.get("SurfaceNumberOfVertices") {
                            Some(n) => Some(parse_num("SurfaceNumberOfVertices", n)?),
                            None => None,
                        },
                        indices: Vec::new(),
                    };
                    if let Some(map) = self.map.as_mut() {
                        map.models.push(model);
                    }
                }
                _ => {}
            }
        }
        self.stack.push(name);
        self.text.clear();
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let name = self
            .stack
            .pop()
            .ok_or_else(|| invalid("unbalanced elements".to_string()))?;
        let text = std::mem::take(&mut self.text);
        let map = match self.map.as_mut() {
            Some(map) => map,
            None => return Ok(()),
        };
        match name.as_str() {
            "MapName" => map.names.push(text.trim().to_string()),
            "TransformationMatrixVoxelIndicesIJKtoXYZ" => {
                let values = text
                    .split_whitespace()
                    .map(|v| parse_num::<f64>("transformation matrix", v))
                    .collect::<Result<Vec<_>>>()?;
                if values.len() != 16 {
                    return Err(invalid("transformation matrix needs 16 values".to_string()));
                }
                let mut affine = [[0.; 4]; 4];
                for (k, v) in values.into_iter().enumerate() {
                    affine[k / 4][k % 4] = v;
                }
                map.affine = Some(affine);
            }
            "VertexIndices" | "VoxelIndicesIJK" => {
                let indices = text
                    .split_whitespace()
                    .map(|v| parse_num::<usize>(&name, v))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(model) = map.models.last_mut() {
                    model.indices = indices;
                }
            }
            "MatrixIndicesMap" => {
                if let Some(map) = self.map.take() {
                    let dims = map.dims.clone();
                    let axis = map.into_axis()?;
                    for d in dims {
                        if self.axes.insert(d, axis.clone()).is_some() {
                            return Err(invalid(format!("dimension {} mapped twice", d)));
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> Result<CiftiHeader> {
        if !self.seen_root {
            return Err(invalid("empty document".to_string()));
        }
        if !self.stack.is_empty() {
            return Err(invalid("unbalanced elements".to_string()));
        }
        let mut axes = Vec::with_capacity(self.axes.len());
        for dim in 0..self.axes.len() {
            match self.axes.remove(&dim) {
                Some(axis) => axes.push(axis),
                None => return Err(invalid(format!("no mapping for dimension {}", dim))),
            }
        }
        Ok(CiftiHeader { axes })
    }
}

impl RawMap {
    fn into_axis(self) -> Result<CiftiAxis> {
        match self.kind.as_str() {
            INDEX_TYPE_SCALARS => Ok(CiftiAxis::Scalars(ScalarAxis::new(self.names))),
            INDEX_TYPE_BRAIN_MODELS => {
                let volume = match (self.volume_dims, self.affine) {
                    (Some(dimensions), Some(affine)) => Some(VolumeGeometry {
                        dimensions,
                        meter_exponent: self.meter_exponent,
                        affine,
                    }),
                    (None, None) => None,
                    _ => return Err(invalid("incomplete Volume element".to_string())),
                };
                let mut axis = BrainModelAxis::new(volume);
                let mut models = self.models;
                models.sort_by_key(|m| m.offset);
                for m in models {
                    if m.offset != axis.len() {
                        return Err(invalid(format!(
                            "{} starts at {}, expected {}",
                            m.structure,
                            m.offset,
                            axis.len()
                        )));
                    }
                    match m.model_type {
                        ModelType::Surface => {
                            if m.indices.len() != m.count {
                                return Err(invalid(format!(
                                    "{} lists {} vertices, IndexCount is {}",
                                    m.structure,
                                    m.indices.len(),
                                    m.count
                                )));
                            }
                            let nvertices = m.nvertices.ok_or_else(|| {
                                invalid(format!("{} lacks SurfaceNumberOfVertices", m.structure))
                            })?;
                            axis.add_surface(m.structure, nvertices, &m.indices)?;
                        }
                        ModelType::Voxels => {
                            let expected = m.count.checked_mul(3).ok_or_else(|| {
                                invalid(format!("{} IndexCount overflows", m.structure))
                            })?;
                            if m.indices.len() != expected {
                                return Err(invalid(format!(
                                    "{} lists {} voxel indices, IndexCount is {}",
                                    m.structure,
                                    m.indices.len(),
                                    m.count
                                )));
                            }
                            let voxels: Vec<[usize; 3]> = m
                                .indices
                                .chunks(3)
                                .map(|c| [c[0], c[1], c[2]])
                                .collect();
                            axis.add_voxels(m.structure, &voxels)?;
                        }
                    }
                }
                Ok(CiftiAxis::BrainModels(axis))
            }
            other => Ok(CiftiAxis::Unsupported(other.to_string())),
        }
    }
}

fn invalid(reason: String) -> FormatError {
    FormatError::InvalidCifti(reason)
}

fn required<'a>(attrs: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| invalid(format!("missing attribute `{}`", key)))
}

fn parse_num<T: std::str::FromStr>(what: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("bad {} value `{}`", what, value)))
}
