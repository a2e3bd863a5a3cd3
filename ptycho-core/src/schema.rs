//! Output layout of a translated measurement.
//!
//! The schema is a plain tree of groups and datasets with their attributes,
//! built from the frame geometry and scan grid before any I/O happens. The
//! container writer commits it as-is; every dataset is created with its
//! final shape, so ingest only ever writes by index.
//!
//! ```text
//! /Measurement_000            run-wide attributes
//!     /Channel_000
//!         Raw_Data              [frames, pixels]  frame element type, row-chunked
//!         Position_Indices      [2, frames]       u32
//!         Position_Values       [2, frames]       f32
//!         Spectroscopic_Indices [2, pixels]       u32
//!         Spectroscopic_Values  [2, pixels]       f32
//!         Mean_Ronchigram       [pixels]          f32
//!         Spectroscopic_Mean    [frames]          f32
//! ```

use crate::metadata::MeasurementParams;
use crate::{
    ElementType, Error, FrameGeometry, PositionMatrix, Result, ScanGrid, TranslatorConfig,
};
use ndarray::Array2;
use std::collections::BTreeMap;

pub const MEASUREMENT_GROUP: &str = "Measurement_000";
pub const CHANNEL_GROUP: &str = "Channel_000";

pub const RAW_DATA: &str = "Raw_Data";
pub const POSITION_INDICES: &str = "Position_Indices";
pub const POSITION_VALUES: &str = "Position_Values";
pub const SPECTROSCOPIC_INDICES: &str = "Spectroscopic_Indices";
pub const SPECTROSCOPIC_VALUES: &str = "Spectroscopic_Values";
pub const MEAN_RONCHIGRAM: &str = "Mean_Ronchigram";
pub const SPECTROSCOPIC_MEAN: &str = "Spectroscopic_Mean";

/// Coordinate datasets that `Raw_Data` links to, in link order.
pub const AUXILIARY_DATASETS: [&str; 4] = [
    POSITION_INDICES,
    POSITION_VALUES,
    SPECTROSCOPIC_INDICES,
    SPECTROSCOPIC_VALUES,
];

const POSITION_LABELS: [&str; 2] = ["X", "Y"];
const POSITION_UNITS: [&str; 2] = ["pixel", "pixel"];
const SPECTROSCOPIC_LABELS: [&str; 2] = ["U", "V"];
const SPECTROSCOPIC_UNITS: [&str; 2] = ["", ""];

/// Attribute record, ordered by key.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    UInt(u64),
    StrList(Vec<String>),
    UIntList(Vec<u64>),
}

/// Contents written to a dataset when it is created.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetData {
    /// Left to the fill value; populated later by index.
    Unwritten,
    /// Explicitly zero-filled.
    Zeros,
    U32(Array2<u32>),
    F32(Array2<f32>),
}

/// One dataset of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub name: String,
    pub dtype: ElementType,
    pub shape: Vec<usize>,
    pub chunk: Option<Vec<usize>>,
    /// Deflate level.
    pub compression: Option<u8>,
    pub shuffle: bool,
    pub data: DatasetData,
    pub attrs: Attributes,
    /// Sibling datasets this one refers to. Each becomes an attribute named
    /// after the target, holding the target's path.
    pub references: Vec<String>,
}

impl DatasetSpec {
    fn new(name: &str, dtype: ElementType, shape: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            dtype,
            shape,
            chunk: None,
            compression: None,
            shuffle: false,
            data: DatasetData::Unwritten,
            attrs: Attributes::new(),
            references: Vec::new(),
        }
    }

    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns true if the dataset has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that initial data and chunking agree with the declared shape.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] naming the offending dataset.
    pub fn validate(&self) -> Result<()> {
        let data_shape = match &self.data {
            DatasetData::Unwritten | DatasetData::Zeros => None,
            DatasetData::U32(a) => Some((a.shape(), ElementType::U32)),
            DatasetData::F32(a) => Some((a.shape(), ElementType::F32)),
        };
        if let Some((shape, dtype)) = data_shape {
            if shape != self.shape.as_slice() || dtype != self.dtype {
                return Err(Error::InvalidGeometry(format!(
                    "{}: data {dtype} {shape:?} does not match declared {} {:?}",
                    self.name, self.dtype, self.shape
                )));
            }
        }
        if let Some(chunk) = &self.chunk {
            let fits = chunk.len() == self.shape.len()
                && chunk
                    .iter()
                    .zip(&self.shape)
                    .all(|(&c, &s)| c > 0 && c <= s);
            if !fits {
                return Err(Error::InvalidGeometry(format!(
                    "{}: chunk {chunk:?} does not fit shape {:?}",
                    self.name, self.shape
                )));
            }
        }
        Ok(())
    }
}

/// One group of the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupSpec {
    pub name: String,
    pub attrs: Attributes,
    pub groups: Vec<GroupSpec>,
    pub datasets: Vec<DatasetSpec>,
}

impl GroupSpec {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn find_dataset(&self, name: &str) -> Option<&DatasetSpec> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .or_else(|| self.groups.iter().find_map(|g| g.find_dataset(name)))
    }

    fn collect_paths<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a DatasetSpec)>) {
        let path = format!("{prefix}/{}", self.name);
        for dataset in &self.datasets {
            out.push((format!("{path}/{}", dataset.name), dataset));
        }
        for group in &self.groups {
            group.collect_paths(&path, out);
        }
    }
}

/// A complete output tree, rooted directly below the file root.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub root: GroupSpec,
}

impl Schema {
    /// Looks up a dataset anywhere in the tree by name.
    #[must_use]
    pub fn dataset(&self, name: &str) -> Option<&DatasetSpec> {
        self.root.find_dataset(name)
    }

    /// Every dataset with its absolute path, parents before children.
    #[must_use]
    pub fn dataset_paths(&self) -> Vec<(String, &DatasetSpec)> {
        let mut out = Vec::new();
        self.root.collect_paths("", &mut out);
        out
    }

    /// Validates every dataset and checks that references resolve.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] on the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        let paths = self.dataset_paths();
        for (_, dataset) in &paths {
            dataset.validate()?;
            for target in &dataset.references {
                if !paths.iter().any(|(_, d)| &d.name == target) {
                    return Err(Error::InvalidGeometry(format!(
                        "{} refers to missing dataset {target}",
                        dataset.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builds the output tree for `grid.frames_used()` frames of `geometry`.
///
/// Pure: no I/O, deterministic in its inputs.
///
/// # Errors
/// Returns [`Error::InvalidGeometry`] if the grid is empty or a coordinate
/// matrix cannot be built.
pub fn build_schema(
    geometry: &FrameGeometry,
    grid: &ScanGrid,
    config: &TranslatorConfig,
) -> Result<Schema> {
    let num_frames = grid.frames_used();
    let num_pixels = geometry.num_pixels();
    if num_frames == 0 {
        return Err(Error::InvalidGeometry("scan grid holds no frames".to_string()));
    }

    let position = PositionMatrix::raster(
        &[grid.side(), grid.side()],
        &POSITION_LABELS,
        &POSITION_UNITS,
    )?;
    let spectroscopic = PositionMatrix::raster(
        &[geometry.width, geometry.height],
        &SPECTROSCOPIC_LABELS,
        &SPECTROSCOPIC_UNITS,
    )?;
    let (pos_ind, pos_val) =
        coordinate_datasets(&position, POSITION_INDICES, POSITION_VALUES);
    let (spec_ind, spec_val) =
        coordinate_datasets(&spectroscopic, SPECTROSCOPIC_INDICES, SPECTROSCOPIC_VALUES);

    let mut raw = DatasetSpec::new(RAW_DATA, geometry.element_type, vec![num_frames, num_pixels]);
    raw.chunk = Some(vec![1, num_pixels]);
    raw.compression = config.compression;
    raw.shuffle = config.shuffle;
    raw.references = AUXILIARY_DATASETS.iter().map(|s| (*s).to_string()).collect();

    let mut ronchigram = DatasetSpec::new(MEAN_RONCHIGRAM, ElementType::F32, vec![num_pixels]);
    ronchigram.data = DatasetData::Zeros;
    let mut spec_mean = DatasetSpec::new(SPECTROSCOPIC_MEAN, ElementType::F32, vec![num_frames]);
    spec_mean.data = DatasetData::Zeros;

    let mut channel = GroupSpec::new(CHANNEL_GROUP);
    channel.datasets = vec![raw, spec_ind, spec_val, pos_ind, pos_val, ronchigram, spec_mean];

    let params = MeasurementParams::new(geometry, grid, config.metadata.clone());
    let mut measurement = GroupSpec::new(MEASUREMENT_GROUP);
    measurement.attrs = params.to_attributes();
    measurement.groups.push(channel);

    let schema = Schema { root: measurement };
    schema.validate()?;
    Ok(schema)
}

fn coordinate_datasets(
    matrix: &PositionMatrix,
    indices_name: &str,
    values_name: &str,
) -> (DatasetSpec, DatasetSpec) {
    let shape = matrix.indices().shape().to_vec();
    let attrs = axis_attributes(matrix);

    let mut indices = DatasetSpec::new(indices_name, ElementType::U32, shape.clone());
    indices.data = DatasetData::U32(matrix.indices().clone());
    indices.attrs = attrs.clone();

    let mut values = DatasetSpec::new(values_name, ElementType::F32, shape);
    values.data = DatasetData::F32(matrix.values());
    values.attrs = attrs;

    (indices, values)
}

fn axis_attributes(matrix: &PositionMatrix) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("labels".into(), AttrValue::StrList(matrix.labels()));
    attrs.insert("units".into(), AttrValue::StrList(matrix.units()));
    for axis in matrix.axes() {
        attrs.insert(axis.label.clone(), AttrValue::UIntList(axis.bounds().to_vec()));
    }
    attrs
}
