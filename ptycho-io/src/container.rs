//! HDF5 container for translated measurements.
//!
//! [`Hdf5Container`] owns the output file for the duration of a run. It is
//! created truncated before anything is written, commits a
//! [`Schema`] as a tree of groups and datasets, and hands back a
//! [`DatasetHandle`] per dataset for later writes by index.

use crate::{Error, Result};
use hdf5::types::{H5Type, TypeDescriptor, VarLenUnicode};
use hdf5::{Attribute, Dataset, File, Group, Location};
use ndarray::{s, ArrayD, ArrayView1, IxDyn};
use ptycho_core::schema::{AttrValue, Attributes, DatasetData, DatasetSpec, GroupSpec};
use ptycho_core::{with_pixels, ElementType, Frame, Schema};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// An open HDF5 output file.
pub struct Hdf5Container {
    path: PathBuf,
    file: File,
}

impl Hdf5Container {
    /// Creates an empty container at `path`.
    ///
    /// Whatever was at `path` is truncated without being read, so prior
    /// groups, datasets and attributes are discarded even if the old file is
    /// not valid HDF5.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        log::debug!("cleared container {}", path.display());
        Ok(Self { path, file })
    }

    /// Path of the output file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying HDF5 file.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Forces pending writes to disk.
    ///
    /// # Errors
    /// Returns an error if HDF5 fails to flush.
    pub fn flush(&self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    /// Creates every group and dataset of `schema` below the file root,
    /// writes their initial data and attributes, and links references.
    ///
    /// # Errors
    /// Returns an error if any HDF5 object cannot be created or written. The
    /// file is left partially populated in that case.
    pub fn commit(&self, schema: &Schema) -> Result<DatasetHandles> {
        schema.validate()?;
        let mut handles = DatasetHandles::default();
        commit_group(&self.file, &schema.root, &mut handles)?;
        log::debug!(
            "committed {} datasets to {}",
            handles.len(),
            self.path.display()
        );
        Ok(handles)
    }
}

/// Handles to committed datasets, keyed by dataset name.
#[derive(Default)]
pub struct DatasetHandles {
    map: BTreeMap<String, DatasetHandle>,
}

impl DatasetHandles {
    /// Looks up a handle by dataset name.
    ///
    /// # Errors
    /// Returns [`Error::MissingDataset`] if no dataset of that name was
    /// committed.
    pub fn get(&self, name: &str) -> Result<&DatasetHandle> {
        self.map
            .get(name)
            .ok_or_else(|| Error::MissingDataset(name.to_string()))
    }

    /// Number of committed datasets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing was committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Addressable reference to one committed dataset.
#[derive(Clone, Debug)]
pub struct DatasetHandle {
    dataset: Dataset,
}

impl DatasetHandle {
    /// Absolute path of the dataset inside the file.
    #[must_use]
    pub fn path(&self) -> String {
        self.dataset.name()
    }

    /// Dataset shape.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.dataset.shape()
    }

    /// Underlying HDF5 dataset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Writes `frame` as row `row` of a 2-D dataset.
    ///
    /// # Errors
    /// Returns an error if the row is out of range, the frame length differs
    /// from the row length, or the write fails.
    pub fn write_row(&self, row: usize, frame: &Frame) -> Result<()> {
        with_pixels!(frame, px => {
            self.dataset
                .write_slice(ArrayView1::from(px.as_slice()), s![row, ..])?;
        });
        Ok(())
    }

    /// Writes a single element of a 1-D dataset.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the write fails.
    pub fn write_element(&self, index: usize, value: f32) -> Result<()> {
        let value = [value];
        self.dataset
            .write_slice(ArrayView1::from(&value[..]), s![index..=index])?;
        Ok(())
    }

    /// Replaces the whole contents of a 1-D dataset.
    ///
    /// # Errors
    /// Returns an error if the length differs from the dataset or the write
    /// fails.
    pub fn write_all(&self, values: &[f32]) -> Result<()> {
        self.dataset.write(ArrayView1::from(values))?;
        Ok(())
    }
}

fn commit_group(parent: &Group, spec: &GroupSpec, handles: &mut DatasetHandles) -> Result<()> {
    let group = parent.create_group(&spec.name)?;
    write_attrs(&group, &spec.attrs)?;

    for dataset in &spec.datasets {
        let created = create_dataset(&group, dataset)?;
        write_attrs(&created, &dataset.attrs)?;
        handles
            .map
            .insert(dataset.name.clone(), DatasetHandle { dataset: created });
    }

    // References resolve against siblings, which all exist by now.
    for dataset in &spec.datasets {
        if dataset.references.is_empty() {
            continue;
        }
        let source = handles.get(&dataset.name)?.dataset.clone();
        for target in &dataset.references {
            let target_path = handles.get(target)?.path();
            set_attr_str(&source, target, &target_path)?;
        }
    }

    for child in &spec.groups {
        commit_group(&group, child, handles)?;
    }
    Ok(())
}

fn create_dataset(group: &Group, spec: &DatasetSpec) -> Result<Dataset> {
    match spec.dtype {
        ElementType::U8 => create_typed::<u8>(group, spec),
        ElementType::U16 => create_typed::<u16>(group, spec),
        ElementType::U32 => create_typed::<u32>(group, spec),
        ElementType::U64 => create_typed::<u64>(group, spec),
        ElementType::I8 => create_typed::<i8>(group, spec),
        ElementType::I16 => create_typed::<i16>(group, spec),
        ElementType::I32 => create_typed::<i32>(group, spec),
        ElementType::I64 => create_typed::<i64>(group, spec),
        ElementType::F32 => create_typed::<f32>(group, spec),
        ElementType::F64 => create_typed::<f64>(group, spec),
    }
}

fn create_typed<T: H5Type + Default + Clone>(group: &Group, spec: &DatasetSpec) -> Result<Dataset> {
    let mut builder = group.new_dataset::<T>().shape(spec.shape.clone());

    if let Some(chunk) = &spec.chunk {
        builder = builder.chunk(chunk.clone());
    }

    if let Some(level) = spec.compression {
        builder = builder.deflate(level);
    }

    if spec.shuffle {
        builder = builder.shuffle();
    }

    let dataset = builder.create(spec.name.as_str())?;

    match &spec.data {
        DatasetData::Unwritten => {}
        DatasetData::Zeros => {
            let zeros = ArrayD::<T>::from_elem(IxDyn(&spec.shape), T::default());
            dataset.write(&zeros)?;
        }
        DatasetData::U32(values) => dataset.write(values.view())?,
        DatasetData::F32(values) => dataset.write(values.view())?,
    }

    Ok(dataset)
}

fn write_attrs(location: &Location, attrs: &Attributes) -> Result<()> {
    for (name, value) in attrs {
        match value {
            AttrValue::Str(s) => set_attr_str(location, name, s)?,
            AttrValue::UInt(v) => {
                location
                    .new_attr::<u64>()
                    .create(name.as_str())?
                    .write_scalar(v)?;
            }
            AttrValue::StrList(items) => {
                let values: Vec<VarLenUnicode> = items
                    .iter()
                    .map(|item| to_var_len_unicode(item))
                    .collect::<Result<Vec<_>>>()?;
                let attr = location
                    .new_attr::<VarLenUnicode>()
                    .shape((values.len(),))
                    .create(name.as_str())?;
                attr.write(ArrayView1::from(values.as_slice()))?;
            }
            AttrValue::UIntList(items) => {
                let attr = location
                    .new_attr::<u64>()
                    .shape((items.len(),))
                    .create(name.as_str())?;
                attr.write(ArrayView1::from(items.as_slice()))?;
            }
        }
    }
    Ok(())
}

fn set_attr_str(location: &Location, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    location
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidAttribute(format!("invalid utf-8 attribute: {e}")))
}

/// Contents of a translated file: every group with its attributes and
/// datasets, attribute values rendered as text.
#[derive(Clone, Debug, Default)]
pub struct ContainerSummary {
    pub groups: Vec<GroupSummary>,
}

impl ContainerSummary {
    /// Looks up a dataset summary anywhere in the file by name.
    #[must_use]
    pub fn dataset(&self, name: &str) -> Option<&DatasetSummary> {
        self.groups
            .iter()
            .flat_map(|g| g.datasets.iter())
            .find(|d| d.path.rsplit('/').next() == Some(name))
    }
}

/// One group of a [`ContainerSummary`].
#[derive(Clone, Debug, Default)]
pub struct GroupSummary {
    pub path: String,
    pub attrs: BTreeMap<String, String>,
    pub datasets: Vec<DatasetSummary>,
}

/// One dataset of a [`ContainerSummary`].
#[derive(Clone, Debug)]
pub struct DatasetSummary {
    pub path: String,
    pub shape: Vec<usize>,
    pub dtype: String,
    pub chunk: Option<Vec<usize>>,
    pub attrs: BTreeMap<String, String>,
}

/// Reads the group/dataset structure of an HDF5 file.
///
/// # Errors
/// Returns an error if the file cannot be opened or an object cannot be read.
pub fn read_summary<P: AsRef<Path>>(path: P) -> Result<ContainerSummary> {
    let file = File::open(path)?;
    let mut summary = ContainerSummary::default();
    summarize_group(&file, &mut summary)?;
    Ok(summary)
}

fn summarize_group(group: &Group, summary: &mut ContainerSummary) -> Result<()> {
    let mut datasets = Vec::new();
    for dataset in group.datasets()? {
        datasets.push(DatasetSummary {
            path: dataset.name(),
            shape: dataset.shape(),
            dtype: format!("{:?}", dataset.dtype()?.to_descriptor()?),
            chunk: dataset.chunk(),
            attrs: read_attrs(&dataset)?,
        });
    }
    summary.groups.push(GroupSummary {
        path: group.name(),
        attrs: read_attrs(group)?,
        datasets,
    });
    for child in group.groups()? {
        summarize_group(&child, summary)?;
    }
    Ok(())
}

fn read_attrs(location: &Location) -> Result<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    for name in location.attr_names()? {
        let attr = location.attr(&name)?;
        attrs.insert(name, render_attr(&attr)?);
    }
    Ok(attrs)
}

fn render_attr(attr: &Attribute) -> Result<String> {
    let scalar = attr.is_scalar();
    let rendered = match attr.dtype()?.to_descriptor()? {
        TypeDescriptor::VarLenUnicode if scalar => {
            attr.read_scalar::<VarLenUnicode>()?.as_str().to_string()
        }
        TypeDescriptor::VarLenUnicode => {
            let values = attr.read_raw::<VarLenUnicode>()?;
            let values: Vec<&str> = values.iter().map(VarLenUnicode::as_str).collect();
            format!("{values:?}")
        }
        TypeDescriptor::Unsigned(_) if scalar => attr.read_scalar::<u64>()?.to_string(),
        TypeDescriptor::Unsigned(_) => format!("{:?}", attr.read_raw::<u64>()?),
        other => format!("<{other:?}>"),
    };
    Ok(rendered)
}
