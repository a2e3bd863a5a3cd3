//! ptycho-core: Core types for translating scanning-microscopy image stacks.
//!
//! This crate is free of I/O. It describes decoded frames, the scan grid,
//! the coordinate (position/spectroscopic) matrices and the HDF5 layout of
//! a translated measurement, so that the layout can be built and inspected
//! before any file is touched.
//!

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod metadata;
pub mod position;
pub mod schema;

pub use config::{MetadataConfig, TranslatorConfig};
pub use error::{Error, Result};
pub use frame::{ElementType, Frame};
pub use geometry::{FrameGeometry, ScanGrid};
pub use metadata::MeasurementParams;
pub use position::{AxisSlice, PositionMatrix};
pub use schema::{
    build_schema, AttrValue, Attributes, DatasetData, DatasetSpec, GroupSpec, Schema,
};
