//! ptycho-io: Frame discovery, TIFF decoding and HDF5 output for ptycho.
//!
//! The [`Translator`] ties the pieces together: it lists the frame files of
//! a directory, probes the first one for geometry, commits the measurement
//! schema to an HDF5 container and streams every frame into it.
//!

mod container;
mod error;
pub mod image;
pub mod ingest;
pub mod listing;
mod translator;

pub use container::{
    read_summary, ContainerSummary, DatasetHandle, DatasetHandles, DatasetSummary, GroupSummary,
    Hdf5Container,
};
pub use error::{Error, Result};
pub use image::{probe, read_frame};
pub use ingest::{ingest, IngestStats, IngestTargets};
pub use listing::list_files;
pub use translator::{translate, Translation, TranslationReport, Translator};
