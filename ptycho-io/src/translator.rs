//! End-to-end translation of a frame directory into an HDF5 measurement.

use crate::container::{DatasetHandle, Hdf5Container};
use crate::ingest::{ingest, IngestTargets};
use crate::{image, listing, Error, Result};
use ptycho_core::schema::{MEAN_RONCHIGRAM, RAW_DATA, SPECTROSCOPIC_MEAN};
use ptycho_core::{build_schema, FrameGeometry, ScanGrid, TranslatorConfig};
use std::path::{Path, PathBuf};

/// What a translation run found and kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationReport {
    /// Frame files matching the extension.
    pub files_found: usize,
    /// Frames written, `scan_size²`.
    pub frames_used: usize,
    /// Side of the square scan grid.
    pub scan_size: usize,
    /// Geometry probed from the first frame.
    pub geometry: FrameGeometry,
    /// Trailing files that did not fit the square grid and were not read.
    pub dropped: Vec<PathBuf>,
}

/// A completed translation: the open output file and its main dataset.
pub struct Translation {
    container: Hdf5Container,
    main: DatasetHandle,
    report: TranslationReport,
}

impl Translation {
    /// Handle to `Raw_Data`.
    #[must_use]
    pub fn main(&self) -> &DatasetHandle {
        &self.main
    }

    /// Summary of the run.
    #[must_use]
    pub fn report(&self) -> &TranslationReport {
        &self.report
    }

    /// The output container, still open.
    #[must_use]
    pub fn container(&self) -> &Hdf5Container {
        &self.container
    }
}

/// Translates frame directories with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    /// Creates a translator with the given configuration.
    #[must_use]
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translates every frame file in `input` into the HDF5 file `output`.
    ///
    /// Any prior content of `output` is discarded first. Frames are taken
    /// in directory-listing order; the first `scan_size²` of them are
    /// written, where `scan_size = floor(sqrt(files found))`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `input` does not exist and
    /// [`Error::EmptyInput`] if it holds no frame files (the output is then
    /// left cleared). Any decode, shape or container error aborts the run;
    /// the output is then partially written and should be regenerated.
    pub fn translate<P, Q>(&self, output: P, input: Q) -> Result<Translation>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        self.config.validate()?;
        let input = input.as_ref();

        let files = listing::list_files(input, Some(&self.config.extension))?;
        // Truncated without opening, so a damaged file from an aborted run
        // is replaced too.
        let container = Hdf5Container::create(output)?;

        if files.is_empty() {
            return Err(Error::EmptyInput {
                directory: input.to_path_buf(),
                extension: self.config.extension.clone(),
            });
        }

        let geometry = image::probe(&files[0])?;
        let grid = ScanGrid::from_file_count(files.len());
        let (used, dropped) = files.split_at(grid.frames_used());

        log::info!(
            "Translating {} frames of {}x{} {} from {}",
            used.len(),
            geometry.width,
            geometry.height,
            geometry.element_type,
            input.display()
        );
        if !dropped.is_empty() {
            log::warn!(
                "{} of {} files do not fit a {}x{} scan grid and are ignored",
                dropped.len(),
                files.len(),
                grid.side(),
                grid.side()
            );
        }

        let schema = build_schema(&geometry, &grid, &self.config)?;
        let handles = container.commit(&schema)?;
        container.flush()?;

        let main = handles.get(RAW_DATA)?.clone();
        let targets = IngestTargets {
            main: &main,
            frame_mean: handles.get(SPECTROSCOPIC_MEAN)?,
            ronchigram: handles.get(MEAN_RONCHIGRAM)?,
        };
        let stats = ingest(
            &container,
            used,
            targets,
            &geometry,
            self.config.progress_divisions,
        )?;
        log::info!(
            "Wrote {} frames of {} pixels to {}",
            stats.frames,
            stats.num_pixels,
            container.path().display()
        );

        let report = TranslationReport {
            files_found: files.len(),
            frames_used: stats.frames,
            scan_size: grid.side(),
            geometry,
            dropped: dropped.to_vec(),
        };
        Ok(Translation {
            container,
            main,
            report,
        })
    }
}

/// Translates `input` into `output` with the default configuration.
///
/// # Errors
/// See [`Translator::translate`].
pub fn translate<P, Q>(output: P, input: Q) -> Result<Translation>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Translator::default().translate(output, input)
}
