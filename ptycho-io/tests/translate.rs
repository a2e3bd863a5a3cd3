#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::uninlined_format_args
)]
use approx::assert_relative_eq;
use ptycho_core::schema::{
    MEAN_RONCHIGRAM, POSITION_INDICES, POSITION_VALUES, RAW_DATA, SPECTROSCOPIC_INDICES,
    SPECTROSCOPIC_MEAN, SPECTROSCOPIC_VALUES,
};
use ptycho_core::{ElementType, TranslatorConfig};
use ptycho_io::{list_files, read_summary, translate, Error, Translator};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};

const CHANNEL: &str = "Measurement_000/Channel_000";

fn write_frame(path: &Path, width: u32, height: u32, value: u16) {
    let data = vec![value; (width * height) as usize];
    let mut encoder = TiffEncoder::new(File::create(path).unwrap()).unwrap();
    encoder
        .write_image::<colortype::Gray16>(width, height, &data)
        .unwrap();
}

/// Writes `count` constant 4x4 frames; frame `k` holds the value `10 * k + 1`.
fn write_stack(dir: &Path, count: u16) {
    for k in 0..count {
        write_frame(&dir.join(format!("frame_{k:03}.tif")), 4, 4, 10 * k + 1);
    }
}

/// Constant value of a frame written by [`write_stack`], from its file name.
fn value_of(path: &Path) -> f32 {
    let stem = path.file_stem().unwrap().to_str().unwrap();
    let k: u16 = stem.trim_start_matches("frame_").parse().unwrap();
    f32::from(10 * k + 1)
}

fn listed(dir: &Path) -> Vec<PathBuf> {
    list_files(dir, Some(".tif")).unwrap()
}

#[test]
fn test_ten_frames_use_three_by_three_grid() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_stack(input.path(), 10);
    let order = listed(input.path());

    let translation = translate(&out, input.path()).unwrap();
    let report = translation.report().clone();
    assert_eq!(report.files_found, 10);
    assert_eq!(report.frames_used, 9);
    assert_eq!(report.scan_size, 3);
    assert_eq!(report.geometry.element_type, ElementType::U16);
    assert_eq!(report.dropped, vec![order[9].clone()]);
    assert_eq!(translation.main().shape(), vec![9, 16]);
    drop(translation);

    let file = hdf5::File::open(&out).unwrap();
    let channel = file.group(CHANNEL).unwrap();

    let raw = channel.dataset(RAW_DATA).unwrap().read_2d::<u16>().unwrap();
    assert_eq!(raw.dim(), (9, 16));
    for (row, path) in order.iter().take(9).enumerate() {
        let expected = value_of(path) as u16;
        assert!(raw.row(row).iter().all(|&px| px == expected), "row {row}");
    }

    let means = channel
        .dataset(SPECTROSCOPIC_MEAN)
        .unwrap()
        .read_raw::<f32>()
        .unwrap();
    assert_eq!(means.len(), 9);
    for (mean, path) in means.iter().zip(&order) {
        assert_relative_eq!(*mean, value_of(path), epsilon = 1e-6);
    }

    let expected: f32 = order.iter().take(9).map(|p| value_of(p)).sum::<f32>() / 9.0;
    let ronch = channel
        .dataset(MEAN_RONCHIGRAM)
        .unwrap()
        .read_raw::<f32>()
        .unwrap();
    assert_eq!(ronch.len(), 16);
    for value in ronch {
        assert_relative_eq!(value, expected, epsilon = 1e-4);
    }
}

#[test]
fn test_coordinate_matrices_and_attributes() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    for k in 0..4 {
        write_frame(&input.path().join(format!("frame_{k:03}.tif")), 3, 2, k);
    }

    drop(translate(&out, input.path()).unwrap());

    {
        let file = hdf5::File::open(&out).unwrap();
        let channel = file.group(CHANNEL).unwrap();

        let pos = channel.dataset(POSITION_INDICES).unwrap();
        assert_eq!(pos.shape(), vec![2, 4]);
        assert_eq!(pos.read_raw::<u32>().unwrap(), vec![0, 1, 0, 1, 0, 0, 1, 1]);
        let pos_val = channel
            .dataset(POSITION_VALUES)
            .unwrap()
            .read_raw::<f32>()
            .unwrap();
        assert_eq!(pos_val, vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0]);

        let spectro = channel.dataset(SPECTROSCOPIC_INDICES).unwrap();
        assert_eq!(spectro.shape(), vec![2, 6]);
        assert_eq!(
            spectro.read_raw::<u32>().unwrap(),
            vec![0, 1, 2, 0, 1, 2, 0, 0, 0, 1, 1, 1]
        );
        assert_eq!(
            channel.dataset(SPECTROSCOPIC_VALUES).unwrap().shape(),
            vec![2, 6]
        );
    }

    let summary = read_summary(&out).unwrap();
    let measurement = summary
        .groups
        .iter()
        .find(|g| g.path == "/Measurement_000")
        .unwrap();
    assert_eq!(measurement.attrs["num_images"], "4");
    assert_eq!(measurement.attrs["image_size_u"], "3");
    assert_eq!(measurement.attrs["image_size_v"], "2");
    assert_eq!(measurement.attrs["scan_size_x"], "2");
    assert_eq!(measurement.attrs["translator"], "Ptychography");

    let pos = summary.dataset(POSITION_INDICES).unwrap();
    assert_eq!(pos.attrs["labels"], r#"["X", "Y"]"#);
    assert_eq!(pos.attrs["units"], r#"["pixel", "pixel"]"#);
    let spectro = summary.dataset(SPECTROSCOPIC_INDICES).unwrap();
    assert_eq!(spectro.attrs["labels"], r#"["U", "V"]"#);

    let raw = summary.dataset(RAW_DATA).unwrap();
    assert_eq!(raw.shape, vec![4, 6]);
    assert_eq!(raw.chunk, Some(vec![1, 6]));
    assert_eq!(
        raw.attrs[SPECTROSCOPIC_VALUES],
        "/Measurement_000/Channel_000/Spectroscopic_Values"
    );
}

#[test]
fn test_empty_directory_leaves_cleared_output() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    File::create(input.path().join("notes.txt")).unwrap();

    let err = translate(&out, input.path()).err().unwrap();
    assert!(matches!(err, Error::EmptyInput { .. }));
    assert!(err.is_not_found());

    assert!(out.exists());
    let summary = read_summary(&out).unwrap();
    assert_eq!(summary.groups.len(), 1);
    assert!(summary.groups[0].datasets.is_empty());
    assert!(summary.groups[0].attrs.is_empty());
}

#[test]
fn test_missing_directory_does_not_touch_output() {
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");

    let err = translate(&out, output.path().join("nowhere")).err().unwrap();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!out.exists());
}

#[test]
fn test_shape_mismatch_keeps_earlier_rows() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_stack(input.path(), 4);

    // Overwriting in place keeps the directory order.
    let order = listed(input.path());
    write_frame(&order[2], 4, 5, 7);

    let err = translate(&out, input.path()).err().unwrap();
    match err {
        Error::ShapeMismatch {
            index,
            path,
            expected,
            actual,
        } => {
            assert_eq!(index, 2);
            assert_eq!(path, order[2]);
            assert_eq!(expected, 16);
            assert_eq!(actual, 20);
        }
        other => panic!("unexpected error {other}"),
    }

    let file = hdf5::File::open(&out).unwrap();
    let raw = file
        .group(CHANNEL)
        .unwrap()
        .dataset(RAW_DATA)
        .unwrap()
        .read_2d::<u16>()
        .unwrap();
    for (row, path) in order.iter().take(2).enumerate() {
        let expected = value_of(path) as u16;
        assert!(raw.row(row).iter().all(|&px| px == expected));
    }
}

#[test]
fn test_rerun_replaces_previous_output() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_stack(first.path(), 9);
    write_stack(second.path(), 5);

    drop(translate(&out, first.path()).unwrap());
    let translation = translate(&out, second.path()).unwrap();
    assert_eq!(translation.report().frames_used, 4);
    drop(translation);

    let summary = read_summary(&out).unwrap();
    assert_eq!(summary.dataset(RAW_DATA).unwrap().shape, vec![4, 16]);
    assert_eq!(summary.dataset(SPECTROSCOPIC_MEAN).unwrap().shape, vec![4]);
    let measurement = summary
        .groups
        .iter()
        .find(|g| g.path == "/Measurement_000")
        .unwrap();
    assert_eq!(measurement.attrs["num_images"], "4");
}

#[test]
fn test_custom_extension_and_metadata() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_frame(&input.path().join("a.tiff"), 2, 2, 3);
    write_frame(&input.path().join("b.tif"), 2, 2, 5);

    let config = TranslatorConfig::from_json(
        r#"{"extension": ".tiff", "compression": null, "metadata": {"sample_name": "MoS2"}}"#,
    )
    .unwrap();
    let translation = Translator::new(config).translate(&out, input.path()).unwrap();
    assert_eq!(translation.report().files_found, 1);
    assert_eq!(translation.report().scan_size, 1);
    drop(translation);

    let summary = read_summary(&out).unwrap();
    let measurement = summary
        .groups
        .iter()
        .find(|g| g.path == "/Measurement_000")
        .unwrap();
    assert_eq!(measurement.attrs["sample_name"], "MoS2");
    assert_eq!(summary.dataset(RAW_DATA).unwrap().shape, vec![1, 4]);
}

#[test]
fn test_invalid_config_rejected_before_output() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_stack(input.path(), 1);

    let config = TranslatorConfig {
        extension: "tif".to_string(),
        ..TranslatorConfig::default()
    };
    let err = Translator::new(config)
        .translate(&out, input.path())
        .err()
        .unwrap();
    assert!(matches!(err, Error::CoreError(_)));
    assert!(!out.exists());
}

#[test]
fn test_damaged_output_is_replaced() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_stack(input.path(), 4);
    std::fs::write(&out, b"left behind by an interrupted run").unwrap();

    let translation = translate(&out, input.path()).unwrap();
    assert_eq!(translation.report().frames_used, 4);
    drop(translation);

    let summary = read_summary(&out).unwrap();
    assert_eq!(summary.dataset(RAW_DATA).unwrap().shape, vec![4, 16]);
}

#[test]
fn test_files_past_square_are_never_read() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = output.path().join("scan.h5");
    write_stack(input.path(), 7);

    // Frames past the 2x2 grid in listing order become undecodable.
    let order = listed(input.path());
    for path in &order[4..] {
        std::fs::write(path, b"not a tiff").unwrap();
    }

    let translation = translate(&out, input.path()).unwrap();
    let report = translation.report();
    assert_eq!(report.files_found, 7);
    assert_eq!(report.frames_used, 4);
    assert_eq!(report.dropped, order[4..].to_vec());
    assert_eq!(translation.main().shape(), vec![4, 16]);
}
