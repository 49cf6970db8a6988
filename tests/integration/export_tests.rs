//! Export and import integration tests.
//!
//! Tests verify:
//! - Exported views read back unchanged
//! - Manifest contents
//! - Out-of-range import indices select the nearest view
//! - Existing datasets are only replaced on request

use stack_export::convert::{ImageConversionAdapter, IntensityRange, RangeMode, ViewKey};
use stack_export::error::ExportError;
use stack_export::export::{
    ExportManifest, ExportOptions, ExportedDataset, PngCompression, StackExporter, MANIFEST_FILE,
};
use stack_export::stack::{MemoryStack, SampleType, VoxelSize};

use super::test_utils::{two_timepoint_stack, volume, TestDir};

/// 2 timepoints x 2 channels of 3 planes, every sample distinct per view.
fn hyperstack() -> MemoryStack {
    let views = (0..4)
        .map(|v| volume(3, 4, 5, move |(z, y, x)| (v * 1000 + z * 100 + y * 10 + x) as u16))
        .collect();
    MemoryStack::from_volumes("hyper", 2, views).unwrap()
}

#[test]
fn test_export_round_trip() {
    let dir = TestDir::new("export-rt");
    let output = dir.join("dataset");
    let adapter = ImageConversionAdapter::from_stack(hyperstack(), RangeMode::ComputeGlobal).unwrap();

    let summary = StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();
    assert_eq!(summary.views, 4);
    assert_eq!(summary.planes, 12);
    assert!(summary.bytes_written > 0);
    assert_eq!(summary.intensity_range, IntensityRange::new(0.0, 3234.0));

    let dataset = ExportedDataset::open(&output).unwrap();
    for key in adapter.view_keys().collect::<Vec<_>>() {
        let expected = adapter.get_view(key.timepoint, key.channel).unwrap();
        let imported = dataset.read_view(key.timepoint, key.channel).unwrap();
        assert_eq!(imported.key, key);
        assert_eq!(imported.volume, expected);
    }
}

#[test]
fn test_manifest_contents() {
    let dir = TestDir::new("export-manifest");
    let output = dir.join("dataset");
    let adapter = ImageConversionAdapter::create_gray16(
        hyperstack(),
        RangeMode::Explicit {
            min: 0.0,
            max: 4000.0,
        },
    )
    .unwrap();

    StackExporter::new(ExportOptions {
        overwrite: false,
        compression: PngCompression::Fast,
    })
    .export(&adapter, &output)
    .unwrap();

    let manifest = ExportManifest::load(&output).unwrap();
    assert_eq!(manifest.name, "hyper");
    assert_eq!(manifest.source_sample_type, SampleType::Gray16);
    assert_eq!(
        (manifest.width, manifest.height, manifest.depth),
        (5, 4, 3)
    );
    assert_eq!((manifest.timepoints, manifest.channels), (2, 2));
    assert_eq!(manifest.intensity_range, IntensityRange::new(0.0, 4000.0));
    assert_eq!(
        manifest.range_mode,
        RangeMode::Explicit {
            min: 0.0,
            max: 4000.0
        }
    );

    let keys: Vec<_> = manifest
        .views
        .iter()
        .map(|v| ViewKey::new(v.timepoint, v.channel))
        .collect();
    assert_eq!(keys, adapter.view_keys().collect::<Vec<_>>());
    for entry in &manifest.views {
        assert!(output.join(&entry.directory).join("z0002.png").exists());
    }
}

#[test]
fn test_import_clamps_indices() {
    let dir = TestDir::new("export-clamp");
    let output = dir.join("dataset");
    let adapter = ImageConversionAdapter::from_stack(hyperstack(), RangeMode::ComputeGlobal).unwrap();
    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();

    let dataset = ExportedDataset::open(&output).unwrap();
    assert_eq!(dataset.clamp_key(7, 0), ViewKey::new(1, 0));
    assert_eq!(dataset.clamp_key(0, 9), ViewKey::new(0, 1));

    let clamped = dataset.read_view(10, 10).unwrap();
    assert_eq!(clamped.key, ViewKey::new(1, 1));
    assert_eq!(clamped.volume, adapter.get_view(1, 1).unwrap());
}

#[test]
fn test_existing_output_requires_overwrite() {
    let dir = TestDir::new("export-exists");
    let output = dir.join("dataset");
    let adapter =
        ImageConversionAdapter::from_stack(two_timepoint_stack(), RangeMode::ComputeGlobal)
            .unwrap();

    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();
    assert!(output.join(MANIFEST_FILE).exists());

    let result = StackExporter::new(ExportOptions::default()).export(&adapter, &output);
    assert!(matches!(result, Err(ExportError::OutputExists(_))));

    let summary = StackExporter::new(ExportOptions {
        overwrite: true,
        ..ExportOptions::default()
    })
    .export(&adapter, &output)
    .unwrap();
    assert_eq!(summary.views, 2);
}

#[test]
fn test_open_without_manifest() {
    let dir = TestDir::new("export-empty");
    assert!(ExportedDataset::open(dir.path()).is_err());
}

#[test]
fn test_missing_plane_file() {
    let dir = TestDir::new("export-missing-plane");
    let output = dir.join("dataset");
    let adapter =
        ImageConversionAdapter::from_stack(two_timepoint_stack(), RangeMode::ComputeGlobal)
            .unwrap();
    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();

    let manifest = ExportManifest::load(&output).unwrap();
    std::fs::remove_file(output.join(&manifest.views[1].directory).join("z0001.png")).unwrap();

    let dataset = ExportedDataset::open(&output).unwrap();
    assert!(dataset.read_view(0, 0).is_ok());
    assert!(matches!(dataset.read_view(1, 0), Err(ExportError::Io(_))));
}

#[test]
fn test_non_finite_range_not_exported() {
    let dir = TestDir::new("export-nan");
    let output = dir.join("dataset");
    let stack =
        MemoryStack::from_volumes("nan", 1, vec![volume(1, 1, 2, |(_, _, x)| [f32::NAN, 1.0][x])])
            .unwrap();
    let adapter = ImageConversionAdapter::from_stack(stack, RangeMode::ComputeGlobal).unwrap();

    let result = StackExporter::new(ExportOptions::default()).export(&adapter, &output);
    assert!(matches!(result, Err(ExportError::NonFiniteRange { .. })));
    assert!(!output.exists());
}

#[test]
fn test_voxel_size_carried_to_import() {
    let dir = TestDir::new("export-voxel");
    let output = dir.join("dataset");
    let calibration = VoxelSize::new("um", 0.325, 0.325, 1.5);
    let stack = hyperstack().with_voxel_size(calibration.clone());
    let adapter = ImageConversionAdapter::from_stack(stack, RangeMode::ComputeGlobal).unwrap();
    assert_eq!(adapter.voxel_size(), Some(&calibration));

    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();

    let dataset = ExportedDataset::open(&output).unwrap();
    assert_eq!(dataset.manifest().voxel_size, Some(calibration.clone()));
    assert_eq!(dataset.read_view(1, 0).unwrap().voxel_size, Some(calibration));
}

#[test]
fn test_uncalibrated_stack_imports_without_voxel_size() {
    let dir = TestDir::new("export-uncalibrated");
    let output = dir.join("dataset");
    let adapter =
        ImageConversionAdapter::from_stack(two_timepoint_stack(), RangeMode::ComputeGlobal)
            .unwrap();
    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();

    let json = std::fs::read_to_string(output.join(MANIFEST_FILE)).unwrap();
    assert!(!json.contains("voxel_size"));
    let view = ExportedDataset::open(&output).unwrap().read_view(0, 0).unwrap();
    assert!(view.voxel_size.is_none());
}

#[test]
fn test_open_rejects_escaping_view_directory() {
    let dir = TestDir::new("export-escape");
    let output = dir.join("dataset");
    let adapter =
        ImageConversionAdapter::from_stack(two_timepoint_stack(), RangeMode::ComputeGlobal)
            .unwrap();
    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();

    let mut manifest = ExportManifest::load(&output).unwrap();
    manifest.views[1].directory = "../t0000_c00".to_string();
    // save does not validate, so the tampered manifest reaches disk
    manifest.save(&output).unwrap();

    assert!(matches!(
        ExportedDataset::open(&output),
        Err(ExportError::InvalidDataset(_))
    ));
}

#[test]
fn test_open_rejects_duplicate_view_entries() {
    let dir = TestDir::new("export-duplicate");
    let output = dir.join("dataset");
    let adapter =
        ImageConversionAdapter::from_stack(two_timepoint_stack(), RangeMode::ComputeGlobal)
            .unwrap();
    StackExporter::new(ExportOptions::default())
        .export(&adapter, &output)
        .unwrap();

    let mut manifest = ExportManifest::load(&output).unwrap();
    manifest.views[1].timepoint = 0;
    manifest.save(&output).unwrap();

    assert!(matches!(
        ExportedDataset::open(&output),
        Err(ExportError::InvalidDataset(_))
    ));
}
