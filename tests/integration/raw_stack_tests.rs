//! Raw stack integration tests.
//!
//! Tests verify:
//! - Descriptor loading with relative data files
//! - Hyperstack plane order and both byte orders
//! - Header offsets
//! - Rejection of truncated data files and invalid descriptors

use stack_export::convert::{ImageConversionAdapter, IntensityRange, RangeMode};
use stack_export::error::FormatError;
use stack_export::stack::{ByteOrder, ImageStack, RawStack, SampleType, VoxelSize};

use super::test_utils::{encode_planes, write_raw_stack, TestDir};

/// Planes of a 3x2 stack, plane `p` filled with `(p + 1) * 100`.
fn numbered_planes(count: usize) -> Vec<Vec<u16>> {
    (0..count)
        .map(|p| vec![((p + 1) * 100) as u16; 6])
        .collect()
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn test_big_endian_hyperstack_through_adapter() {
    let dir = TestDir::new("raw-be");
    let data = encode_planes(&numbered_planes(4), ByteOrder::BigEndian);
    let descriptor = write_raw_stack(
        dir.path(),
        "embryo",
        r#""name": "embryo", "width": 3, "height": 2, "depth": 2, "channels": 2,
           "sample_type": "gray16", "byte_order": "big_endian",
           "voxel_size": { "unit": "um", "x": 0.5, "y": 0.5, "z": 2.0 }"#,
        &data,
    );

    let stack = RawStack::open(&descriptor).unwrap();
    assert_eq!(stack.identifier(), "embryo");
    assert_eq!(stack.sample_type(), SampleType::Gray16);
    assert_eq!(stack.num_timepoints(), 1);
    assert_eq!(stack.num_channels(), 2);
    assert!(stack.source_identifier().ends_with("embryo.raw"));
    assert_eq!(stack.voxel_size(), Some(&VoxelSize::new("um", 0.5, 0.5, 2.0)));

    let adapter = ImageConversionAdapter::from_stack(stack, RangeMode::ComputeGlobal).unwrap();
    assert_eq!(adapter.intensity_range(), IntensityRange::new(100.0, 400.0));

    // Channel 1 holds planes 1 (z = 0) and 3 (z = 1)
    let view = adapter.get_view(0, 1).unwrap();
    assert_eq!(view.dim(), (2, 2, 3));
    // (200 - 100) / 300 * 65535 = 21845
    assert!(view.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 21845));
    assert!(view.index_axis(ndarray::Axis(0), 1).iter().all(|&v| v == 65535));

    let view = adapter.get_view(0, 0).unwrap();
    assert!(view.index_axis(ndarray::Axis(0), 0).iter().all(|&v| v == 0));
}

#[test]
fn test_float_stack_with_header_offset() {
    let dir = TestDir::new("raw-float");
    let mut data = vec![0xAB; 16];
    data.extend(encode_planes(
        &[vec![0.5f32, -0.5], vec![1.5f32, 2.5]],
        ByteOrder::LittleEndian,
    ));
    let descriptor = write_raw_stack(
        dir.path(),
        "float",
        r#""width": 2, "height": 1, "timepoints": 2, "sample_type": "gray32",
           "header_offset": 16, "display_range": [-0.5, 2.5]"#,
        &data,
    );

    let stack = RawStack::open(&descriptor).unwrap();
    assert_eq!(stack.identifier(), "float");
    assert_eq!(stack.display_range(), (-0.5, 2.5));

    let adapter =
        ImageConversionAdapter::create_gray32(stack, RangeMode::TakeFromSourceDisplayRange)
            .unwrap();
    let t0 = adapter.get_view(0, 0).unwrap();
    // (0.5 + 0.5) / 3 * 65535 = 21845
    assert_eq!(t0.as_slice().unwrap(), &[21845, 0]);
    let t1 = adapter.get_view(1, 0).unwrap();
    assert_eq!(t1.as_slice().unwrap(), &[43690, 65535]);
}

#[test]
fn test_gray8_ignores_byte_order() {
    let dir = TestDir::new("raw-u8");
    let descriptor = write_raw_stack(
        dir.path(),
        "bytes",
        r#""width": 4, "height": 1, "sample_type": "gray8", "byte_order": "big_endian""#,
        &[0, 85, 170, 255],
    );

    let stack = RawStack::open(&descriptor).unwrap();
    let adapter = ImageConversionAdapter::create_gray8(stack, RangeMode::ComputeGlobal).unwrap();
    let view = adapter.get_view(0, 0).unwrap();
    assert_eq!(view.as_slice().unwrap(), &[0, 21845, 43690, 65535]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_truncated_data_file() {
    let dir = TestDir::new("raw-short");
    let data = encode_planes(&numbered_planes(3), ByteOrder::LittleEndian);
    let descriptor = write_raw_stack(
        dir.path(),
        "short",
        r#""width": 3, "height": 2, "depth": 2, "channels": 2, "sample_type": "gray16""#,
        &data,
    );

    match RawStack::open(&descriptor) {
        Err(FormatError::DataFileTooSmall { required, actual }) => {
            assert_eq!(required, 48);
            assert_eq!(actual, 36);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a truncated data file error"),
    }
}

#[test]
fn test_zero_dimension_rejected() {
    let dir = TestDir::new("raw-zero");
    let descriptor = write_raw_stack(
        dir.path(),
        "zero",
        r#""width": 3, "height": 2, "depth": 0, "sample_type": "gray16""#,
        &[0; 12],
    );

    assert!(matches!(
        RawStack::open(&descriptor),
        Err(FormatError::InvalidField { field: "depth", .. })
    ));
}

#[test]
fn test_missing_data_file() {
    let dir = TestDir::new("raw-missing");
    let descriptor = write_raw_stack(
        dir.path(),
        "missing",
        r#""width": 1, "height": 1, "sample_type": "gray8""#,
        &[1],
    );
    std::fs::remove_file(dir.join("missing.raw")).unwrap();

    assert!(matches!(
        RawStack::open(&descriptor),
        Err(FormatError::Io(_))
    ));
}

#[test]
fn test_malformed_descriptor() {
    let dir = TestDir::new("raw-bad");
    let path = dir.join("bad.json");
    std::fs::write(&path, r#"{ "width": 3, "sample_type": "rgb" }"#).unwrap();

    assert!(matches!(
        RawStack::open(&path),
        Err(FormatError::InvalidDescriptor(_))
    ));
}
