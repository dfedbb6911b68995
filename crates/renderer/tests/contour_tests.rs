//! Tests for contour level picking, leveling and label placement.

use renderer::contour::{
    collect_label_positions, format_sig3, pick_levels, roman_numeral, to_display_units,
    ContourEngine, LabelLayout, LevelKind, LevelSpacing,
};
use renderer::palette::{ColorPalette, Rgb};
use shake_common::Imt;
use test_utils::{assert_approx_eq, create_constant_grid, create_mmi_bowl};

fn engine(sigma: f64) -> ContourEngine {
    ContourEngine::builder()
        .palette(ColorPalette::mmi())
        .smoothing_sigma(sigma)
        .build()
        .unwrap()
}

// ============================================================================
// pick_levels tests
// ============================================================================

#[test]
fn test_linear_levels_are_half_units() {
    let levels = pick_levels(2.3, 7.8, LevelSpacing::Linear);
    assert_eq!(
        levels,
        vec![2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5]
    );
}

#[test]
fn test_linear_levels_include_bounds() {
    let levels = pick_levels(3.0, 4.0, LevelSpacing::Linear);
    assert_eq!(levels, vec![3.0, 3.5, 4.0]);
}

#[test]
fn test_log_levels_one_two_five() {
    let levels = pick_levels(0.5, 60.0, LevelSpacing::Logarithmic);
    assert_eq!(levels, vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0]);
}

#[test]
fn test_log_levels_exclude_endpoints() {
    let levels = pick_levels(1.0, 20.0, LevelSpacing::Logarithmic);
    assert_eq!(levels, vec![2.0, 5.0, 10.0]);
}

#[test]
fn test_log_levels_fall_back_to_midpoint() {
    let levels = pick_levels(2.2, 4.0, LevelSpacing::Logarithmic);
    assert_eq!(levels.len(), 1);
    assert_approx_eq!(levels[0], 3.1, 1e-12);
    assert_eq!(pick_levels(2000.0, 2000.0, LevelSpacing::Logarithmic), vec![2000.0]);
}

#[test]
fn test_log_levels_non_positive_minimum() {
    let levels = pick_levels(0.0, 15.0, LevelSpacing::Logarithmic);
    // Three decades below the upper decade of 100.
    assert_approx_eq!(levels[0], 0.1, 1e-12);
    assert_eq!(levels.last().copied(), Some(10.0));
}

#[test]
fn test_invalid_range_has_no_levels() {
    assert!(pick_levels(f64::NAN, 3.0, LevelSpacing::Linear).is_empty());
    assert!(pick_levels(5.0, 3.0, LevelSpacing::Logarithmic).is_empty());
}

// ============================================================================
// Label text tests
// ============================================================================

#[test]
fn test_roman_numerals() {
    assert_eq!(roman_numeral(1.0), Some("I"));
    assert_eq!(roman_numeral(4.0), Some("IV"));
    assert_eq!(roman_numeral(10.0), Some("X"));
    assert_eq!(roman_numeral(0.0), None);
    assert_eq!(roman_numeral(4.5), None);
}

#[test]
fn test_format_sig3() {
    assert_eq!(format_sig3(2.0), "2");
    assert_eq!(format_sig3(0.5), "0.5");
    assert_eq!(format_sig3(12.345), "12.3");
    assert_eq!(format_sig3(150.0), "150");
    assert_eq!(format_sig3(2000.0), "2e+03");
    assert_eq!(format_sig3(0.00002), "2e-05");
}

// ============================================================================
// ContourEngine tests
// ============================================================================

#[test]
fn test_mmi_level_kinds() {
    let data = create_mmi_bowl(41, 41, 7.8, 2.3);
    let set = engine(0.0).build_contours(&data, 41, 41, &Imt::Mmi).unwrap();

    let values: Vec<f64> = set.levels.iter().map(|l| l.value).collect();
    assert_eq!(values.first().copied(), Some(2.5));
    assert_eq!(values.last().copied(), Some(7.5));

    let whole: Vec<&str> = set
        .levels
        .iter()
        .filter(|l| l.kind == LevelKind::WholeUnit)
        .filter_map(|l| l.label.as_deref())
        .collect();
    assert_eq!(whole, vec!["III", "IV", "V", "VI", "VII"]);

    let five_half = set.levels.iter().find(|l| l.value == 5.5).unwrap();
    assert_eq!(five_half.kind, LevelKind::HalfUnit);
    assert!(five_half.label.is_none());
    assert!(five_half.is_stroked());
    assert_eq!(five_half.color, ColorPalette::mmi().color_at(5.5));

    let five = set.levels.iter().find(|l| l.value == 5.0).unwrap();
    assert!(!five.is_stroked());
}

#[test]
fn test_mmi_lines_are_rings_around_peak() {
    let data = create_mmi_bowl(41, 41, 7.8, 2.3);
    let set = engine(0.0).build_contours(&data, 41, 41, &Imt::Mmi).unwrap();
    let level = set.levels.iter().find(|l| l.value == 6.5).unwrap();
    let lines: Vec<_> = set.lines_at(level).collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].closed);
}

#[test]
fn test_measure_levels_are_white_and_labelled() {
    let ln20 = 20f64.ln();
    let stored = create_constant_grid(10, 10, ln20);
    let data = to_display_units(&stored, &Imt::Pga);
    assert_approx_eq!(data[0], 2000.0, 1e-9);

    let set = engine(5.0).build_contours(&data, 10, 10, &Imt::Pga).unwrap();
    assert_eq!(set.levels.len(), 1);
    assert_approx_eq!(set.levels[0].value, 2000.0, 1e-6);
    assert_eq!(set.levels[0].kind, LevelKind::Measure);
    assert_eq!(set.levels[0].label.as_deref(), Some("2e+03"));
    assert_eq!(set.levels[0].color, Rgb::WHITE);
}

#[test]
fn test_smoothing_narrows_range() {
    let data = create_mmi_bowl(31, 31, 8.0, 2.0);
    let raw = engine(0.0).build_contours(&data, 31, 31, &Imt::Mmi).unwrap();
    let smooth = engine(5.0).build_contours(&data, 31, 31, &Imt::Mmi).unwrap();
    assert!(smooth.data_range.1 < raw.data_range.1);
    assert!(smooth.data_range.0 > raw.data_range.0);
}

#[test]
fn test_grid_points_map_onto_whole_map() {
    let data = create_mmi_bowl(11, 21, 6.0, 3.0);
    let set = engine(0.0).build_contours(&data, 11, 21, &Imt::Mmi).unwrap();
    let corner = set.to_map(renderer::contour::Point::new(0.0, 0.0), 1000.0, 2000.0);
    assert_eq!(corner, (0.0, 2000.0));
    let corner = set.to_map(renderer::contour::Point::new(10.0, 20.0), 1000.0, 2000.0);
    assert_eq!(corner, (1000.0, 0.0));
}

#[test]
fn test_bad_dimensions_rejected() {
    let result = engine(0.0).build_contours(&[1.0, 2.0, 3.0], 2, 2, &Imt::Mmi);
    assert!(result.is_err());
}

// ============================================================================
// Label placement tests
// ============================================================================

#[test]
fn test_labels_spaced_along_line() {
    let line: Vec<(f64, f64)> = (0..=50).map(|i| (i as f64 * 10.0, 250.0)).collect();
    let layout = LabelLayout {
        spacing: 150.0,
        font_size: 8.0,
        bounds: [0.0, 0.0, 500.0, 500.0],
    };
    let mut positions = Vec::new();
    collect_label_positions(&line, "10", &layout, &mut positions);
    assert_eq!(positions.len(), 3);
    for pos in &positions {
        assert_eq!(pos.y, 250.0);
        assert_eq!(pos.angle, 0.0);
        assert_eq!(pos.text, "10");
    }
}

#[test]
fn test_labels_kept_upright() {
    let line: Vec<(f64, f64)> = (0..=50).rev().map(|i| (i as f64 * 10.0, 250.0)).collect();
    let layout = LabelLayout {
        spacing: 150.0,
        font_size: 8.0,
        bounds: [0.0, 0.0, 500.0, 500.0],
    };
    let mut positions = Vec::new();
    collect_label_positions(&line, "x", &layout, &mut positions);
    assert!(!positions.is_empty());
    for pos in &positions {
        assert!(pos.angle.cos() > 0.0);
    }
}

#[test]
fn test_short_line_gets_no_label() {
    let layout = LabelLayout {
        spacing: 150.0,
        font_size: 8.0,
        bounds: [0.0, 0.0, 500.0, 500.0],
    };
    let mut positions = Vec::new();
    collect_label_positions(&[(100.0, 100.0), (120.0, 100.0)], "x", &layout, &mut positions);
    assert!(positions.is_empty());
}
