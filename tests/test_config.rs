//! Loading pipeline configuration from JSON.

mod common;

use common::*;
use std::io::Write;

fn write_config(contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn thresholds_from_file_change_the_outcome() -> anyhow::Result<()> {
    let file = write_config(r#"{ "thresholds": { "area_min": 500.0 } }"#)?;
    let config = LightBarConfig::from_json_file(file.path())?;
    assert_eq!(config.thresholds.area_min, 500.0);

    // 6x30 bar has a polygon area well below 500
    let img = frame_with_rect(40, 30, 6, 30, RED);
    let detection = LightBarPipeline::from_config(&config)?.detect(&img)?;
    assert!(detection.candidates.is_empty());
    Ok(())
}

#[test]
fn disabling_blue_leaves_only_red() -> anyhow::Result<()> {
    // An impossible saturation band switches blue off entirely
    let file = write_config(
        r#"{ "blue_range": { "lower": { "h": 100, "s": 255, "v": 255 },
                             "upper": { "h": 100, "s": 255, "v": 255 } } }"#,
    )?;
    let config = LightBarConfig::from_json_file(file.path())?;

    let mut img = background_frame(100, 100);
    fill_rect(&mut img, 20, 20, 6, 30, RED);
    fill_rect(&mut img, 70, 40, 8, 40, BLUE);

    let detection = LightBarPipeline::from_config(&config)?.detect(&img)?;
    assert_eq!(detection.candidates.len(), 1);
    assert_eq!(detection.candidates[0].bounding_box.x, 20);
    Ok(())
}

#[test]
fn invalid_values_are_rejected_on_load() -> anyhow::Result<()> {
    let file = write_config(r#"{ "structuring_element_size": 2 }"#)?;
    let err = LightBarConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, DetectionError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn malformed_json_reports_parse_error() -> anyhow::Result<()> {
    let file = write_config("{ not json")?;
    let err = LightBarConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, DetectionError::ConfigParse { .. }));
    Ok(())
}

#[test]
fn missing_file_reports_io_error() {
    let err = LightBarConfig::from_json_file(std::path::Path::new("/nonexistent/lightbars.json"))
        .unwrap_err();
    assert!(matches!(err, DetectionError::ConfigIo { .. }));
}

#[test]
fn pipeline_rejects_invalid_config() {
    let mut config = LightBarConfig::default();
    config.thresholds.aspect_ratio_min = 9.0;
    assert!(LightBarPipeline::from_config(&config).is_err());
}
