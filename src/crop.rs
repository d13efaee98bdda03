//! Source-specific screenshot cropping.
//!
//! A raw full-page screenshot carries far more than the editorially
//! relevant region: archive chrome, navigation, ad wells, footers. Each
//! source has a layout rule — a [`CropStrategy`] — that slices the raster
//! down to its relevant band(s). The rules are calibrated pixel offsets,
//! configuration data rather than logic, kept in a [`CropRules`] table so
//! they can be overridden without touching the cropping algorithm.
//!
//! Cropping is pure pixel-coordinate slicing and never fails: a
//! single-region rule that reaches past the image bottom is clipped, and a
//! multi-region band that falls entirely outside the image is skipped.
//! Degradation is caught afterwards by [`CropStrategy::validate`], which
//! enforces the output geometry invariants; a validation failure is fatal
//! to the task and never retried, since re-cropping the same image cannot
//! change the outcome.

use image::imageops;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

use crate::error::CropError;

/// Standard output width across all sources.
pub const TARGET_WIDTH: u32 = 3000;

/// Minimum acceptable artifact height.
pub const MINIMUM_HEIGHT: u32 = 1000;

/// One named horizontal band, in source pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropRegion {
    pub top: u32,
    pub height: u32,
    pub label: String,
}

impl CropRegion {
    pub fn new(top: u32, height: u32, label: &str) -> Self {
        CropRegion {
            top,
            height,
            label: label.to_string(),
        }
    }
}

/// Metadata about one crop operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropMetadata {
    pub original_width: u32,
    pub original_height: u32,
    /// Labels of the bands that made it into the output, in stitch order.
    pub regions_cropped: Vec<String>,
    pub total_height: u32,
}

/// The final cropped image bytes with their dimensions.
#[derive(Debug, Clone)]
pub struct CroppedArtifact {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A per-source layout rule.
#[derive(Debug, Clone, PartialEq)]
pub enum CropStrategy {
    /// One horizontal band, clipped to the image bottom if it overruns.
    SingleRegion { top: u32, height: u32 },
    /// Named bands stitched vertically against a white canvas in
    /// declaration order; a band whose bottom edge exceeds the image is
    /// skipped rather than distorted.
    MultiRegion { bands: Vec<CropRegion> },
}

impl CropStrategy {
    /// Slice the editorially relevant region(s) out of a screenshot.
    /// Never fails; out-of-bounds geometry degrades by clipping or
    /// omission and is rejected later by [`CropStrategy::validate`].
    pub fn crop(&self, image: &RgbaImage) -> (RgbaImage, CropMetadata) {
        match self {
            CropStrategy::SingleRegion { top, height } => crop_single(image, *top, *height),
            CropStrategy::MultiRegion { bands } => crop_multi(image, bands),
        }
    }

    /// Geometry invariants, checked after every crop: output width equals
    /// the target width, output height meets the minimum, and for
    /// multi-region rules every declared band survived.
    pub fn validate(&self, cropped: &RgbaImage, metadata: &CropMetadata) -> Result<(), CropError> {
        if cropped.width() != TARGET_WIDTH {
            return Err(CropError::WidthMismatch {
                actual: cropped.width(),
                target: TARGET_WIDTH,
            });
        }
        if cropped.height() < MINIMUM_HEIGHT {
            return Err(CropError::BelowMinimumHeight {
                actual: cropped.height(),
                minimum: MINIMUM_HEIGHT,
            });
        }
        if let CropStrategy::MultiRegion { bands } = self {
            for band in bands {
                if !metadata.regions_cropped.iter().any(|l| l == &band.label) {
                    return Err(CropError::MissingRegion {
                        label: band.label.clone(),
                        image_height: metadata.original_height,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Horizontal centering bound: content is centered to the target width.
fn left_edge(full_width: u32) -> u32 {
    full_width.saturating_sub(TARGET_WIDTH) / 2
}

fn crop_single(image: &RgbaImage, top: u32, height: u32) -> (RgbaImage, CropMetadata) {
    let left = left_edge(image.width());
    let right = (left + TARGET_WIDTH).min(image.width());
    let top = top.min(image.height());
    let bottom = top.saturating_add(height).min(image.height());

    let cropped = imageops::crop_imm(image, left, top, right - left, bottom - top).to_image();
    let metadata = CropMetadata {
        original_width: image.width(),
        original_height: image.height(),
        regions_cropped: vec!["main_content".to_string()],
        total_height: cropped.height(),
    };
    (cropped, metadata)
}

fn crop_multi(image: &RgbaImage, bands: &[CropRegion]) -> (RgbaImage, CropMetadata) {
    let left = left_edge(image.width());
    let right = (left + TARGET_WIDTH).min(image.width());

    let mut slices = Vec::new();
    let mut labels = Vec::new();
    for band in bands {
        if band.top.saturating_add(band.height) > image.height() {
            debug!(
                label = %band.label,
                top = band.top,
                height = band.height,
                image_height = image.height(),
                "Band exceeds image bounds; skipping"
            );
            continue;
        }
        let slice = imageops::crop_imm(image, left, band.top, right - left, band.height).to_image();
        slices.push(slice);
        labels.push(band.label.clone());
    }

    let total_height: u32 = slices.iter().map(|s| s.height()).sum();
    let mut canvas = RgbaImage::from_pixel(TARGET_WIDTH, total_height, Rgba([255, 255, 255, 255]));
    let mut y: i64 = 0;
    for slice in &slices {
        imageops::replace(&mut canvas, slice, 0, y);
        y += i64::from(slice.height());
    }

    let metadata = CropMetadata {
        original_width: image.width(),
        original_height: image.height(),
        regions_cropped: labels,
        total_height,
    };
    (canvas, metadata)
}

/// Encode a validated crop as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CropError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Per-source layout rules, keyed by source short id.
///
/// The defaults carry the calibrated offsets for each tracked source's
/// observed page layout. Entries can be replaced at runtime without
/// touching the cropping algorithm.
#[derive(Debug, Clone)]
pub struct CropRules {
    rules: HashMap<String, CropStrategy>,
}

impl Default for CropRules {
    fn default() -> Self {
        let mut rules = HashMap::new();
        // Header/navigation ends at 552px; main content runs 2000px below.
        rules.insert(
            "cnn".to_string(),
            CropStrategy::SingleRegion {
                top: 552,
                height: 2000,
            },
        );
        // Header/navigation ends at 710px.
        rules.insert(
            "nytimes".to_string(),
            CropStrategy::SingleRegion {
                top: 710,
                height: 2000,
            },
        );
        // Header, nav, and ads end at 810px.
        rules.insert(
            "washingtonpost".to_string(),
            CropStrategy::SingleRegion {
                top: 810,
                height: 1900,
            },
        );
        // Header band at 195-395px, then main content from 1080px; the ad
        // well between them is dropped.
        rules.insert(
            "foxnews".to_string(),
            CropStrategy::MultiRegion {
                bands: vec![
                    CropRegion::new(195, 200, "header"),
                    CropRegion::new(1080, 2000, "main_content"),
                ],
            },
        );
        // Navigation at 130-287px, a 575px ad well dropped, main content
        // from 862px.
        rules.insert(
            "usatoday".to_string(),
            CropStrategy::MultiRegion {
                bands: vec![
                    CropRegion::new(130, 157, "navigation"),
                    CropRegion::new(862, 1800, "main_content"),
                ],
            },
        );
        CropRules { rules }
    }
}

impl CropRules {
    pub fn strategy_for(&self, short_id: &str) -> Option<&CropStrategy> {
        self.rules.get(short_id)
    }

    /// Replace or add the rule for one source.
    pub fn set(&mut self, short_id: &str, strategy: CropStrategy) {
        self.rules.insert(short_id.to_string(), strategy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn test_single_region_output_width_is_target() {
        let img = image(3400, 400);
        let strategy = CropStrategy::SingleRegion {
            top: 50,
            height: 300,
        };
        let (cropped, metadata) = strategy.crop(&img);
        assert_eq!(cropped.width(), TARGET_WIDTH);
        assert_eq!(cropped.height(), 300);
        assert_eq!(metadata.regions_cropped, vec!["main_content"]);
        assert_eq!(metadata.original_width, 3400);
    }

    #[test]
    fn test_single_region_clips_to_image_bottom() {
        let img = image(3000, 200);
        let strategy = CropStrategy::SingleRegion {
            top: 150,
            height: 500,
        };
        let (cropped, _) = strategy.crop(&img);
        assert_eq!(cropped.height(), 50);
    }

    #[test]
    fn test_single_region_fully_out_of_bounds_yields_empty_band() {
        let img = image(3000, 100);
        let strategy = CropStrategy::SingleRegion {
            top: 400,
            height: 500,
        };
        let (cropped, metadata) = strategy.crop(&img);
        assert_eq!(cropped.height(), 0);
        assert!(matches!(
            strategy.validate(&cropped, &metadata),
            Err(CropError::BelowMinimumHeight { .. })
        ));
    }

    #[test]
    fn test_multi_region_stitches_surviving_bands_in_order() {
        let img = image(3000, 3200);
        let strategy = CropStrategy::MultiRegion {
            bands: vec![
                CropRegion::new(0, 400, "navigation"),
                CropRegion::new(1000, 700, "main_content"),
            ],
        };
        let (cropped, metadata) = strategy.crop(&img);
        assert_eq!(cropped.width(), TARGET_WIDTH);
        assert_eq!(cropped.height(), 1100);
        assert_eq!(metadata.total_height, 1100);
        assert_eq!(metadata.regions_cropped, vec!["navigation", "main_content"]);
        assert!(strategy.validate(&cropped, &metadata).is_ok());
    }

    #[test]
    fn test_multi_region_skips_band_past_image_bounds() {
        let img = image(3000, 1600);
        let strategy = CropStrategy::MultiRegion {
            bands: vec![
                CropRegion::new(0, 1200, "header"),
                CropRegion::new(1500, 500, "main_content"),
            ],
        };
        let (cropped, metadata) = strategy.crop(&img);
        // Only the header band fits; output height is the sum of survivors.
        assert_eq!(cropped.height(), 1200);
        assert_eq!(metadata.regions_cropped, vec!["header"]);
        let err = strategy.validate(&cropped, &metadata).unwrap_err();
        assert!(matches!(err, CropError::MissingRegion { ref label, .. } if label == "main_content"));
    }

    #[test]
    fn test_narrow_image_fails_width_validation() {
        let img = image(2000, 1600);
        let strategy = CropStrategy::SingleRegion {
            top: 0,
            height: 1500,
        };
        let (cropped, metadata) = strategy.crop(&img);
        assert!(matches!(
            strategy.validate(&cropped, &metadata),
            Err(CropError::WidthMismatch { actual: 2000, .. })
        ));
    }

    #[test]
    fn test_wide_image_is_centered() {
        let mut img = image(3400, 100);
        // Mark the pixel at x=200 (the left crop edge for a 3400px image).
        img.put_pixel(200, 0, Rgba([255, 0, 0, 255]));
        let strategy = CropStrategy::SingleRegion { top: 0, height: 100 };
        let (cropped, _) = strategy.crop(&img);
        assert_eq!(*cropped.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_is_idempotent_slicing() {
        let img = image(3200, 2000);
        let strategy = CropStrategy::SingleRegion {
            top: 100,
            height: 1500,
        };
        let (first, _) = strategy.crop(&img);
        let (second, _) = strategy.crop(&img);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_encode_png_round_trips_dimensions() {
        let img = image(300, 120);
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 300);
        assert_eq!(decoded.height(), 120);
    }

    #[test]
    fn test_default_rules_cover_the_catalog() {
        let rules = CropRules::default();
        for source in crate::sources::catalog() {
            assert!(
                rules.strategy_for(source.short_id).is_some(),
                "missing crop rule for {}",
                source.short_id
            );
        }
        assert!(rules.strategy_for("unknown").is_none());
    }

    #[test]
    fn test_default_rules_carry_calibrated_offsets() {
        let rules = CropRules::default();
        assert_eq!(
            rules.strategy_for("cnn"),
            Some(&CropStrategy::SingleRegion {
                top: 552,
                height: 2000
            })
        );
        match rules.strategy_for("usatoday") {
            Some(CropStrategy::MultiRegion { bands }) => {
                assert_eq!(bands[0].label, "navigation");
                assert_eq!(bands[1].top, 862);
            }
            other => panic!("unexpected usatoday rule: {other:?}"),
        }
    }

    #[test]
    fn test_rules_are_overridable() {
        let mut rules = CropRules::default();
        rules.set(
            "cnn",
            CropStrategy::SingleRegion {
                top: 600,
                height: 1800,
            },
        );
        assert_eq!(
            rules.strategy_for("cnn"),
            Some(&CropStrategy::SingleRegion {
                top: 600,
                height: 1800
            })
        );
    }
}
