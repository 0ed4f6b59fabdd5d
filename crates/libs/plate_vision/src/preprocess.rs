use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::median_filter;

/// Crops narrower than this are upscaled before OCR; tiny plate crops carry
/// too few pixels per character for the recognition model.
const MIN_OCR_WIDTH: u32 = 160;

/// Deterministic OCR preprocessing: grayscale, Otsu binarization to
/// black-on-white, and a small median filter to knock out speckle noise.
///
/// Raw crops straight from a detection box are usually too noisy for the OCR
/// engine's defaults, so this transform is part of the reader contract.
#[must_use]
pub fn preprocess_crop(crop: &RgbImage) -> GrayImage {
    let gray = DynamicImage::ImageRgb8(crop.clone()).to_luma8();

    let gray = if gray.width() < MIN_OCR_WIDTH && gray.width() > 0 {
        let factor = MIN_OCR_WIDTH.div_ceil(gray.width());
        image::imageops::resize(
            &gray,
            gray.width() * factor,
            gray.height() * factor,
            FilterType::CatmullRom,
        )
    } else {
        gray
    };

    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);
    median_filter(&binary, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn plate_like_crop() -> RgbImage {
        // Light background with a dark band, so Otsu has two classes to split.
        RgbImage::from_fn(60, 20, |x, _| {
            if (20..40).contains(&x) {
                Rgb([30, 30, 30])
            } else {
                Rgb([220, 220, 220])
            }
        })
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let crop = plate_like_crop();
        assert_eq!(preprocess_crop(&crop), preprocess_crop(&crop));
    }

    #[test]
    fn small_crops_are_upscaled() {
        let crop = plate_like_crop();
        let processed = preprocess_crop(&crop);
        assert!(processed.width() >= MIN_OCR_WIDTH);
    }

    #[test]
    fn output_is_binary() {
        let processed = preprocess_crop(&plate_like_crop());
        assert!(processed.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
}
