//! Image preparation and output post-processing for the classifier.
//!
//! The input contract matches the training pipeline: 224×224 RGB,
//! CHW float planes standardised with the ImageNet per-channel
//! mean/std. Resizing is exact (aspect ratio ignored), as at training
//! time.

use image::RgbImage;
use image::imageops::FilterType;

/// Square input edge the network was trained on.
pub const INPUT_SIZE: u32 = 224;

/// Per-channel normalisation constants (ImageNet convention).
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode an uploaded payload into an RGB image.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Resize to the training resolution and standardise into CHW float
/// planes, ready for a batch-of-one tensor.
pub fn to_input_planes(img: &RgbImage) -> Vec<f32> {
    let resized = image::imageops::resize(img, INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
    let mut planes = Vec::with_capacity(3 * plane);
    for c in 0..3 {
        let (mean, std) = (CHANNEL_MEAN[c], CHANNEL_STD[c]);
        for pixel in resized.pixels() {
            planes.push((pixel[c] as f32 / 255.0 - mean) / std);
        }
    }
    planes
}

/// Numerically-stable softmax over a logit vector.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest element; ties keep the first index.
pub fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in probs.iter().enumerate() {
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((i, p)),
        }
    }
    best
}
