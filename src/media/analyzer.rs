//! MediaAnalyzer (spec §4.14): download with a max-bytes cap, decode via
//! `image`, record dimensions/dominant-colors/perceptual-hash. Any failure
//! yields `None` rather than propagating, so the caller marks the item
//! processed without a retry loop.

use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedMedia {
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pub dominant_colors: Vec<(u8, u8, u8)>,
    pub perceptual_hash: u64,
}

pub struct MediaAnalyzer {
    client: reqwest::Client,
    max_bytes: u64,
    k: usize,
    timeout: Duration,
}

impl MediaAnalyzer {
    pub fn new(max_bytes: u64, k: usize, timeout_ms: u64) -> Self {
        Self { client: reqwest::Client::new(), max_bytes, k, timeout: Duration::from_millis(timeout_ms) }
    }

    /// `is_processed = true` is the caller's responsibility regardless of
    /// the return value (spec §4.14): a `None` here still means "don't
    /// retry this indefinitely", not "try again".
    pub async fn analyze(&self, url: &str) -> Option<AnalyzedMedia> {
        let bytes = self.download(url).await.ok()?;
        let img = image::load_from_memory(&bytes).ok()?;
        Some(AnalyzedMedia {
            width: img.width(),
            height: img.height(),
            byte_size: bytes.len() as u64,
            dominant_colors: dominant_colors(&img, self.k),
            perceptual_hash: difference_hash(&img),
        })
    }

    async fn download(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        if let Some(len) = response.content_length() {
            anyhow::ensure!(len <= self.max_bytes, "media exceeds max_bytes: {len}");
        }
        let bytes = response.bytes().await?;
        anyhow::ensure!(bytes.len() as u64 <= self.max_bytes, "media exceeds max_bytes after download");
        Ok(bytes.to_vec())
    }
}

/// Naive k-means over a 64x64 thumbnail, fixed iteration count and
/// deterministic centroid seeding so the result is reproducible.
fn dominant_colors(img: &DynamicImage, k: usize) -> Vec<(u8, u8, u8)> {
    let thumb = img.resize(64, 64, FilterType::Nearest).to_rgb8();
    let pixels: Vec<[f32; 3]> = thumb.pixels().map(|p| [p[0] as f32, p[1] as f32, p[2] as f32]).collect();
    if pixels.is_empty() {
        return Vec::new();
    }
    let k = k.min(pixels.len()).max(1);
    let stride = (pixels.len() / k).max(1);
    let mut centroids: Vec<[f32; 3]> = pixels.iter().step_by(stride).take(k).copied().collect();

    for _ in 0..10 {
        let mut sums = vec![[0f32; 3]; centroids.len()];
        let mut counts = vec![0u32; centroids.len()];
        for pixel in &pixels {
            let nearest = centroids
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| squared_dist(a, pixel).partial_cmp(&squared_dist(b, pixel)).unwrap())
                .map(|(idx, _)| idx)
                .unwrap();
            for channel in 0..3 {
                sums[nearest][channel] += pixel[channel];
            }
            counts[nearest] += 1;
        }
        for i in 0..centroids.len() {
            if counts[i] > 0 {
                for channel in 0..3 {
                    centroids[i][channel] = sums[i][channel] / counts[i] as f32;
                }
            }
        }
    }

    centroids.into_iter().map(|c| (c[0].round() as u8, c[1].round() as u8, c[2].round() as u8)).collect()
}

fn squared_dist(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Difference hash over a downscaled 9x8 grayscale buffer (no crate beyond
/// `image`, per spec §4.14).
fn difference_hash(img: &DynamicImage) -> u64 {
    let small = img.resize_exact(9, 8, FilterType::Triangle).to_luma8();
    let mut hash = 0u64;
    let mut bit = 0;
    for y in 0..8 {
        for x in 0..8 {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            if left > right {
                hash |= 1 << bit;
            }
            bit += 1;
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid_image(color: [u8; 3]) -> DynamicImage {
        let img = RgbImage::from_fn(32, 32, |_, _| Rgb(color));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn dominant_colors_of_a_solid_image_converge_to_that_color() {
        let img = solid_image([200, 50, 10]);
        let colors = dominant_colors(&img, 5);
        assert!(colors.iter().all(|(r, g, b)| *r == 200 && *g == 50 && *b == 10));
    }

    #[test]
    fn difference_hash_is_deterministic() {
        let img = solid_image([100, 100, 100]);
        assert_eq!(difference_hash(&img), difference_hash(&img));
    }

    #[test]
    fn difference_hash_of_flat_image_has_no_set_bits() {
        let img = solid_image([128, 128, 128]);
        assert_eq!(difference_hash(&img), 0);
    }
}
