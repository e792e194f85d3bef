//! Sprite Color Module
//! Derives a representative fill color from sprite image bytes.

use std::collections::HashMap;

use super::resolver::SpriteError;

/// Most frequent RGB value in the image, as `#rrggbb`.
///
/// Alpha is ignored, so fully transparent pixels count as whatever RGB they
/// carry (black in PokeAPI sprites). Ties break toward the numerically
/// larger triple to keep the result deterministic. A pure black winner is
/// assumed to be the background and yields the runner-up instead, when one
/// exists.
pub fn dominant_color(bytes: &[u8]) -> Result<String, SpriteError> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba8();

    let mut counts: HashMap<[u8; 3], u64> = HashMap::new();
    for pixel in rgba.pixels() {
        let [r, g, b, _] = pixel.0;
        *counts.entry([r, g, b]).or_insert(0) += 1;
    }

    let mut ordered: Vec<([u8; 3], u64)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

    let rgb = match ordered.last() {
        Some(&([0, 0, 0], _)) if ordered.len() > 1 => ordered[ordered.len() - 2].0,
        Some(&(rgb, _)) => rgb,
        None => [0, 0, 0],
    };
    Ok(format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// 10x10 image with the first `first_rows` rows in one color and the
    /// rest in another.
    fn two_tone(first_rows: u32, top: [u8; 4], bottom: [u8; 4]) -> Vec<u8> {
        png_bytes(RgbaImage::from_fn(10, 10, |_, y| {
            if y < first_rows {
                Rgba(top)
            } else {
                Rgba(bottom)
            }
        }))
    }

    #[test]
    fn majority_color_wins() {
        let bytes = two_tone(9, [255, 0, 0, 255], [0, 0, 0, 255]);
        assert_eq!(dominant_color(&bytes).unwrap(), "#ff0000");
    }

    #[test]
    fn black_winner_yields_runner_up() {
        let bytes = two_tone(9, [0, 0, 0, 255], [60, 120, 180, 255]);
        assert_eq!(dominant_color(&bytes).unwrap(), "#3c78b4");
    }

    #[test]
    fn all_black_image_stays_black() {
        let bytes = two_tone(10, [0, 0, 0, 255], [0, 0, 0, 255]);
        assert_eq!(dominant_color(&bytes).unwrap(), "#000000");
    }

    #[test]
    fn transparent_background_counts_as_black() {
        // Transparent-black majority loses to the visible color.
        let bytes = two_tone(9, [0, 0, 0, 0], [200, 40, 40, 255]);
        assert_eq!(dominant_color(&bytes).unwrap(), "#c82828");
    }

    #[test]
    fn result_is_deterministic() {
        let bytes = two_tone(5, [10, 20, 30, 255], [40, 50, 60, 255]);
        let first = dominant_color(&bytes).unwrap();
        for _ in 0..10 {
            assert_eq!(dominant_color(&bytes).unwrap(), first);
        }
        // Exact tie: the numerically larger triple wins.
        assert_eq!(first, "#28323c");
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(matches!(
            dominant_color(b"not an image"),
            Err(SpriteError::InvalidImage(_))
        ));
    }
}
