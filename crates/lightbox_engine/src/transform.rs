use std::io::Cursor;

use crate::TransformError;

/// Turns raw photo bytes into the derived display artifact. CPU-bound; the
/// engine runs it on the blocking pool.
pub trait Transformer: Send + Sync {
    fn transform(&self, raw: &[u8]) -> Result<Vec<u8>, TransformError>;
}

/// Applies the classic sepia matrix and re-encodes as PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SepiaTransformer;

impl Transformer for SepiaTransformer {
    fn transform(&self, raw: &[u8]) -> Result<Vec<u8>, TransformError> {
        let decoded = image::load_from_memory(raw)
            .map_err(|err| TransformError::Decode(err.to_string()))?;
        let mut rgba = decoded.into_rgba8();

        for pixel in rgba.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
            pixel.0 = [
                (0.393 * r + 0.769 * g + 0.189 * b).min(255.0) as u8,
                (0.349 * r + 0.686 * g + 0.168 * b).min(255.0) as u8,
                (0.272 * r + 0.534 * g + 0.131 * b).min(255.0) as u8,
                a,
            ];
        }

        let mut out = Cursor::new(Vec::new());
        rgba.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|err| TransformError::Encode(err.to_string()))?;
        Ok(out.into_inner())
    }
}
