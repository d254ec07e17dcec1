use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{MAX_RASTER_EDGE, Resolution};
use crate::foundation::error::{TextBlendError, TextBlendResult};
use crate::foundation::math::{gcd, mul_div255_u8};

/// Decoded base photo, premultiplied RGBA8 plus a ready-to-paint raster.
#[derive(Clone)]
pub struct BaseImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

impl BaseImage {
    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> TextBlendResult<Self> {
        let res = Resolution::new(width, height).map_err(|e| TextBlendError::decode(e.to_string()))?;
        if rgba8.len() != res.pixel_count() * 4 {
            return Err(TextBlendError::decode(format!(
                "image byte length {} does not match {}x{}",
                rgba8.len(),
                width,
                height
            )));
        }
        premultiply_rgba8_in_place(&mut rgba8);
        let pixmap = pixmap_from_premul_bytes(&rgba8, width, height)?;
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8),
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub(crate) fn paint(&self) -> &vello_cpu::Image {
        &self.paint
    }

    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            aspect_ratio: aspect_ratio(self.width, self.height),
        }
    }
}

impl std::fmt::Debug for BaseImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Natural dimensions of a base photo as reported to users.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: String,
}

/// Decode PNG/JPEG/WebP/... bytes into a [`BaseImage`].
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> TextBlendResult<BaseImage> {
    let dyn_img = decode_oriented(bytes)
        .context("decode image from memory")
        .map_err(|e| TextBlendError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.into_rgba8();
    let (width, height) = rgba.dimensions();
    if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
        return Err(TextBlendError::decode(format!(
            "image {width}x{height} exceeds the {MAX_RASTER_EDGE}px edge limit"
        )));
    }
    let img = BaseImage::from_rgba8(width, height, rgba.into_raw())?;
    tracing::debug!(width, height, "decoded base image");
    Ok(img)
}

/// Decode and apply the EXIF orientation, so the raster is upright the way viewers show it.
fn decode_oriented(bytes: &[u8]) -> image::ImageResult<image::DynamicImage> {
    use image::ImageDecoder as _;

    let mut decoder = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "unreadable orientation metadata, assuming upright");
        image::metadata::Orientation::NoTransforms
    });
    let mut img = image::DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

pub fn decode_image_path(path: &std::path::Path) -> TextBlendResult<BaseImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))
        .map_err(|e| TextBlendError::decode(format!("{e:#}")))?;
    decode_image(&bytes)
}

/// Reduced `w:h` ratio, or `x.xx:1` when the reduced terms are unwieldy.
pub fn aspect_ratio(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "0:0".to_string();
    }
    let g = gcd(width, height);
    let (a, b) = (width / g, height / g);
    if a <= 50 && b <= 50 {
        format!("{a}:{b}")
    } else {
        format!("{:.2}:1", f64::from(width) / f64::from(height))
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

fn pixmap_from_premul_bytes(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> TextBlendResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TextBlendError::decode("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TextBlendError::decode("image height exceeds u16"))?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
