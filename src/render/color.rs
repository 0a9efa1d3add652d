use kurbo::Point;

use crate::{
    foundation::core::Affine,
    foundation::error::{LaminaError, LaminaResult},
    foundation::math::unit_to_u8,
    render::pool::{TextureLease, TexturePool},
    render::texture::{PixelFormat, Texture},
    transform::orientation::normalize_orientation,
};

/// BT.601 video-range YCbCr to RGB, column-major (columns multiply Y, Cb, Cr).
pub const COLOR_MATRIX_VIDEO_RANGE: [[f32; 3]; 3] = [
    [1.164, 1.164, 1.164],
    [0.0, -0.392, 2.017],
    [1.596, -0.813, 0.0],
];

/// BT.601 full-range YCbCr to RGB, column-major (columns multiply Y, Cb, Cr).
pub const COLOR_MATRIX_FULL_RANGE: [[f32; 3]; 3] = [
    [1.0, 1.0, 1.0],
    [0.0, -0.343, 1.765],
    [1.4, -0.711, 0.0],
];

/// Quantization range of a luma/chroma frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColorRange {
    /// Luma in `16..=235`, chroma in `16..=240`.
    #[default]
    Video,
    /// Luma and chroma use the whole byte.
    Full,
}

impl ColorRange {
    /// Conversion matrix for this range.
    pub fn matrix(self) -> &'static [[f32; 3]; 3] {
        match self {
            Self::Video => &COLOR_MATRIX_VIDEO_RANGE,
            Self::Full => &COLOR_MATRIX_FULL_RANGE,
        }
    }

    fn luma_offset(self) -> f32 {
        match self {
            Self::Video => 16.0 / 255.0,
            Self::Full => 0.0,
        }
    }
}

/// Bi-planar 4:2:0 frame: full-resolution luma plus half-resolution interleaved chroma.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BiPlanarFrame {
    /// `R8` luma plane.
    pub luma: Texture,
    /// `Rg8` chroma plane (Cb, Cr).
    pub chroma: Texture,
    /// Quantization range.
    pub range: ColorRange,
}

impl BiPlanarFrame {
    /// Check plane formats and 4:2:0 geometry.
    pub fn validate(&self) -> LaminaResult<()> {
        if self.luma.format() != PixelFormat::R8 || self.chroma.format() != PixelFormat::Rg8 {
            return Err(LaminaError::validation(format!(
                "bi-planar frame expects R8 luma and Rg8 chroma, got {:?} and {:?}",
                self.luma.format(),
                self.chroma.format()
            )));
        }
        let want_w = self.luma.width().div_ceil(2);
        let want_h = self.luma.height().div_ceil(2);
        if self.chroma.width() != want_w || self.chroma.height() != want_h {
            return Err(LaminaError::validation(format!(
                "unsupported chroma geometry {}x{} for {}x{} luma (expected 4:2:0)",
                self.chroma.width(),
                self.chroma.height(),
                self.luma.width(),
                self.luma.height()
            )));
        }
        Ok(())
    }
}

/// Pixels handed over by the host for one track at one instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PixelBuffer {
    /// Already premultiplied RGBA; used as-is.
    Packed(Texture),
    /// Luma/chroma planes that need conversion.
    BiPlanar(BiPlanarFrame),
}

/// Convert one YCbCr sample (normalized bytes) to RGB.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8, range: ColorRange) -> [u8; 3] {
    let m = range.matrix();
    let yv = f32::from(y) / 255.0 - range.luma_offset();
    let cbv = f32::from(cb) / 255.0 - 0.5;
    let crv = f32::from(cr) / 255.0 - 0.5;
    let mut rgb = [0u8; 3];
    for (i, out) in rgb.iter_mut().enumerate() {
        *out = unit_to_u8(m[0][i] * yv + m[1][i] * cbv + m[2][i] * crv);
    }
    rgb
}

/// Convert `frame` into an opaque RGBA texture leased from `pool`, upright per `preferred`.
pub fn convert_to_rgba<'p>(
    pool: &'p TexturePool,
    frame: &BiPlanarFrame,
    preferred: Affine,
) -> LaminaResult<TextureLease<'p>> {
    frame.validate()?;
    let orientation = normalize_orientation(preferred, frame.luma.size());
    let mut out = pool.request_texture(orientation.size.width, orientation.size.height)?;
    let to_natural = orientation.to_natural();
    let w = out.width() as usize;

    for (i, px) in out.data_mut().chunks_exact_mut(4).enumerate() {
        let ox = (i % w) as f64 + 0.5;
        let oy = (i / w) as f64 + 0.5;
        let p = to_natural * Point::new(ox, oy);
        let lx = p.x.floor() as i64;
        let ly = p.y.floor() as i64;
        let y = frame.luma.plane_texel(lx, ly)[0];
        let c = frame.chroma.plane_texel(lx.div_euclid(2), ly.div_euclid(2));
        let rgb = ycbcr_to_rgb(y, c[0], c[1], frame.range);
        px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/color.rs"]
mod tests;
