use crate::foundation::{
    core::Size,
    error::{LaminaError, LaminaResult},
};

/// Pixel layout of a [`Texture`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// Premultiplied RGBA, 8 bits per channel. The only drawable format.
    Rgba8Premul,
    /// Single 8-bit channel (luma plane).
    R8,
    /// Two interleaved 8-bit channels (chroma plane, Cb then Cr).
    Rg8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Premul => 4,
            Self::R8 => 1,
            Self::Rg8 => 2,
        }
    }
}

/// How textures are sampled when their texels do not land on destination pixel centers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SamplingMode {
    /// Nearest texel.
    Nearest,
    /// Bilinear filtering of premultiplied texels.
    #[default]
    Bilinear,
}

/// CPU render target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

fn byte_len(width: u32, height: u32, format: PixelFormat) -> LaminaResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(format.bytes_per_pixel()))
        .ok_or_else(|| LaminaError::validation("texture size overflow"))
}

impl Texture {
    /// Zero-filled texture.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> LaminaResult<Self> {
        if width == 0 || height == 0 {
            return Err(LaminaError::validation("texture dimensions must be > 0"));
        }
        let len = byte_len(width, height, format)?;
        Ok(Self {
            width,
            height,
            format,
            data: vec![0; len],
        })
    }

    /// Wrap existing bytes; `data` must match `width * height * bpp`.
    pub fn from_bytes(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> LaminaResult<Self> {
        if width == 0 || height == 0 {
            return Err(LaminaError::validation("texture dimensions must be > 0"));
        }
        if data.len() != byte_len(width, height, format)? {
            return Err(LaminaError::validation(format!(
                "texture data length {} does not match {width}x{height} {format:?}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Premultiply a straight-alpha image.
    pub fn from_rgba_image(image: &image::RgbaImage) -> LaminaResult<Self> {
        let mut data = image.as_raw().clone();
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            for c in &mut px[..3] {
                *c = crate::foundation::math::mul_div255_u8(u16::from(*c), a);
            }
        }
        Self::from_bytes(image.width(), image.height(), PixelFormat::Rgba8Premul, data)
    }

    /// Solid premultiplied fill.
    pub fn solid(width: u32, height: u32, px: [u8; 4]) -> LaminaResult<Self> {
        let mut tex = Self::new(width, height, PixelFormat::Rgba8Premul)?;
        for d in tex.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
        Ok(tex)
    }

    /// Zero-sized stand-in left behind when a pooled texture is moved out of its lease.
    pub(crate) fn detached_placeholder() -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::Rgba8Premul,
            data: Vec::new(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw bytes, row-major, no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into raw bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Whether the blend stage can write into this texture.
    pub fn is_drawable(&self) -> bool {
        self.format == PixelFormat::Rgba8Premul
            && self.width > 0
            && self.height > 0
            && byte_len(self.width, self.height, self.format).ok() == Some(self.data.len())
    }

    /// Fully transparent (all-zero) contents.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Copy every byte of `src`; dimensions and format must match.
    pub fn copy_from(&mut self, src: &Texture) -> LaminaResult<()> {
        if self.width != src.width || self.height != src.height || self.format != src.format {
            return Err(LaminaError::evaluation(
                "copy_from expects textures of identical size and format",
            ));
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    /// RGBA pixel at `(x, y)`; transparent outside the texture.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if self.format != PixelFormat::Rgba8Premul
            || x < 0
            || y < 0
            || x >= i64::from(self.width)
            || y >= i64::from(self.height)
        {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Channel bytes of a plane pixel with coordinates clamped to the edge.
    pub(crate) fn plane_texel(&self, x: i64, y: i64) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        let idx = (y * (self.width as usize) + x) * bpp;
        &self.data[idx..idx + bpp]
    }

    /// Sample at texel-space position `(x, y)`, where texel centers sit at `i + 0.5`.
    pub fn sample(&self, x: f64, y: f64, mode: SamplingMode) -> [u8; 4] {
        match mode {
            SamplingMode::Nearest => self.pixel(x.floor() as i64, y.floor() as i64),
            SamplingMode::Bilinear => self.sample_bilinear(x, y),
        }
    }

    fn sample_bilinear(&self, x: f64, y: f64) -> [u8; 4] {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let mut tx = fx - x0;
        let mut ty = fy - y0;
        // Snap near-integer positions so identity mappings reproduce texels exactly.
        if tx < 1e-6 {
            tx = 0.0;
        } else if tx > 1.0 - 1e-6 {
            tx = 1.0;
        }
        if ty < 1e-6 {
            ty = 0.0;
        } else if ty > 1.0 - 1e-6 {
            ty = 1.0;
        }
        let (x0, y0) = (x0 as i64, y0 as i64);
        let clamp_x = |v: i64| v.clamp(0, i64::from(self.width) - 1);
        let clamp_y = |v: i64| v.clamp(0, i64::from(self.height) - 1);

        let p00 = self.pixel(clamp_x(x0), clamp_y(y0));
        let p10 = self.pixel(clamp_x(x0 + 1), clamp_y(y0));
        let p01 = self.pixel(clamp_x(x0), clamp_y(y0 + 1));
        let p11 = self.pixel(clamp_x(x0 + 1), clamp_y(y0 + 1));

        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = f64::from(p00[c]) * (1.0 - tx) + f64::from(p10[c]) * tx;
            let bottom = f64::from(p01[c]) * (1.0 - tx) + f64::from(p11[c]) * tx;
            out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/texture.rs"]
mod tests;
