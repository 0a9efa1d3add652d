use std::sync::Arc;

use crate::{
    animation::keyframe::{Animations, KeyframeAnimation},
    effects::blur::{MAX_BLUR_RADIUS, gaussian_blur},
    foundation::core::{MediaTime, TimeRange},
    foundation::error::{LaminaError, LaminaResult},
    foundation::math::{premultiply, unpremultiply},
    render::texture::{PixelFormat, SamplingMode, Texture},
};

/// Animation key path for [`OperationKind::Brightness`].
pub const KEY_BRIGHTNESS: &str = "brightness";
/// Animation key path for [`OperationKind::Saturation`].
pub const KEY_SATURATION: &str = "saturation";
/// Animation key path for the [`OperationKind::Lookup`] mix.
pub const KEY_INTENSITY: &str = "intensity";
/// Animation key path for the [`OperationKind::GaussianBlur`] radius.
pub const KEY_RADIUS: &str = "radius";
/// Animation key path for the [`OperationKind::GaussianBlur`] sigma.
pub const KEY_SIGMA: &str = "sigma";

/// Edge length of a color lookup table: an 8x8 grid of 64x64 tiles.
pub const LOOKUP_TABLE_SIZE: u32 = 512;

const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Resolved parameters of one effect.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationKind {
    /// Add `amount` to every straight-alpha color channel.
    Brightness {
        /// Offset in `[-1, 1]`.
        amount: f32,
    },
    /// Mix between luminance (`0`) and the original color (`1`); values above 1 oversaturate.
    Saturation {
        /// Saturation factor.
        amount: f32,
    },
    /// Remap colors through a 512x512 lookup table.
    Lookup {
        /// Premultiplied RGBA table, shared between layers.
        table: Arc<Texture>,
        /// Mix between the original (`0`) and remapped (`1`) color.
        intensity: f32,
    },
    /// Separable Gaussian blur.
    GaussianBlur {
        /// Kernel radius in pixels.
        radius: u32,
        /// Standard deviation in pixels.
        sigma: f32,
    },
}

impl OperationKind {
    /// Whether the operation reads an unmodified copy of its input while writing the target.
    pub fn needs_source_texture(&self) -> bool {
        matches!(self, Self::GaussianBlur { .. })
    }

    fn animatable_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Brightness { .. } => &[KEY_BRIGHTNESS],
            Self::Saturation { .. } => &[KEY_SATURATION],
            Self::Lookup { .. } => &[KEY_INTENSITY],
            Self::GaussianBlur { .. } => &[KEY_RADIUS, KEY_SIGMA],
        }
    }

    /// Apply in place to `target`. `source` must be supplied when
    /// [`needs_source_texture`](Self::needs_source_texture) is true.
    pub fn apply(&self, target: &mut Texture, source: Option<&Texture>) -> LaminaResult<()> {
        if !target.is_drawable() {
            return Err(LaminaError::evaluation("effect target is not drawable"));
        }
        match self {
            Self::Brightness { amount } => {
                map_straight(target, |c| {
                    [
                        (c[0] + amount).clamp(0.0, 1.0),
                        (c[1] + amount).clamp(0.0, 1.0),
                        (c[2] + amount).clamp(0.0, 1.0),
                        c[3],
                    ]
                });
                Ok(())
            }
            Self::Saturation { amount } => {
                map_straight(target, |c| {
                    let lum = c[0] * LUMA_WEIGHTS[0] + c[1] * LUMA_WEIGHTS[1] + c[2] * LUMA_WEIGHTS[2];
                    let mix = |v: f32| (lum + (v - lum) * amount).clamp(0.0, 1.0);
                    [mix(c[0]), mix(c[1]), mix(c[2]), c[3]]
                });
                Ok(())
            }
            Self::Lookup { table, intensity } => {
                validate_lookup_table(table)?;
                let intensity = intensity.clamp(0.0, 1.0);
                map_straight(target, |c| {
                    let mapped = lookup_color(table, c);
                    let mix = |a: f32, b: f32| a + (b - a) * intensity;
                    [
                        mix(c[0], mapped[0]),
                        mix(c[1], mapped[1]),
                        mix(c[2], mapped[2]),
                        c[3],
                    ]
                });
                Ok(())
            }
            Self::GaussianBlur { radius, sigma } => {
                let source = source.ok_or_else(|| {
                    LaminaError::evaluation("gaussian blur requires the source texture")
                })?;
                gaussian_blur(source, target, *radius, *sigma)
            }
        }
    }
}

fn map_straight(target: &mut Texture, f: impl Fn([f32; 4]) -> [f32; 4]) {
    for px in target.data_mut().chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let out = premultiply(f(unpremultiply([px[0], px[1], px[2], px[3]])));
        px.copy_from_slice(&out);
    }
}

fn validate_lookup_table(table: &Texture) -> LaminaResult<()> {
    if !table.is_drawable()
        || table.width() != LOOKUP_TABLE_SIZE
        || table.height() != LOOKUP_TABLE_SIZE
    {
        return Err(LaminaError::validation(format!(
            "lookup table must be a {LOOKUP_TABLE_SIZE}x{LOOKUP_TABLE_SIZE} RGBA texture, got {}x{} {:?}",
            table.width(),
            table.height(),
            table.format()
        )));
    }
    Ok(())
}

fn lookup_color(table: &Texture, c: [f32; 4]) -> [f32; 3] {
    let blue = c[2] * 63.0;
    let lo = blue.floor();
    let hi = blue.ceil().min(63.0);
    let t = blue - lo;
    let sample_tile = |tile: f32| {
        let tile = tile as u32;
        let x = f64::from((tile % 8) * 64) + 0.5 + 63.0 * f64::from(c[0]);
        let y = f64::from((tile / 8) * 64) + 0.5 + 63.0 * f64::from(c[1]);
        unpremultiply(table.sample(x, y, SamplingMode::Bilinear))
    };
    let a = sample_tile(lo);
    let b = sample_tile(hi);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Lookup table that maps every color onto itself.
pub fn identity_lookup_table() -> LaminaResult<Texture> {
    let size = LOOKUP_TABLE_SIZE as usize;
    let mut data = vec![0u8; size * size * 4];
    let to_u8 = |v: usize| ((v as f32 / 63.0) * 255.0).round() as u8;
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        let (x, y) = (i % size, i / size);
        let tile = (y / 64) * 8 + x / 64;
        px.copy_from_slice(&[to_u8(x % 64), to_u8(y % 64), to_u8(tile), 255]);
    }
    Texture::from_bytes(
        LOOKUP_TABLE_SIZE,
        LOOKUP_TABLE_SIZE,
        PixelFormat::Rgba8Premul,
        data,
    )
}

/// One effect attached to a layer, with its own animation curves.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    /// Base parameters.
    pub kind: OperationKind,
    /// Optional window (layer-local); animation time is measured from its start.
    pub time_range: Option<TimeRange>,
    /// Curves keyed by the parameter names of `kind`.
    pub animations: Animations,
}

impl Operation {
    /// Operation with static parameters.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            time_range: None,
            animations: Animations::new(),
        }
    }

    /// Brightness offset.
    pub fn brightness(amount: f32) -> Self {
        Self::new(OperationKind::Brightness { amount })
    }

    /// Saturation factor.
    pub fn saturation(amount: f32) -> Self {
        Self::new(OperationKind::Saturation { amount })
    }

    /// Color lookup at full intensity.
    pub fn lookup(table: Arc<Texture>) -> Self {
        Self::new(OperationKind::Lookup {
            table,
            intensity: 1.0,
        })
    }

    /// Gaussian blur.
    pub fn gaussian_blur(radius: u32, sigma: f32) -> Self {
        Self::new(OperationKind::GaussianBlur { radius, sigma })
    }

    /// Restrict animation time to start at `range.start`.
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Attach a curve.
    pub fn with_animation(mut self, anim: KeyframeAnimation) -> Self {
        self.animations.insert(anim);
        self
    }

    /// See [`OperationKind::needs_source_texture`].
    pub fn needs_source_texture(&self) -> bool {
        self.kind.needs_source_texture()
    }

    /// Operation-local time for a layer-local time.
    pub fn local_time(&self, layer_local: MediaTime) -> MediaTime {
        match self.time_range {
            Some(r) => layer_local - r.start,
            None => layer_local,
        }
    }

    /// Parameters with animated values applied at `layer_local`.
    pub fn resolve(&self, layer_local: MediaTime) -> OperationKind {
        if self.animations.is_empty() {
            return self.kind.clone();
        }
        let t = self.local_time(layer_local);
        let get = |key: &str, base: f32| {
            self.animations
                .value(key, t)
                .map(|v| v as f32)
                .unwrap_or(base)
        };
        match &self.kind {
            OperationKind::Brightness { amount } => OperationKind::Brightness {
                amount: get(KEY_BRIGHTNESS, *amount),
            },
            OperationKind::Saturation { amount } => OperationKind::Saturation {
                amount: get(KEY_SATURATION, *amount),
            },
            OperationKind::Lookup { table, intensity } => OperationKind::Lookup {
                table: Arc::clone(table),
                intensity: get(KEY_INTENSITY, *intensity),
            },
            OperationKind::GaussianBlur { radius, sigma } => OperationKind::GaussianBlur {
                radius: self
                    .animations
                    .value(KEY_RADIUS, t)
                    .map(|v| v.round().clamp(0.0, f64::from(MAX_BLUR_RADIUS)) as u32)
                    .unwrap_or(*radius),
                sigma: get(KEY_SIGMA, *sigma),
            },
        }
    }

    /// Check parameters and animation key paths.
    pub fn validate(&self) -> LaminaResult<()> {
        self.animations.validate(self.kind.animatable_keys())?;
        match &self.kind {
            OperationKind::Lookup { table, .. } => validate_lookup_table(table),
            OperationKind::GaussianBlur { radius, sigma } => {
                if *radius > MAX_BLUR_RADIUS {
                    return Err(LaminaError::validation(format!(
                        "blur radius {radius} exceeds {MAX_BLUR_RADIUS}"
                    )));
                }
                if *radius > 0 && (!sigma.is_finite() || *sigma <= 0.0) {
                    return Err(LaminaError::validation("blur sigma must be > 0"));
                }
                Ok(())
            }
            OperationKind::Brightness { amount } | OperationKind::Saturation { amount } => {
                if !amount.is_finite() {
                    return Err(LaminaError::validation("effect amount must be finite"));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/ops.rs"]
mod tests;
