use crate::{
    foundation::error::{LaminaError, LaminaResult},
    foundation::math::{add_sat_u8, mul_div255_u8, unit_to_u8},
    render::texture::{SamplingMode, Texture},
    transform::layer::Transform,
};

/// Per-pixel compositing formula.
///
/// Formulas are over premultiplied source `s` and destination `d` with alphas `Sa`, `Da`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// `s + d(1 - Sa)`.
    #[default]
    Normal,
    /// `min(1, s + d)`.
    Add,
    /// `s(1 - Da) + d(1 - Sa) + s·d`.
    Multiply,
    /// `s + d - s·d`.
    Screen,
    /// `min(s·Da, d·Sa) + s(1 - Da) + d(1 - Sa)`.
    Darken,
    /// `max(s·Da, d·Sa) + s(1 - Da) + d(1 - Sa)`.
    Lighten,
    /// `s + d - 2·min(s·Da, d·Sa)`.
    Difference,
}

/// Inputs of one [`blend`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendParams {
    /// Compositing formula.
    pub mode: BlendMode,
    /// Multiplier on the (premultiplied) source, clamped to `[0, 1]`.
    pub opacity: f32,
    /// Placement of the source quad.
    pub transform: Transform,
    /// When `false` the destination is treated as transparent and fully overwritten.
    pub enable_output_read: bool,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            mode: BlendMode::Normal,
            opacity: 1.0,
            transform: Transform::IDENTITY,
            enable_output_read: true,
        }
    }
}

/// Premultiplied source-over with an opacity multiplier.
pub fn over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }
    let op = u16::from(unit_to_u8(opacity));
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Combine one premultiplied source pixel (opacity already applied) with `dst`.
pub fn blend_pixel(mode: BlendMode, dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    if mode == BlendMode::Normal {
        return over(dst, src, 1.0);
    }
    if src == [0, 0, 0, 0] {
        return dst;
    }
    let s = src.map(|v| f32::from(v) / 255.0);
    let d = dst.map(|v| f32::from(v) / 255.0);
    let (sa, da) = (s[3], d[3]);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let (sc, dc) = (s[i], d[i]);
        let v = match mode {
            BlendMode::Normal => sc + dc * (1.0 - sa),
            BlendMode::Add => (sc + dc).min(1.0),
            BlendMode::Multiply => sc * (1.0 - da) + dc * (1.0 - sa) + sc * dc,
            BlendMode::Screen => sc + dc - sc * dc,
            BlendMode::Darken => (sc * da).min(dc * sa) + sc * (1.0 - da) + dc * (1.0 - sa),
            BlendMode::Lighten => (sc * da).max(dc * sa) + sc * (1.0 - da) + dc * (1.0 - sa),
            BlendMode::Difference => sc + dc - 2.0 * (sc * da).min(dc * sa),
        };
        out[i] = unit_to_u8(v);
    }
    out[3] = match mode {
        BlendMode::Add => unit_to_u8(sa + da),
        _ => unit_to_u8(sa + da - sa * da),
    };
    // Keep the result a valid premultiplied pixel.
    for i in 0..3 {
        out[i] = out[i].min(out[3]);
    }
    out
}

/// Composite `src` onto `dst` with `params`.
///
/// Destination pixel centers are mapped back through the inverse of the transform; positions that
/// fall outside the source contribute nothing. Opacity 0 with output read enabled leaves `dst`
/// untouched.
pub fn blend(
    dst: &mut Texture,
    src: &Texture,
    params: &BlendParams,
    sampling: SamplingMode,
) -> LaminaResult<()> {
    if !dst.is_drawable() {
        return Err(LaminaError::evaluation("blend destination is not drawable"));
    }
    if !src.is_drawable() {
        return Err(LaminaError::evaluation("blend source is not drawable"));
    }
    if !params.enable_output_read {
        dst.clear();
    }
    let opacity = params.opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }
    let Some(mapping) = params
        .transform
        .matrices(src.size(), dst.size())
        .source_mapping(src.size(), dst.size())
    else {
        tracing::trace!("degenerate layer transform, nothing to draw");
        return Ok(());
    };

    let op = u16::from(unit_to_u8(opacity));
    let sw = f64::from(src.width());
    let sh = f64::from(src.height());
    let w = dst.width() as usize;

    for (i, d) in dst.data_mut().chunks_exact_mut(4).enumerate() {
        let x = (i % w) as f64 + 0.5;
        let y = (i / w) as f64 + 0.5;
        let Some((sx, sy)) = mapping.map(x, y) else {
            continue;
        };
        if sx < 0.0 || sy < 0.0 || sx >= sw || sy >= sh {
            continue;
        }
        let mut s = src.sample(sx, sy, sampling);
        if op < 255 {
            s = s.map(|c| mul_div255_u8(u16::from(c), op));
        }
        let out = blend_pixel(params.mode, [d[0], d[1], d[2], d[3]], s);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
