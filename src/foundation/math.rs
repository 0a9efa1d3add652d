pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Normalized `[0, 1]` channel to a rounded byte.
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Premultiplied RGBA8 to straight-alpha normalized floats.
pub(crate) fn unpremultiply(px: [u8; 4]) -> [f32; 4] {
    let a = f32::from(px[3]) / 255.0;
    if a <= 0.0 {
        return [0.0, 0.0, 0.0, 0.0];
    }
    [
        (f32::from(px[0]) / 255.0 / a).min(1.0),
        (f32::from(px[1]) / 255.0 / a).min(1.0),
        (f32::from(px[2]) / 255.0 / a).min(1.0),
        a,
    ]
}

/// Straight-alpha normalized floats to premultiplied RGBA8.
pub(crate) fn premultiply(c: [f32; 4]) -> [u8; 4] {
    let a = c[3].clamp(0.0, 1.0);
    [
        unit_to_u8(c[0] * a),
        unit_to_u8(c[1] * a),
        unit_to_u8(c[2] * a),
        unit_to_u8(a),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
