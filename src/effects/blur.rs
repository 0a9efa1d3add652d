use crate::{
    foundation::error::{LaminaError, LaminaResult},
    render::texture::Texture,
};

/// Largest accepted blur radius in pixels.
pub const MAX_BLUR_RADIUS: u32 = 256;

/// Separable Gaussian blur of `source` written into `target`.
///
/// Both textures must be drawable and of equal size. `radius == 0` copies the source.
pub fn gaussian_blur(
    source: &Texture,
    target: &mut Texture,
    radius: u32,
    sigma: f32,
) -> LaminaResult<()> {
    if !source.is_drawable() || !target.is_drawable() || source.size() != target.size() {
        return Err(LaminaError::evaluation(
            "gaussian blur expects drawable textures of identical size",
        ));
    }
    if radius == 0 {
        return target.copy_from(source);
    }
    let kernel = gaussian_kernel_q16(radius.min(MAX_BLUR_RADIUS), sigma)?;
    let (w, h) = (source.width(), source.height());
    horizontal_pass(source.data(), target.data_mut(), w, h, &kernel);
    vertical_pass_in_place(target.data_mut(), w, h, &kernel);
    Ok(())
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> LaminaResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LaminaError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(LaminaError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Fold the rounding residue into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    for y in 0..i64::from(height) {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass_in_place(buf: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = width as usize;
    let h = i64::from(height);
    let mut column = vec![0u8; height as usize * 4];
    for x in 0..w {
        for y in 0..height as usize {
            let idx = (y * w + x) * 4;
            column[y * 4..y * 4 + 4].copy_from_slice(&buf[idx..idx + 4]);
        }
        for y in 0..h {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i64 - radius).clamp(0, h - 1) as usize;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(column[sy * 4 + c]);
                }
            }
            let out_idx = (y as usize * w + x) * 4;
            for c in 0..4 {
                buf[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
