use kurbo::Rect;

use crate::foundation::core::{Affine, Size};

/// A preferred track transform snapped to an exact quarter-turn rotation or flip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    /// Maps natural (stored) pixel positions into the oriented output.
    pub to_output: Affine,
    /// Oriented output dimensions.
    pub size: Size,
}

impl Orientation {
    /// Whether the stored frame is already upright.
    pub fn is_identity(&self) -> bool {
        self.to_output == Affine::IDENTITY
    }

    /// Output pixel position back to the natural frame.
    pub fn to_natural(&self) -> Affine {
        self.to_output.inverse()
    }
}

fn snap_unit(v: f64) -> f64 {
    if v > 0.5 {
        1.0
    } else if v < -0.5 {
        -1.0
    } else {
        0.0
    }
}

/// Snap `preferred` to a signed axis permutation and translate it so the oriented frame starts at
/// the origin. Quarter turns swap the output width and height.
pub fn normalize_orientation(preferred: Affine, natural: Size) -> Orientation {
    let [a, b, c, d, _, _] = preferred.as_coeffs();
    let (a, b, c, d) = (snap_unit(a), snap_unit(b), snap_unit(c), snap_unit(d));
    let det = a * d - b * c;
    let linear = if det.abs() == 1.0 {
        Affine::new([a, b, c, d, 0.0, 0.0])
    } else {
        tracing::warn!(?preferred, "unsupported preferred transform, using identity");
        Affine::IDENTITY
    };

    let frame = Rect::new(
        0.0,
        0.0,
        f64::from(natural.width),
        f64::from(natural.height),
    );
    let bbox = linear.transform_rect_bbox(frame);
    let to_output = Affine::translate((-bbox.x0, -bbox.y0)) * linear;
    Orientation {
        to_output,
        size: Size::new(bbox.width().round() as u32, bbox.height().round() as u32),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/orientation.rs"]
mod tests;
