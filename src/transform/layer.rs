use glam::{DMat3, DMat4, DVec3, DVec4};

use crate::{
    animation::keyframe::Animations,
    foundation::core::{MediaTime, Size, Vec2},
};

/// Animation key path for the normalized horizontal center.
pub const KEY_CENTER_X: &str = "transform.center.x";
/// Animation key path for the normalized vertical center.
pub const KEY_CENTER_Y: &str = "transform.center.y";
/// Animation key path for the in-plane rotation (radians).
pub const KEY_ROTATION: &str = "transform.rotation";
/// Animation key path for the rotation about the horizontal axis (radians).
pub const KEY_ROTATION_X: &str = "transform.rotation_x";
/// Animation key path for the rotation about the vertical axis (radians).
pub const KEY_ROTATION_Y: &str = "transform.rotation_y";
/// Animation key path for the uniform scale.
pub const KEY_SCALE: &str = "transform.scale";

pub(crate) const TRANSFORM_KEYS: [&str; 6] = [
    KEY_CENTER_X,
    KEY_CENTER_Y,
    KEY_ROTATION,
    KEY_ROTATION_X,
    KEY_ROTATION_Y,
    KEY_SCALE,
];

/// Placement of a layer's content inside the render target.
///
/// The source keeps its pixel size; `center` is normalized to the destination (`(0.5, 0.5)` is
/// the middle). Rotations are applied about the source center in the order x, y, z.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Normalized destination position of the source center.
    pub center: Vec2,
    /// In-plane rotation in radians, clockwise on screen.
    pub rotation: f64,
    /// Rotation about the horizontal axis in radians.
    pub rotation_x: f64,
    /// Rotation about the vertical axis in radians.
    pub rotation_y: f64,
    /// Uniform scale factor.
    pub scale: f64,
    /// Eye distance in pixels for perspective projection; `None` is orthographic.
    pub perspective: Option<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Centered, unrotated, unscaled.
    pub const IDENTITY: Self = Self {
        center: Vec2::new(0.5, 0.5),
        rotation: 0.0,
        rotation_x: 0.0,
        rotation_y: 0.0,
        scale: 1.0,
        perspective: None,
    };

    /// Move the source center to a normalized destination position.
    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = Vec2::new(x, y);
        self
    }

    /// Set the in-plane rotation.
    pub fn with_rotation(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }

    /// Set the out-of-plane rotations.
    pub fn with_rotation_xy(mut self, x: f64, y: f64) -> Self {
        self.rotation_x = x;
        self.rotation_y = y;
        self
    }

    /// Set the uniform scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Enable perspective with the given eye distance.
    pub fn with_perspective(mut self, eye_distance: f64) -> Self {
        self.perspective = Some(eye_distance);
        self
    }

    /// Copy of `self` with animated fields overridden at `t`.
    pub fn animated(self, animations: &Animations, t: MediaTime) -> Self {
        if animations.is_empty() {
            return self;
        }
        let get = |key: &str, base: f64| animations.value(key, t).unwrap_or(base);
        Self {
            center: Vec2::new(
                get(KEY_CENTER_X, self.center.x),
                get(KEY_CENTER_Y, self.center.y),
            ),
            rotation: get(KEY_ROTATION, self.rotation),
            rotation_x: get(KEY_ROTATION_X, self.rotation_x),
            rotation_y: get(KEY_ROTATION_Y, self.rotation_y),
            scale: get(KEY_SCALE, self.scale),
            perspective: self.perspective,
        }
    }

    /// Model, view and projection matrices placing a `source`-sized quad into `target`.
    pub fn matrices(&self, source: Size, target: Size) -> TransformMatrices {
        let sw = f64::from(source.width);
        let sh = f64::from(source.height);
        let tw = f64::from(target.width);
        let th = f64::from(target.height);

        let model = DMat4::from_translation(DVec3::new(self.center.x * tw, self.center.y * th, 0.0))
            * DMat4::from_rotation_z(self.rotation)
            * DMat4::from_rotation_y(self.rotation_y)
            * DMat4::from_rotation_x(self.rotation_x)
            * DMat4::from_scale(DVec3::new(self.scale * sw, self.scale * sh, 1.0));

        let view = match self.perspective {
            Some(d) if d.is_finite() && d > 0.0 => {
                let c = DVec3::new(tw * 0.5, th * 0.5, 0.0);
                let persp = DMat4::from_cols(
                    DVec4::X,
                    DVec4::Y,
                    DVec4::new(0.0, 0.0, 1.0, -1.0 / d),
                    DVec4::W,
                );
                DMat4::from_translation(c) * persp * DMat4::from_translation(-c)
            }
            _ => DMat4::IDENTITY,
        };

        let projection = DMat4::orthographic_rh(0.0, tw, th, 0.0, -1.0, 1.0);

        TransformMatrices {
            model,
            view,
            projection,
        }
    }
}

/// Matrices produced by [`Transform::matrices`].
///
/// `model` takes the unit source quad (`[-0.5, 0.5]` on both axes, y down) to destination pixels,
/// `view` applies optional perspective, `projection` maps destination pixels to NDC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformMatrices {
    /// Source-local to destination pixel space.
    pub model: DMat4,
    /// Perspective about the destination center, or identity.
    pub view: DMat4,
    /// Destination pixels to normalized device coordinates.
    pub projection: DMat4,
}

impl TransformMatrices {
    /// Combined `projection * view * model`.
    pub fn mvp(&self) -> DMat4 {
        self.projection * self.view * self.model
    }

    /// Inverse mapping from destination pixels to source texel space.
    ///
    /// Returns `None` when the quad degenerates (zero scale, edge-on rotation).
    pub fn source_mapping(&self, source: Size, target: Size) -> Option<SourceMapping> {
        let m = self.mvp();
        // The source quad lies in z = 0 and depth is not needed, so drop column 2 and row 2.
        let h = DMat3::from_cols(
            DVec3::new(m.x_axis.x, m.x_axis.y, m.x_axis.w),
            DVec3::new(m.y_axis.x, m.y_axis.y, m.y_axis.w),
            DVec3::new(m.w_axis.x, m.w_axis.y, m.w_axis.w),
        );
        let det = h.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        Some(SourceMapping {
            inverse: h.inverse(),
            target_w: f64::from(target.width),
            target_h: f64::from(target.height),
            source_w: f64::from(source.width),
            source_h: f64::from(source.height),
        })
    }
}

/// Destination-pixel to source-texel mapping derived from [`TransformMatrices`].
#[derive(Clone, Copy, Debug)]
pub struct SourceMapping {
    inverse: DMat3,
    target_w: f64,
    target_h: f64,
    source_w: f64,
    source_h: f64,
}

impl SourceMapping {
    /// Source texel-space position seen by destination position `(x, y)`; `None` behind the eye.
    pub fn map(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let ndc = DVec3::new(
            2.0 * x / self.target_w - 1.0,
            1.0 - 2.0 * y / self.target_h,
            1.0,
        );
        let s = self.inverse * ndc;
        if s.z <= 1e-12 {
            return None;
        }
        Some((
            (s.x / s.z + 0.5) * self.source_w,
            (s.y / s.z + 0.5) * self.source_h,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/layer.rs"]
mod tests;
