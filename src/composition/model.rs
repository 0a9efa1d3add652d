use std::sync::Arc;

use crate::{
    animation::keyframe::{Animations, KeyframeAnimation},
    composition::source::Source,
    effects::ops::{Operation, OperationKind},
    foundation::core::{Fps, MediaTime, Size, TimeRange},
    foundation::error::{LaminaError, LaminaResult},
    render::blend::BlendMode,
    transform::layer::{TRANSFORM_KEYS, Transform},
};

/// Animation key path for the layer opacity.
pub const KEY_BLEND_OPACITY: &str = "blend_opacity";

/// What a layer draws.
#[derive(Clone, Debug)]
pub enum LayerContent {
    /// Pixels from an image or track source.
    Source(Arc<dyn Source>),
    /// Nested layers rendered into their own buffer first. Member ranges are relative to the
    /// group start.
    Group(Vec<Arc<RenderLayer>>),
    /// No pixels of its own; the effect chain runs on everything below it.
    Effect,
}

/// One timeline entry.
#[derive(Clone, Debug)]
pub struct RenderLayer {
    /// Optional label used in logs and summaries.
    pub name: Option<String>,
    /// Span relative to the parent (timeline or group start).
    pub time_range: TimeRange,
    /// Stacking order; higher levels draw later.
    pub layer_level: i32,
    /// Placement inside the render target.
    pub transform: Transform,
    /// Compositing formula.
    pub blend_mode: BlendMode,
    /// Opacity in `[0, 1]`.
    pub blend_opacity: f32,
    /// Effects applied before blending, in order.
    pub operations: Vec<Operation>,
    /// Drawn content.
    pub content: LayerContent,
    /// Curves for opacity and transform fields, in layer-local time.
    pub animations: Animations,
}

/// Per-call parameters of a layer after animation.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerState {
    /// Opacity in `[0, 1]`.
    pub blend_opacity: f32,
    /// Animated placement.
    pub transform: Transform,
    /// Resolved effect parameters, in order.
    pub operations: Vec<OperationKind>,
}

impl RenderLayer {
    /// Layer with default placement, normal blending and full opacity.
    pub fn new(time_range: TimeRange, content: LayerContent) -> Self {
        Self {
            name: None,
            time_range,
            layer_level: 0,
            transform: Transform::IDENTITY,
            blend_mode: BlendMode::Normal,
            blend_opacity: 1.0,
            operations: Vec::new(),
            content,
            animations: Animations::new(),
        }
    }

    /// Layer drawing `source`.
    pub fn from_source(time_range: TimeRange, source: Arc<dyn Source>) -> Self {
        Self::new(time_range, LayerContent::Source(source))
    }

    /// Group of `members`.
    pub fn group(time_range: TimeRange, members: Vec<Arc<RenderLayer>>) -> Self {
        Self::new(time_range, LayerContent::Group(members))
    }

    /// Effect-only layer.
    pub fn effect(time_range: TimeRange) -> Self {
        Self::new(time_range, LayerContent::Effect)
    }

    /// Set the label.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stacking level.
    pub fn level(mut self, level: i32) -> Self {
        self.layer_level = level;
        self
    }

    /// Set the placement.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the blend mode.
    pub fn blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Set the opacity.
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.blend_opacity = opacity;
        self
    }

    /// Append an effect.
    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Attach an opacity or transform curve.
    pub fn animation(mut self, anim: KeyframeAnimation) -> Self {
        self.animations.insert(anim);
        self
    }

    /// Freeze into a shareable handle.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Attached source, if any.
    pub fn source(&self) -> Option<&Arc<dyn Source>> {
        match &self.content {
            LayerContent::Source(s) => Some(s),
            _ => None,
        }
    }

    /// Label for logs.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Opacity, transform and effect parameters at layer-local time `local`.
    pub fn state_at(&self, local: MediaTime) -> LayerState {
        let blend_opacity = self
            .animations
            .value(KEY_BLEND_OPACITY, local)
            .map(|v| v as f32)
            .unwrap_or(self.blend_opacity)
            .clamp(0.0, 1.0);
        LayerState {
            blend_opacity,
            transform: self.transform.animated(&self.animations, local),
            operations: self.operations.iter().map(|op| op.resolve(local)).collect(),
        }
    }

    /// Check ranges, opacity, curves and effects, recursing into groups.
    pub fn validate(&self) -> LaminaResult<()> {
        if self.time_range.is_empty() {
            return Err(LaminaError::validation(format!(
                "layer '{}' has an empty time range",
                self.label()
            )));
        }
        if !self.blend_opacity.is_finite() || !(0.0..=1.0).contains(&self.blend_opacity) {
            return Err(LaminaError::validation(format!(
                "layer '{}' opacity must be in [0, 1]",
                self.label()
            )));
        }
        let mut keys: Vec<&str> = TRANSFORM_KEYS.to_vec();
        keys.push(KEY_BLEND_OPACITY);
        self.animations.validate(&keys)?;
        for op in &self.operations {
            op.validate()?;
        }
        if let LayerContent::Group(members) = &self.content {
            for m in members {
                m.validate()?;
            }
        }
        Ok(())
    }
}

/// Timeline handed to the instruction builder.
#[derive(Clone, Debug)]
pub struct Composition {
    /// Output frame size.
    pub render_size: Size,
    /// Output frame rate.
    pub fps: Fps,
    /// Top-level layers in insertion order.
    pub layers: Vec<Arc<RenderLayer>>,
}

impl Composition {
    /// Empty timeline.
    pub fn new(render_size: Size, fps: Fps) -> Self {
        Self {
            render_size,
            fps,
            layers: Vec::new(),
        }
    }

    /// End of the last top-level layer.
    pub fn duration(&self) -> MediaTime {
        self.layers
            .iter()
            .map(|l| l.time_range.end())
            .max()
            .unwrap_or(MediaTime::ZERO)
    }

    /// Check the output size and every layer.
    pub fn validate(&self) -> LaminaResult<()> {
        if self.render_size.is_empty() {
            return Err(LaminaError::validation("render size must be non-zero"));
        }
        for layer in &self.layers {
            if layer.time_range.start.is_negative() {
                return Err(LaminaError::validation(format!(
                    "layer '{}' starts before zero",
                    layer.label()
                )));
            }
            layer.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
