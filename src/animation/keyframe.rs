use crate::{
    animation::ease::Ease,
    foundation::core::MediaTime,
    foundation::error::{LaminaError, LaminaResult},
};

/// One keyed value on a curve.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Local time of the key.
    pub time: MediaTime,
    /// Value at `time`.
    pub value: f64,
    /// Ease applied toward the next key.
    #[serde(default)]
    pub ease: Ease,
}

impl Keyframe {
    /// Linear key.
    pub fn new(time: MediaTime, value: f64) -> Self {
        Self {
            time,
            value,
            ease: Ease::Linear,
        }
    }
}

/// How values between two keys are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InterpMode {
    /// Keep the previous key's value until the next key.
    Hold,
    /// Eased linear interpolation.
    #[default]
    Linear,
}

/// Scalar keyframe curve bound to a parameter name such as `"blend_opacity"`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeAnimation {
    /// Parameter this curve drives.
    pub key_path: String,
    /// Keys sorted by time.
    pub keyframes: Vec<Keyframe>,
    /// Interpolation between keys.
    #[serde(default)]
    pub mode: InterpMode,
}

impl KeyframeAnimation {
    /// Build and validate a linear curve.
    pub fn new(key_path: impl Into<String>, keyframes: Vec<Keyframe>) -> LaminaResult<Self> {
        let anim = Self {
            key_path: key_path.into(),
            keyframes,
            mode: InterpMode::Linear,
        };
        anim.validate()?;
        Ok(anim)
    }

    /// Switch the interpolation mode.
    pub fn with_mode(mut self, mode: InterpMode) -> Self {
        self.mode = mode;
        self
    }

    /// Curves need at least one key, sorted by time, with finite values.
    pub fn validate(&self) -> LaminaResult<()> {
        if self.key_path.trim().is_empty() {
            return Err(LaminaError::animation("animation key path must be non-empty"));
        }
        if self.keyframes.is_empty() {
            return Err(LaminaError::animation(format!(
                "animation '{}' must have at least one keyframe",
                self.key_path
            )));
        }
        if !self.keyframes.windows(2).all(|w| w[0].time <= w[1].time) {
            return Err(LaminaError::animation(format!(
                "animation '{}' keyframes must be sorted by time",
                self.key_path
            )));
        }
        if self.keyframes.iter().any(|k| !k.value.is_finite()) {
            return Err(LaminaError::animation(format!(
                "animation '{}' keyframe values must be finite",
                self.key_path
            )));
        }
        Ok(())
    }

    /// Value at local time `t`; clamps to the first/last key outside the keyed span.
    pub fn value_at(&self, t: MediaTime) -> Option<f64> {
        let keys = &self.keyframes;
        let first = keys.first()?;
        let idx = keys.partition_point(|k| k.time <= t);

        if idx == 0 {
            return Some(first.value);
        }
        if idx >= keys.len() {
            return Some(keys[keys.len() - 1].value);
        }

        let a = &keys[idx - 1];
        let b = &keys[idx];
        let span = (b.time - a.time).as_secs_f64();
        if span <= 0.0 {
            return Some(a.value);
        }

        match self.mode {
            InterpMode::Hold => Some(a.value),
            InterpMode::Linear => {
                let t = (t - a.time).as_secs_f64() / span;
                let te = a.ease.apply(t);
                Some(a.value + (b.value - a.value) * te)
            }
        }
    }
}

/// Set of curves attached to a layer or operation.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Animations {
    curves: Vec<KeyframeAnimation>,
}

impl Animations {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a curve. A later curve for the same key path replaces the earlier one.
    pub fn insert(&mut self, anim: KeyframeAnimation) {
        self.curves.retain(|c| c.key_path != anim.key_path);
        self.curves.push(anim);
    }

    /// Value of `key_path` at `t`, if a curve drives it.
    pub fn value(&self, key_path: &str, t: MediaTime) -> Option<f64> {
        self.curves
            .iter()
            .find(|c| c.key_path == key_path)
            .and_then(|c| c.value_at(t))
    }

    /// Whether no curves are attached.
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Attached curves.
    pub fn curves(&self) -> &[KeyframeAnimation] {
        &self.curves
    }

    /// Validate every curve and reject key paths outside `known`.
    pub fn validate(&self, known: &[&str]) -> LaminaResult<()> {
        for c in &self.curves {
            c.validate()?;
            if !known.contains(&c.key_path.as_str()) {
                return Err(LaminaError::animation(format!(
                    "unknown animation key path '{}'",
                    c.key_path
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
