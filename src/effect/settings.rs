//! Per-modality haptic settings.
//!
//! | Setting | Range | Default |
//! |---------|-------|---------|
//! | [`Temperature`] value | 0.0 – 1.0 (0.5 neutral) | 0.5 |
//! | [`Force`] value | 0.0 – 1.0 | 0.5 |
//! | [`Texture`] velocity | 0.0 – 0.5 | 0.0 |
//! | [`Texture`] volume | 0 – 100 | 100 |
//!
//! Setters clamp out-of-range values. Every setting starts inactive; an
//! inactive setting means "stop" for its modality.

use crate::protocol::TextureType;

// ============================================================================
// Temperature
// ============================================================================

/// Thermal actuation setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    /// Whether this setting drives the actuator.
    pub active: bool,
    value: f32,
}

impl Temperature {
    pub const DEFAULT_VALUE: f32 = 0.5;
    pub const MIN_VALUE: f32 = 0.0;
    pub const MAX_VALUE: f32 = 1.0;

    /// Creates an active setting with a clamped value.
    #[must_use]
    pub fn new(value: f32) -> Self {
        let mut temperature = Self::default();
        temperature.active = true;
        temperature.set_value(value);
        temperature
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.value
    }

    /// Sets the value, clamped to [`MIN_VALUE`](Self::MIN_VALUE)..=[`MAX_VALUE`](Self::MAX_VALUE).
    pub fn set_value(&mut self, value: f32) {
        self.value = clamp(value, Self::MIN_VALUE, Self::MAX_VALUE, Self::DEFAULT_VALUE);
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self {
            active: false,
            value: Self::DEFAULT_VALUE,
        }
    }
}

// ============================================================================
// Force
// ============================================================================

/// Force feedback setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    /// Whether this setting drives the actuator.
    pub active: bool,
    value: f32,
}

impl Force {
    pub const DEFAULT_VALUE: f32 = 0.5;
    pub const MIN_VALUE: f32 = 0.0;
    pub const MAX_VALUE: f32 = 1.0;

    /// Creates an active setting with a clamped value.
    #[must_use]
    pub fn new(value: f32) -> Self {
        let mut force = Self::default();
        force.active = true;
        force.set_value(value);
        force
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.value
    }

    /// Sets the value, clamped to [`MIN_VALUE`](Self::MIN_VALUE)..=[`MAX_VALUE`](Self::MAX_VALUE).
    pub fn set_value(&mut self, value: f32) {
        self.value = clamp(value, Self::MIN_VALUE, Self::MAX_VALUE, Self::DEFAULT_VALUE);
    }
}

impl Default for Force {
    fn default() -> Self {
        Self {
            active: false,
            value: Self::DEFAULT_VALUE,
        }
    }
}

// ============================================================================
// Texture
// ============================================================================

/// Vibrotactile texture setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    /// Whether this setting drives the actuator.
    pub active: bool,
    texture_type: TextureType,
    velocity: f32,
    volume: f32,
}

impl Texture {
    pub const DEFAULT_VELOCITY: f32 = 0.0;
    pub const MIN_VELOCITY: f32 = 0.0;
    pub const MAX_VELOCITY: f32 = 0.5;

    pub const DEFAULT_VOLUME: f32 = 100.0;
    pub const MIN_VOLUME: f32 = 0.0;
    pub const MAX_VOLUME: f32 = 100.0;

    /// Creates an active setting with default velocity and volume.
    #[must_use]
    pub fn new(texture_type: TextureType) -> Self {
        Self {
            active: true,
            texture_type,
            ..Self::default()
        }
    }

    /// Sets the velocity; see [`set_velocity`](Self::set_velocity).
    #[must_use]
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.set_velocity(velocity);
        self
    }

    /// Sets the volume; see [`set_volume`](Self::set_volume).
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.set_volume(volume);
        self
    }

    #[inline]
    #[must_use]
    pub const fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    #[inline]
    #[must_use]
    pub const fn velocity(&self) -> f32 {
        self.velocity
    }

    #[inline]
    #[must_use]
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_texture_type(&mut self, texture_type: TextureType) {
        self.texture_type = texture_type;
    }

    /// Sets the texture from a raw index, clamped to the valid range.
    pub fn set_texture_index(&mut self, index: i64) {
        self.texture_type = TextureType::from_index_clamped(index);
    }

    /// Sets the velocity, clamped to 0.0..=0.5.
    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = clamp(
            velocity,
            Self::MIN_VELOCITY,
            Self::MAX_VELOCITY,
            Self::DEFAULT_VELOCITY,
        );
    }

    /// Sets the volume, clamped to 0..=100.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp(volume, Self::MIN_VOLUME, Self::MAX_VOLUME, Self::DEFAULT_VOLUME);
    }
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            active: false,
            texture_type: TextureType::ClickNormal,
            velocity: Self::DEFAULT_VELOCITY,
            volume: Self::DEFAULT_VOLUME,
        }
    }
}

/// Clamps to `[min, max]`; NaN becomes `fallback`.
fn clamp(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

// ============================================================================
// Tests
// ============================================================================
