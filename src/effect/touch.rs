//! Effects: bundles of the three modality settings.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;

use super::settings::{Force, Temperature, Texture};

// ============================================================================
// Effect
// ============================================================================

/// Source of temperature, force and texture settings for a haptic object.
///
/// Implementations may change their settings at any time; the owning
/// [`HapticObject`](super::HapticObject) picks the change up on its next
/// recomposition.
pub trait Effect: Send + Sync {
    fn temperature(&self) -> Temperature;
    fn force(&self) -> Force;
    fn texture(&self) -> Texture;

    /// Reads all three settings at once.
    fn snapshot(&self) -> EffectSnapshot {
        EffectSnapshot {
            temperature: self.temperature(),
            force: self.force(),
            texture: self.texture(),
        }
    }
}

/// Values of an effect at one instant. Effects compare equal by snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectSnapshot {
    pub temperature: Temperature,
    pub force: Force,
    pub texture: Texture,
}

// ============================================================================
// TouchEffect
// ============================================================================

/// General-purpose effect with replaceable settings.
#[derive(Debug, Default)]
pub struct TouchEffect {
    settings: Mutex<EffectSnapshot>,
}

impl TouchEffect {
    /// Creates an effect with the given settings.
    #[must_use]
    pub fn new(temperature: Temperature, force: Force, texture: Texture) -> Self {
        Self {
            settings: Mutex::new(EffectSnapshot {
                temperature,
                force,
                texture,
            }),
        }
    }

    /// Replaces the settings. Returns `true` if any of them changed.
    ///
    /// A texture that differs from the current one has its velocity reset
    /// to [`Texture::MAX_VELOCITY`] before it is stored.
    pub fn set(&self, temperature: Temperature, force: Force, mut texture: Texture) -> bool {
        let mut settings = self.settings.lock();
        let mut changed = false;

        if settings.temperature != temperature {
            settings.temperature = temperature;
            changed = true;
        }
        if settings.force != force {
            settings.force = force;
            changed = true;
        }
        if settings.texture != texture {
            texture.set_velocity(Texture::MAX_VELOCITY);
            settings.texture = texture;
            changed = true;
        }

        changed
    }
}

impl Effect for TouchEffect {
    fn temperature(&self) -> Temperature {
        self.settings.lock().temperature
    }

    fn force(&self) -> Force {
        self.settings.lock().force
    }

    fn texture(&self) -> Texture {
        self.settings.lock().texture
    }

    fn snapshot(&self) -> EffectSnapshot {
        *self.settings.lock()
    }
}

// ============================================================================
// Tests
// ============================================================================
