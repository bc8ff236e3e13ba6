//! Haptic effects and their composition.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `composer` | [`HapticObject`] merges effects into channel commands |
//! | `settings` | Clamped temperature, force and texture settings |
//! | `touch` | [`Effect`] trait and [`TouchEffect`] |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use weart_client::{ActuationPoint, Force, HandSide, Temperature, Texture, TouchEffect};
//!
//! let object = client.haptic_object(HandSide::Right, ActuationPoint::Index);
//! let effect = Arc::new(TouchEffect::new(
//!     Temperature::new(0.8),
//!     Force::new(0.4),
//!     Texture::default(),
//! ));
//! object.add_effect(effect).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Effect composition.
pub mod composer;

/// Modality settings.
pub mod settings;

/// Effect trait and touch effect.
pub mod touch;

// ============================================================================
// Re-exports
// ============================================================================

pub use composer::{HapticObject, MessageSink};
pub use settings::{Force, Temperature, Texture};
pub use touch::{Effect, EffectSnapshot, TouchEffect};
