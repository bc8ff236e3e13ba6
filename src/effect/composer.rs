//! Effect composition for a set of haptic channels.
//!
//! A [`HapticObject`] owns an ordered list of effects and the last value it
//! sent per modality. Every add, remove or explicit update recomposes:
//!
//! 1. No effects: every modality resets to its inactive default and a stop
//!    command is sent for each, even if nothing was playing.
//! 2. Otherwise, per modality, the first effect whose setting is active
//!    wins; with none active the inactive default is used.
//! 3. The winner is compared with the last value sent and only a change is
//!    transmitted: a set command if active, a stop command if not.
//!
//! Each command is sent once per (hand side, actuation point) pair the
//! object covers, in canonical order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::Result;
use crate::protocol::{
    ActuationPointFlags, HandSideFlags, HapticTarget, Message, SetForce, SetTemperature,
    SetTexture,
};
use crate::transport::Connection;

use super::settings::{Force, Temperature, Texture};
use super::touch::{Effect, EffectSnapshot};

// ============================================================================
// MessageSink
// ============================================================================

/// Destination for composed commands.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Sends one message.
    async fn send(&self, message: &Message) -> Result<()>;
}

#[async_trait]
impl MessageSink for Connection {
    async fn send(&self, message: &Message) -> Result<()> {
        Connection::send(self, message).await
    }
}

// ============================================================================
// ComposerState
// ============================================================================

#[derive(Default)]
struct ComposerState {
    effects: Vec<Arc<dyn Effect>>,
    /// Last values sent; `None` until the first composition.
    temperature: Option<Temperature>,
    force: Option<Force>,
    texture: Option<Texture>,
}

impl ComposerState {
    fn position(&self, effect: &Arc<dyn Effect>) -> Option<usize> {
        let by_identity = self
            .effects
            .iter()
            .position(|e| std::ptr::addr_eq(Arc::as_ptr(e), Arc::as_ptr(effect)));
        if by_identity.is_some() {
            return by_identity;
        }

        let snapshot = effect.snapshot();
        self.effects.iter().position(|e| e.snapshot() == snapshot)
    }
}

// ============================================================================
// HapticObject
// ============================================================================

/// Composes effects onto a group of haptic channels.
///
/// The state lock is held while commands are sent, so concurrent mutations
/// are applied and transmitted one at a time.
pub struct HapticObject {
    sink: Arc<dyn MessageSink>,
    hand_sides: HandSideFlags,
    actuation_points: ActuationPointFlags,
    state: Mutex<ComposerState>,
}

impl HapticObject {
    /// Creates an object covering `hand_sides` × `actuation_points`.
    pub fn new(
        sink: Arc<dyn MessageSink>,
        hand_sides: impl Into<HandSideFlags>,
        actuation_points: impl Into<ActuationPointFlags>,
    ) -> Self {
        Self {
            sink,
            hand_sides: hand_sides.into(),
            actuation_points: actuation_points.into(),
            state: Mutex::new(ComposerState::default()),
        }
    }

    #[inline]
    #[must_use]
    pub const fn hand_sides(&self) -> HandSideFlags {
        self.hand_sides
    }

    #[inline]
    #[must_use]
    pub const fn actuation_points(&self) -> ActuationPointFlags {
        self.actuation_points
    }

    /// Channels covered, in send order.
    pub fn targets(&self) -> impl Iterator<Item = HapticTarget> + '_ {
        self.hand_sides.iter().flat_map(move |hand_side| {
            self.actuation_points
                .iter()
                .map(move |point| HapticTarget::new(hand_side, point))
        })
    }

    /// Adds an effect and recomposes.
    ///
    /// Returns `false` without sending anything if the effect, or one with
    /// equal settings, is already present.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if a command fails to send.
    pub async fn add_effect(&self, effect: Arc<dyn Effect>) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.position(&effect).is_some() {
            trace!("Effect already present");
            return Ok(false);
        }
        state.effects.push(effect);
        self.compose(&mut state).await?;
        Ok(true)
    }

    /// Removes an effect and recomposes.
    ///
    /// Matches by identity first, then by equal settings. Returns `false`
    /// without sending anything if no effect matches.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if a command fails to send.
    pub async fn remove_effect(&self, effect: &Arc<dyn Effect>) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(index) = state.position(effect) else {
            trace!("Effect not present");
            return Ok(false);
        };
        state.effects.remove(index);
        self.compose(&mut state).await?;
        Ok(true)
    }

    /// Returns `true` if the effect, or one with equal settings, is present.
    pub async fn contains_effect(&self, effect: &Arc<dyn Effect>) -> bool {
        self.state.lock().await.position(effect).is_some()
    }

    /// Returns the number of active effects.
    pub async fn effect_count(&self) -> usize {
        self.state.lock().await.effects.len()
    }

    /// Recomposes after an effect's settings were changed in place.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if a command fails to send.
    pub async fn update_effects(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.compose(&mut state).await
    }

    /// Returns the last values sent, or `None` before the first composition.
    pub async fn last_sent(&self) -> Option<EffectSnapshot> {
        let state = self.state.lock().await;
        Some(EffectSnapshot {
            temperature: state.temperature?,
            force: state.force?,
            texture: state.texture?,
        })
    }

    // ========================================================================
    // Composition
    // ========================================================================

    async fn compose(&self, state: &mut ComposerState) -> Result<()> {
        if state.effects.is_empty() {
            debug!("No active effects, stopping all modalities");
            self.broadcast(&Message::StopTemperature(HapticTarget::default()))
                .await?;
            state.temperature = Some(Temperature::default());
            self.broadcast(&Message::StopForce(HapticTarget::default()))
                .await?;
            state.force = Some(Force::default());
            self.broadcast(&Message::StopTexture(HapticTarget::default()))
                .await?;
            state.texture = Some(Texture::default());
            return Ok(());
        }

        let snapshots: Vec<EffectSnapshot> = state.effects.iter().map(|e| e.snapshot()).collect();

        let temperature = snapshots
            .iter()
            .map(|s| s.temperature)
            .find(|t| t.active)
            .unwrap_or_default();
        if state.temperature != Some(temperature) {
            self.broadcast(&temperature_message(temperature)).await?;
            state.temperature = Some(temperature);
        }

        let force = snapshots
            .iter()
            .map(|s| s.force)
            .find(|f| f.active)
            .unwrap_or_default();
        if state.force != Some(force) {
            self.broadcast(&force_message(force)).await?;
            state.force = Some(force);
        }

        let texture = snapshots
            .iter()
            .map(|s| s.texture)
            .find(|t| t.active)
            .unwrap_or_default();
        if state.texture != Some(texture) {
            self.broadcast(&texture_message(texture)).await?;
            state.texture = Some(texture);
        }

        Ok(())
    }

    async fn broadcast(&self, message: &Message) -> Result<()> {
        for target in self.targets() {
            self.sink.send(&message.clone().with_target(target)).await?;
        }
        trace!(type_id = message.type_id(), "Command broadcast");
        Ok(())
    }
}

impl fmt::Debug for HapticObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HapticObject")
            .field("hand_sides", &self.hand_sides)
            .field("actuation_points", &self.actuation_points)
            .finish_non_exhaustive()
    }
}

fn temperature_message(temperature: Temperature) -> Message {
    let target = HapticTarget::default();
    if temperature.active {
        Message::SetTemperature(SetTemperature {
            value: temperature.value(),
            target,
        })
    } else {
        Message::StopTemperature(target)
    }
}

fn force_message(force: Force) -> Message {
    let target = HapticTarget::default();
    if force.active {
        Message::SetForce(SetForce {
            values: [force.value(), 0.0, 0.0],
            target,
        })
    } else {
        Message::StopForce(target)
    }
}

fn texture_message(texture: Texture) -> Message {
    let target = HapticTarget::default();
    if texture.active {
        Message::SetTexture(SetTexture {
            index: texture.texture_type().index(),
            velocity: [0.5, 0.0, texture.velocity()],
            volume: texture.volume(),
            target,
        })
    } else {
        Message::StopTexture(target)
    }
}

// ============================================================================
// Tests
// ============================================================================
