//! Audio mixer: channels, callback sources, effects and the microphone.
//!
//! Callbacks run on the audio thread. Sources, effects and recorders are
//! handed over as `&'static mut` so the firmware may call them at any time
//! until they are removed; a `StaticCell` is the usual way to get one.
//!
//! Effect buffers hold Q8.24 fixed-point samples ([`Sample`]). Source and
//! microphone buffers hold 16-bit PCM.

use fixed::types::I8F24;

use crate::handle::{SoundChannel, SoundEffect, SoundSource};

/// Sample rate of every buffer the mixer hands out.
pub const SAMPLE_RATE: u32 = 44_100;

/// Mixer sample in an effect buffer.
pub type Sample = I8F24;

/// Generates audio on demand.
pub trait AudioSource {
    /// Fill `left` (and `right` for stereo sources) with the next samples.
    ///
    /// Return `false` when the output is silent so the mixer can skip it.
    fn render(&mut self, left: &mut [i16], right: Option<&mut [i16]>) -> bool;
}

/// Processes a channel's mixed output in place.
pub trait EffectProcessor {
    /// `active` is false when the input buffers are silent. Return `false`
    /// when the output is silent too.
    fn process(&mut self, left: &mut [Sample], right: &mut [Sample], active: bool) -> bool;
}

/// Receives microphone input.
pub trait Recorder {
    /// Return `false` to stop recording.
    fn record(&mut self, samples: &[i16]) -> bool;
}

/// Which microphone to record from.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MicSource {
    /// Headset if plugged in, internal otherwise.
    #[default]
    Autodetect = 0,
    Internal = 1,
    Headset = 2,
}

impl MicSource {
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Internal,
            2 => Self::Headset,
            _ => Self::Autodetect,
        }
    }
}

/// What is plugged into the headphone jack.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadphoneState {
    pub headphone: bool,
    pub mic: bool,
}

/// Error type for sound operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoundError {
    /// The firmware table lacks the entry point.
    Missing,
    /// The firmware could not allocate the object.
    OutOfMemory,
    /// Source, channel or effect is not attached where it was looked for.
    NotFound,
}

/// The `Sound` table with its channel and effect sub-tables.
pub trait Sound {
    /// Samples played since the audio device started.
    fn current_time(&self) -> u32;

    /// Add a callback source to the default channel.
    fn add_source<T: AudioSource + 'static>(
        &self,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError>;

    /// Detach a source from the default channel.
    fn remove_source(&self, source: SoundSource) -> Result<(), SoundError>;

    fn default_channel(&self) -> Option<SoundChannel>;

    /// Route a channel to the main mix.
    fn add_channel(&self, channel: SoundChannel) -> Result<(), SoundError>;

    fn remove_channel(&self, channel: SoundChannel) -> Result<(), SoundError>;

    /// Start feeding microphone input to `recorder`. Returns the source in use.
    fn start_recording<T: Recorder + 'static>(
        &self,
        recorder: &'static mut T,
        source: MicSource,
    ) -> Result<MicSource, SoundError>;

    fn stop_recording(&self);

    /// Current jack state. `on_change` replaces any previous watcher.
    fn headphone_state(&self, on_change: Option<fn(HeadphoneState)>) -> HeadphoneState;

    fn set_outputs_active(&self, headphone: bool, speaker: bool);

    fn new_channel(&self) -> Result<SoundChannel, SoundError>;

    fn free_channel(&self, channel: SoundChannel);

    fn channel_add_source(
        &self,
        channel: SoundChannel,
        source: SoundSource,
    ) -> Result<(), SoundError>;

    fn channel_remove_source(
        &self,
        channel: SoundChannel,
        source: SoundSource,
    ) -> Result<(), SoundError>;

    fn channel_add_callback_source<T: AudioSource + 'static>(
        &self,
        channel: SoundChannel,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError>;

    fn channel_add_effect(&self, channel: SoundChannel, effect: SoundEffect);

    fn channel_remove_effect(&self, channel: SoundChannel, effect: SoundEffect);

    /// 0.0 is silent, 1.0 is unity gain.
    fn set_channel_volume(&self, channel: SoundChannel, volume: f32);

    fn channel_volume(&self, channel: SoundChannel) -> f32;

    /// -1.0 is left, 1.0 is right.
    fn set_channel_pan(&self, channel: SoundChannel, pan: f32);

    fn new_effect<T: EffectProcessor + 'static>(
        &self,
        processor: &'static mut T,
    ) -> Result<SoundEffect, SoundError>;

    fn free_effect(&self, effect: SoundEffect);

    /// Wet/dry mix, 0.0 is dry.
    fn set_effect_mix(&self, effect: SoundEffect, level: f32);
}
