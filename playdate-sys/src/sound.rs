//! `playdate_sound` with its channel and effect sub-tables.
//!
//! The remaining sub-tables (file player, sampler, synth, sequencer and the
//! modulation sources) are declared opaque.

use core::ffi::{c_int, c_void};

use crate::{PDSynthSignalValue, SoundChannel, SoundEffect, SoundSource};

opaque!(
    playdate_sound_fileplayer,
    playdate_sound_sample,
    playdate_sound_sampleplayer,
    playdate_sound_synth,
    playdate_sound_sequence,
    playdate_sound_lfo,
    playdate_sound_envelope,
    playdate_sound_source,
    playdate_control_signal,
    playdate_sound_track,
    playdate_sound_instrument,
    playdate_sound_signal,
    playdate_sound_effect_twopolefilter,
    playdate_sound_effect_onepolefilter,
    playdate_sound_effect_bitcrusher,
    playdate_sound_effect_ringmodulator,
    playdate_sound_effect_delayline,
    playdate_sound_effect_overdrive,
);

pub type MicSource = c_int;
pub const kMicInputAutodetect: MicSource = 0;
pub const kMicInputInternal: MicSource = 1;
pub const kMicInputHeadset: MicSource = 2;

/// Fill `len` samples. Return 0 if the output is silent.
pub type AudioSourceFunction =
    unsafe extern "C" fn(context: *mut c_void, left: *mut i16, right: *mut i16, len: c_int) -> c_int;

/// Receive `length` microphone samples. Return 0 to stop recording.
pub type RecordCallback =
    unsafe extern "C" fn(context: *mut c_void, buffer: *mut i16, length: c_int) -> c_int;

/// Process Q8.24 samples in place. Return 0 if the output is silent.
pub type effectProc = unsafe extern "C" fn(
    e: *mut SoundEffect,
    left: *mut i32,
    right: *mut i32,
    nsamples: c_int,
    bufactive: c_int,
) -> c_int;

pub type HeadphoneChangeCallback = unsafe extern "C" fn(headphone: c_int, mic: c_int);

#[repr(C)]
pub struct playdate_sound_channel {
    pub newChannel: Option<unsafe extern "C" fn() -> *mut SoundChannel>,
    pub freeChannel: Option<unsafe extern "C" fn(channel: *mut SoundChannel)>,
    pub addSource:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel, source: *mut SoundSource) -> c_int>,
    pub removeSource:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel, source: *mut SoundSource) -> c_int>,
    pub addCallbackSource: Option<
        unsafe extern "C" fn(
            channel: *mut SoundChannel,
            callback: Option<AudioSourceFunction>,
            context: *mut c_void,
            stereo: c_int,
        ) -> *mut SoundSource,
    >,
    pub addEffect: Option<unsafe extern "C" fn(channel: *mut SoundChannel, effect: *mut SoundEffect)>,
    pub removeEffect:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel, effect: *mut SoundEffect)>,
    pub setVolume: Option<unsafe extern "C" fn(channel: *mut SoundChannel, volume: f32)>,
    pub getVolume: Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> f32>,
    pub setVolumeModulator:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel, m: *mut PDSynthSignalValue)>,
    pub getVolumeModulator:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> *mut PDSynthSignalValue>,
    pub setPan: Option<unsafe extern "C" fn(channel: *mut SoundChannel, pan: f32)>,
    pub setPanModulator:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel, m: *mut PDSynthSignalValue)>,
    pub getPanModulator:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> *mut PDSynthSignalValue>,
    pub getDryLevelSignal:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> *mut PDSynthSignalValue>,
    pub getWetLevelSignal:
        Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> *mut PDSynthSignalValue>,
}

#[repr(C)]
pub struct playdate_sound_effect {
    pub newEffect:
        Option<unsafe extern "C" fn(proc_: Option<effectProc>, userdata: *mut c_void) -> *mut SoundEffect>,
    pub freeEffect: Option<unsafe extern "C" fn(effect: *mut SoundEffect)>,
    pub setMix: Option<unsafe extern "C" fn(effect: *mut SoundEffect, level: f32)>,
    pub setMixModulator:
        Option<unsafe extern "C" fn(effect: *mut SoundEffect, signal: *mut PDSynthSignalValue)>,
    pub getMixModulator:
        Option<unsafe extern "C" fn(effect: *mut SoundEffect) -> *mut PDSynthSignalValue>,
    pub setUserdata: Option<unsafe extern "C" fn(effect: *mut SoundEffect, userdata: *mut c_void)>,
    pub getUserdata: Option<unsafe extern "C" fn(effect: *mut SoundEffect) -> *mut c_void>,

    pub twopolefilter: *const playdate_sound_effect_twopolefilter,
    pub onepolefilter: *const playdate_sound_effect_onepolefilter,
    pub bitcrusher: *const playdate_sound_effect_bitcrusher,
    pub ringmodulator: *const playdate_sound_effect_ringmodulator,
    pub delayline: *const playdate_sound_effect_delayline,
    pub overdrive: *const playdate_sound_effect_overdrive,
}

#[repr(C)]
pub struct playdate_sound {
    pub channel: *const playdate_sound_channel,
    pub fileplayer: *const playdate_sound_fileplayer,
    pub sample: *const playdate_sound_sample,
    pub sampleplayer: *const playdate_sound_sampleplayer,
    pub synth: *const playdate_sound_synth,
    pub sequence: *const playdate_sound_sequence,
    pub effect: *const playdate_sound_effect,
    pub lfo: *const playdate_sound_lfo,
    pub envelope: *const playdate_sound_envelope,
    pub source: *const playdate_sound_source,
    pub controlsignal: *const playdate_control_signal,
    pub track: *const playdate_sound_track,
    pub instrument: *const playdate_sound_instrument,

    pub getCurrentTime: Option<unsafe extern "C" fn() -> u32>,
    pub addSource: Option<
        unsafe extern "C" fn(
            callback: Option<AudioSourceFunction>,
            context: *mut c_void,
            stereo: c_int,
        ) -> *mut SoundSource,
    >,
    pub getDefaultChannel: Option<unsafe extern "C" fn() -> *mut SoundChannel>,
    pub addChannel: Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> c_int>,
    pub removeChannel: Option<unsafe extern "C" fn(channel: *mut SoundChannel) -> c_int>,
    pub setMicCallback: Option<
        unsafe extern "C" fn(
            callback: Option<RecordCallback>,
            context: *mut c_void,
            source: MicSource,
        ) -> c_int,
    >,
    pub getHeadphoneState: Option<
        unsafe extern "C" fn(
            headphone: *mut c_int,
            headsetmic: *mut c_int,
            change_callback: Option<HeadphoneChangeCallback>,
        ),
    >,
    pub setOutputsActive: Option<unsafe extern "C" fn(headphone: c_int, speaker: c_int)>,
    pub removeSource: Option<unsafe extern "C" fn(source: *mut SoundSource) -> c_int>,
    pub signal: *const playdate_sound_signal,
}
