//! Mixer, callback sources, effects and the microphone.
//!
//! Every callback here runs on the firmware's audio thread. The wrapped
//! objects arrive as `&'static mut` and are reached again through the
//! context pointer the firmware hands back.

use core::ffi::{c_int, c_void};
use core::sync::atomic::{AtomicPtr, Ordering};

use ::playdate_sys as sys;
use playdate_core::handle::{SoundChannel, SoundEffect, SoundSource};
use playdate_core::sound::{
    AudioSource, EffectProcessor, HeadphoneState, MicSource, Recorder, Sample, Sound, SoundError,
};
use sys::{playdate_sound, playdate_sound_channel, playdate_sound_effect};

use crate::ffi::{flag, invoke, RawHandle};

// Effect buffers are handed over as `Sample` slices.
const _: () = assert!(core::mem::size_of::<Sample>() == core::mem::size_of::<i32>());
const _: () = assert!(core::mem::align_of::<Sample>() == core::mem::align_of::<i32>());

/// Effect table used by the effect trampoline to find its processor.
static EFFECT_TABLE: AtomicPtr<playdate_sound_effect> = AtomicPtr::new(core::ptr::null_mut());

/// Current headphone watcher, a `fn(HeadphoneState)` or null.
static HEADPHONE_WATCHER: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

unsafe extern "C" fn source_trampoline<T: AudioSource>(
    context: *mut c_void,
    left: *mut i16,
    right: *mut i16,
    len: c_int,
) -> c_int {
    // SAFETY: `context` is the `&'static mut T` given to `add_source`.
    let Some(source) = (unsafe { context.cast::<T>().as_mut() }) else {
        return 0;
    };
    let len = len.max(0) as usize;
    if left.is_null() {
        return 0;
    }
    // SAFETY: the firmware passes `len` samples per side, and a null right
    // buffer for mono sources.
    let left = unsafe { core::slice::from_raw_parts_mut(left, len) };
    let right = (!right.is_null()).then(|| unsafe { core::slice::from_raw_parts_mut(right, len) });
    flag(source.render(left, right))
}

unsafe extern "C" fn effect_trampoline<T: EffectProcessor>(
    effect: *mut sys::SoundEffect,
    left: *mut i32,
    right: *mut i32,
    nsamples: c_int,
    bufactive: c_int,
) -> c_int {
    // SAFETY: stored from a `&'static playdate_sound_effect` in `new_effect`.
    let Some(table) = (unsafe { EFFECT_TABLE.load(Ordering::Acquire).as_ref() }) else {
        return 0;
    };
    // SAFETY: firmware entry point, called with the effect it passed us.
    let userdata = table.getUserdata.map(|get| unsafe { get(effect) });
    // SAFETY: userdata is the `&'static mut T` given to `new_effect`.
    let Some(processor) = userdata.and_then(|ud| unsafe { ud.cast::<T>().as_mut() }) else {
        return 0;
    };
    if left.is_null() || right.is_null() {
        return 0;
    }
    let len = nsamples.max(0) as usize;
    // SAFETY: both buffers hold `nsamples` Q8.24 samples and `Sample` has
    // the layout of `i32`.
    let (left, right) = unsafe {
        (
            core::slice::from_raw_parts_mut(left.cast::<Sample>(), len),
            core::slice::from_raw_parts_mut(right.cast::<Sample>(), len),
        )
    };
    flag(processor.process(left, right, bufactive != 0))
}

unsafe extern "C" fn record_trampoline<T: Recorder>(
    context: *mut c_void,
    buffer: *mut i16,
    length: c_int,
) -> c_int {
    // SAFETY: `context` is the `&'static mut T` given to `start_recording`.
    let Some(recorder) = (unsafe { context.cast::<T>().as_mut() }) else {
        return 0;
    };
    if buffer.is_null() {
        return 0;
    }
    // SAFETY: the firmware passes `length` mono samples.
    let samples = unsafe { core::slice::from_raw_parts(buffer, length.max(0) as usize) };
    flag(recorder.record(samples))
}

unsafe extern "C" fn headphone_trampoline(headphone: c_int, mic: c_int) {
    let watcher = HEADPHONE_WATCHER.load(Ordering::Acquire);
    if watcher.is_null() {
        return;
    }
    // SAFETY: only `headphone_state` stores here, always a `fn(HeadphoneState)`.
    let watcher = unsafe { core::mem::transmute::<*mut (), fn(HeadphoneState)>(watcher) };
    watcher(HeadphoneState {
        headphone: headphone != 0,
        mic: mic != 0,
    });
}

fn context<T>(object: &'static mut T) -> *mut c_void {
    core::ptr::from_mut(object).cast()
}

fn removed(result: Option<c_int>) -> Result<(), SoundError> {
    match result {
        None => Err(SoundError::Missing),
        Some(0) => Err(SoundError::NotFound),
        Some(_) => Ok(()),
    }
}

/// [`Sound`] over `playdate_sound` and its channel and effect tables.
#[derive(Clone, Copy)]
pub struct DeviceSound {
    table: &'static playdate_sound,
    channel: &'static playdate_sound_channel,
    effect: &'static playdate_sound_effect,
}

impl DeviceSound {
    pub(crate) fn new(
        table: &'static playdate_sound,
        channel: &'static playdate_sound_channel,
        effect: &'static playdate_sound_effect,
    ) -> Self {
        Self {
            table,
            channel,
            effect,
        }
    }

    fn source(ptr: Option<*mut sys::SoundSource>) -> Result<SoundSource, SoundError> {
        SoundSource::from_ptr(ptr.ok_or(SoundError::Missing)?).ok_or(SoundError::OutOfMemory)
    }
}

impl Sound for DeviceSound {
    fn current_time(&self) -> u32 {
        invoke!(self.table, getCurrentTime()).unwrap_or_default()
    }

    fn add_source<T: AudioSource + 'static>(
        &self,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError> {
        Self::source(invoke!(
            self.table,
            addSource(Some(source_trampoline::<T>), context(source), flag(stereo))
        ))
    }

    fn remove_source(&self, source: SoundSource) -> Result<(), SoundError> {
        removed(invoke!(self.table, removeSource(source.as_ptr())))
    }

    fn default_channel(&self) -> Option<SoundChannel> {
        SoundChannel::from_ptr(invoke!(self.table, getDefaultChannel())?)
    }

    fn add_channel(&self, channel: SoundChannel) -> Result<(), SoundError> {
        removed(invoke!(self.table, addChannel(channel.as_ptr())))
    }

    fn remove_channel(&self, channel: SoundChannel) -> Result<(), SoundError> {
        removed(invoke!(self.table, removeChannel(channel.as_ptr())))
    }

    fn start_recording<T: Recorder + 'static>(
        &self,
        recorder: &'static mut T,
        source: MicSource,
    ) -> Result<MicSource, SoundError> {
        let used = invoke!(
            self.table,
            setMicCallback(Some(record_trampoline::<T>), context(recorder), source as c_int)
        )
        .ok_or(SoundError::Missing)?;
        if used < 0 {
            return Err(SoundError::NotFound);
        }
        Ok(MicSource::from_raw(used))
    }

    fn stop_recording(&self) {
        invoke!(
            self.table,
            setMicCallback(None, core::ptr::null_mut(), sys::kMicInputAutodetect)
        );
    }

    fn headphone_state(&self, on_change: Option<fn(HeadphoneState)>) -> HeadphoneState {
        let watcher = on_change.map_or(core::ptr::null_mut(), |f| f as *mut ());
        HEADPHONE_WATCHER.store(watcher, Ordering::Release);
        let callback = on_change.map(|_| headphone_trampoline as sys::HeadphoneChangeCallback);
        let (mut headphone, mut mic) = (0, 0);
        invoke!(self.table, getHeadphoneState(&mut headphone, &mut mic, callback));
        HeadphoneState {
            headphone: headphone != 0,
            mic: mic != 0,
        }
    }

    fn set_outputs_active(&self, headphone: bool, speaker: bool) {
        invoke!(self.table, setOutputsActive(flag(headphone), flag(speaker)));
    }

    fn new_channel(&self) -> Result<SoundChannel, SoundError> {
        let channel = invoke!(self.channel, newChannel()).ok_or(SoundError::Missing)?;
        SoundChannel::from_ptr(channel).ok_or(SoundError::OutOfMemory)
    }

    fn free_channel(&self, channel: SoundChannel) {
        invoke!(self.channel, freeChannel(channel.as_ptr()));
    }

    fn channel_add_source(
        &self,
        channel: SoundChannel,
        source: SoundSource,
    ) -> Result<(), SoundError> {
        removed(invoke!(self.channel, addSource(channel.as_ptr(), source.as_ptr())))
    }

    fn channel_remove_source(
        &self,
        channel: SoundChannel,
        source: SoundSource,
    ) -> Result<(), SoundError> {
        removed(invoke!(self.channel, removeSource(channel.as_ptr(), source.as_ptr())))
    }

    fn channel_add_callback_source<T: AudioSource + 'static>(
        &self,
        channel: SoundChannel,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError> {
        Self::source(invoke!(
            self.channel,
            addCallbackSource(
                channel.as_ptr(),
                Some(source_trampoline::<T>),
                context(source),
                flag(stereo),
            )
        ))
    }

    fn channel_add_effect(&self, channel: SoundChannel, effect: SoundEffect) {
        invoke!(self.channel, addEffect(channel.as_ptr(), effect.as_ptr()));
    }

    fn channel_remove_effect(&self, channel: SoundChannel, effect: SoundEffect) {
        invoke!(self.channel, removeEffect(channel.as_ptr(), effect.as_ptr()));
    }

    fn set_channel_volume(&self, channel: SoundChannel, volume: f32) {
        invoke!(self.channel, setVolume(channel.as_ptr(), volume));
    }

    fn channel_volume(&self, channel: SoundChannel) -> f32 {
        invoke!(self.channel, getVolume(channel.as_ptr())).unwrap_or_default()
    }

    fn set_channel_pan(&self, channel: SoundChannel, pan: f32) {
        invoke!(self.channel, setPan(channel.as_ptr(), pan));
    }

    fn new_effect<T: EffectProcessor + 'static>(
        &self,
        processor: &'static mut T,
    ) -> Result<SoundEffect, SoundError> {
        EFFECT_TABLE.store(core::ptr::from_ref(self.effect).cast_mut(), Ordering::Release);
        let effect = invoke!(
            self.effect,
            newEffect(Some(effect_trampoline::<T>), context(processor))
        )
        .ok_or(SoundError::Missing)?;
        SoundEffect::from_ptr(effect).ok_or(SoundError::OutOfMemory)
    }

    fn free_effect(&self, effect: SoundEffect) {
        invoke!(self.effect, freeEffect(effect.as_ptr()));
    }

    fn set_effect_mix(&self, effect: SoundEffect, level: f32) {
        invoke!(self.effect, setMix(effect.as_ptr(), level));
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use std::boxed::Box;

    struct Square {
        phase: i16,
    }

    impl AudioSource for Square {
        fn render(&mut self, left: &mut [i16], right: Option<&mut [i16]>) -> bool {
            for s in left.iter_mut() {
                self.phase = -self.phase;
                *s = self.phase;
            }
            if let Some(right) = right {
                right.copy_from_slice(left);
            }
            true
        }
    }

    struct Halve;

    impl EffectProcessor for Halve {
        fn process(&mut self, left: &mut [Sample], right: &mut [Sample], _active: bool) -> bool {
            for s in left.iter_mut().chain(right.iter_mut()) {
                *s /= 2;
            }
            true
        }
    }

    std::thread_local! {
        static SOURCE: Cell<Option<(sys::AudioSourceFunction, usize)>> = const { Cell::new(None) };
        static EFFECT: Cell<Option<(sys::effectProc, usize)>> = const { Cell::new(None) };
        static PLUGGED: Cell<Option<HeadphoneState>> = const { Cell::new(None) };
    }

    unsafe extern "C" fn add_source(
        callback: Option<sys::AudioSourceFunction>,
        context: *mut c_void,
        _stereo: c_int,
    ) -> *mut sys::SoundSource {
        SOURCE.with(|s| s.set(Some((callback.unwrap(), context as usize))));
        0x10 as *mut sys::SoundSource
    }

    unsafe extern "C" fn remove_source(_source: *mut sys::SoundSource) -> c_int {
        0
    }

    unsafe extern "C" fn new_effect(
        proc_: Option<sys::effectProc>,
        userdata: *mut c_void,
    ) -> *mut sys::SoundEffect {
        EFFECT.with(|e| e.set(Some((proc_.unwrap(), userdata as usize))));
        0x20 as *mut sys::SoundEffect
    }

    unsafe extern "C" fn get_userdata(_effect: *mut sys::SoundEffect) -> *mut c_void {
        EFFECT.with(|e| e.get().map_or(core::ptr::null_mut(), |(_, ud)| ud as *mut c_void))
    }

    unsafe extern "C" fn get_headphone_state(
        headphone: *mut c_int,
        mic: *mut c_int,
        change: Option<sys::HeadphoneChangeCallback>,
    ) {
        unsafe {
            *headphone = 1;
            *mic = 0;
        }
        if let Some(change) = change {
            unsafe { change(1, 1) };
        }
    }

    fn on_plug(state: HeadphoneState) {
        PLUGGED.with(|p| p.set(Some(state)));
    }

    fn sound() -> DeviceSound {
        // SAFETY: optional function pointers and raw sub-table pointers;
        // zero is None and null.
        let mut table: playdate_sound = unsafe { core::mem::zeroed() };
        table.addSource = Some(add_source);
        table.removeSource = Some(remove_source);
        table.getHeadphoneState = Some(get_headphone_state);
        // SAFETY: as above.
        let channel: playdate_sound_channel = unsafe { core::mem::zeroed() };
        // SAFETY: as above.
        let mut effect: playdate_sound_effect = unsafe { core::mem::zeroed() };
        effect.newEffect = Some(new_effect);
        effect.getUserdata = Some(get_userdata);
        DeviceSound::new(
            Box::leak(Box::new(table)),
            Box::leak(Box::new(channel)),
            Box::leak(Box::new(effect)),
        )
    }

    #[test]
    fn test_callback_source() {
        let square = Box::leak(Box::new(Square { phase: 100 }));
        let handle = sound().add_source(square, true).unwrap();
        assert_eq!(handle.raw(), 0x10);

        let (render, context) = SOURCE.with(Cell::get).unwrap();
        let (mut left, mut right) = ([0i16; 4], [0i16; 4]);
        let active =
            unsafe { render(context as *mut c_void, left.as_mut_ptr(), right.as_mut_ptr(), 4) };
        assert_eq!(active, 1);
        assert_eq!(left, [-100, 100, -100, 100]);
        assert_eq!(right, left);

        // Mono sources get a null right buffer
        let active =
            unsafe { render(context as *mut c_void, left.as_mut_ptr(), core::ptr::null_mut(), 2) };
        assert_eq!(active, 1);
    }

    #[test]
    fn test_effect_sees_fixed_samples() {
        let sound = sound();
        let effect = sound.new_effect(Box::leak(Box::new(Halve))).unwrap();
        assert_eq!(effect.raw(), 0x20);

        let (process, _) = EFFECT.with(Cell::get).unwrap();
        let mut left = [Sample::ONE.to_bits(), (-Sample::ONE).to_bits()];
        let mut right = [Sample::from_num(3).to_bits(); 2];
        let active = unsafe {
            process(
                effect.as_ptr(),
                left.as_mut_ptr(),
                right.as_mut_ptr(),
                2,
                1,
            )
        };
        assert_eq!(active, 1);
        assert_eq!(Sample::from_bits(left[0]), Sample::from_num(0.5));
        assert_eq!(Sample::from_bits(left[1]), Sample::from_num(-0.5));
        assert_eq!(Sample::from_bits(right[0]), Sample::from_num(1.5));
    }

    #[test]
    fn test_remove_unknown_source() {
        let source = SoundSource::from_raw(0x10).unwrap();
        assert_eq!(sound().remove_source(source), Err(SoundError::NotFound));
        let channel = SoundChannel::from_raw(1).unwrap();
        assert_eq!(sound().add_channel(channel), Err(SoundError::Missing));
    }

    #[test]
    fn test_headphone_watcher() {
        let state = sound().headphone_state(Some(on_plug));
        assert_eq!(
            state,
            HeadphoneState {
                headphone: true,
                mic: false
            }
        );
        assert_eq!(
            PLUGGED.with(Cell::get),
            Some(HeadphoneState {
                headphone: true,
                mic: true
            })
        );
    }
}
