//! Recording sound table.
//!
//! Channels, routing and levels are plain state. Nothing is mixed: a test
//! pulls one source with [`SimSound::pull_source`] or runs one effect with
//! [`SimSound::run_effect`] and checks what it produced.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use playdate_core::handle::{SoundChannel, SoundEffect, SoundSource};
use playdate_core::sound::{
    AudioSource, EffectProcessor, HeadphoneState, MicSource, Recorder, Sample, Sound, SoundError,
};

struct Source {
    inner: &'static mut dyn AudioSource,
    stereo: bool,
}

struct Effect {
    inner: &'static mut dyn EffectProcessor,
    mix: f32,
}

struct Channel {
    sources: Vec<SoundSource>,
    effects: Vec<SoundEffect>,
    volume: f32,
    pan: f32,
    in_mix: bool,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            effects: Vec::new(),
            volume: 1.0,
            pan: 0.0,
            in_mix: false,
        }
    }
}

/// Host [`Sound`].
pub struct SimSound {
    now: Cell<u32>,
    next_id: Cell<usize>,
    default_channel: Option<SoundChannel>,
    channels: RefCell<BTreeMap<SoundChannel, Channel>>,
    sources: RefCell<BTreeMap<SoundSource, Source>>,
    effects: RefCell<BTreeMap<SoundEffect, Effect>>,
    recorder: RefCell<Option<&'static mut dyn Recorder>>,
    jack: Cell<HeadphoneState>,
    jack_watcher: Cell<Option<fn(HeadphoneState)>>,
    outputs: Cell<(bool, bool)>,
}

impl Default for SimSound {
    fn default() -> Self {
        let default_channel = SoundChannel::from_raw(1);
        let mut channels = BTreeMap::new();
        if let Some(channel) = default_channel {
            channels.insert(
                channel,
                Channel {
                    in_mix: true,
                    ..Channel::default()
                },
            );
        }
        Self {
            now: Cell::new(0),
            next_id: Cell::new(2),
            default_channel,
            channels: RefCell::new(channels),
            sources: RefCell::new(BTreeMap::new()),
            effects: RefCell::new(BTreeMap::new()),
            recorder: RefCell::new(None),
            jack: Cell::new(HeadphoneState::default()),
            jack_watcher: Cell::new(None),
            outputs: Cell::new((true, true)),
        }
    }
}

impl SimSound {
    /// Ask `source` for `frames` samples, as the audio callback would.
    /// Returns the left buffer, the right buffer for stereo sources, and
    /// whether the source is still playing.
    pub fn pull_source(
        &self,
        source: SoundSource,
        frames: usize,
    ) -> Option<(Vec<i16>, Option<Vec<i16>>, bool)> {
        let mut sources = self.sources.borrow_mut();
        let source = sources.get_mut(&source)?;
        let mut left = vec![0i16; frames];
        if !source.stereo {
            let playing = source.inner.render(&mut left, None);
            return Some((left, None, playing));
        }
        let mut right = vec![0i16; frames];
        let playing = source.inner.render(&mut left, Some(&mut right));
        Some((left, Some(right), playing))
    }

    /// Run `effect` over the given buffers in place. Returns whether the
    /// effect still produces output, or `None` for an unknown effect.
    pub fn run_effect(
        &self,
        effect: SoundEffect,
        left: &mut [Sample],
        right: &mut [Sample],
        active: bool,
    ) -> Option<bool> {
        let mut effects = self.effects.borrow_mut();
        let effect = effects.get_mut(&effect)?;
        Some(effect.inner.process(left, right, active))
    }

    /// Move the sound clock forward by `frames` samples.
    pub fn advance(&self, frames: u32) {
        self.now.set(self.now.get().wrapping_add(frames));
    }

    /// Sources routed to `channel`, in the order they were added.
    pub fn channel_sources(&self, channel: SoundChannel) -> Vec<SoundSource> {
        self.channels
            .borrow()
            .get(&channel)
            .map(|c| c.sources.clone())
            .unwrap_or_default()
    }

    pub fn channel_effects(&self, channel: SoundChannel) -> Vec<SoundEffect> {
        self.channels
            .borrow()
            .get(&channel)
            .map(|c| c.effects.clone())
            .unwrap_or_default()
    }

    /// Whether `channel` is in the main mix.
    pub fn is_playing(&self, channel: SoundChannel) -> bool {
        self.channels.borrow().get(&channel).is_some_and(|c| c.in_mix)
    }

    /// Feed `samples` to the active recorder. Returns whether it is still
    /// recording.
    pub fn feed_microphone(&self, samples: &[i16]) -> bool {
        let mut recorder = self.recorder.borrow_mut();
        let Some(r) = recorder.as_mut() else {
            return false;
        };
        if r.record(samples) {
            return true;
        }
        *recorder = None;
        false
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.borrow().is_some()
    }

    /// Change the jack state, notifying the watcher.
    pub fn plug(&self, state: HeadphoneState) {
        self.jack.set(state);
        if let Some(watcher) = self.jack_watcher.get() {
            watcher(state);
        }
    }

    /// Active (headphone, speaker) outputs.
    pub fn outputs(&self) -> (bool, bool) {
        self.outputs.get()
    }

    pub fn effect_mix(&self, effect: SoundEffect) -> Option<f32> {
        self.effects.borrow().get(&effect).map(|e| e.mix)
    }

    pub fn channel_pan(&self, channel: SoundChannel) -> Option<f32> {
        self.channels.borrow().get(&channel).map(|c| c.pan)
    }

    fn next_raw(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn register_source<T: AudioSource + 'static>(
        &self,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError> {
        let id = SoundSource::from_raw(self.next_raw()).ok_or(SoundError::OutOfMemory)?;
        self.sources.borrow_mut().insert(id, Source { inner: source, stereo });
        Ok(id)
    }

    fn with_channel<R>(
        &self,
        channel: SoundChannel,
        f: impl FnOnce(&mut Channel) -> Result<R, SoundError>,
    ) -> Result<R, SoundError> {
        let mut channels = self.channels.borrow_mut();
        f(channels.get_mut(&channel).ok_or(SoundError::NotFound)?)
    }
}

impl Sound for SimSound {
    fn current_time(&self) -> u32 {
        self.now.get()
    }

    fn add_source<T: AudioSource + 'static>(
        &self,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError> {
        let channel = self.default_channel.ok_or(SoundError::NotFound)?;
        self.channel_add_callback_source(channel, source, stereo)
    }

    fn remove_source(&self, source: SoundSource) -> Result<(), SoundError> {
        let channel = self.default_channel.ok_or(SoundError::NotFound)?;
        self.channel_remove_source(channel, source)
    }

    fn default_channel(&self) -> Option<SoundChannel> {
        self.default_channel
    }

    fn add_channel(&self, channel: SoundChannel) -> Result<(), SoundError> {
        self.with_channel(channel, |c| {
            c.in_mix = true;
            Ok(())
        })
    }

    fn remove_channel(&self, channel: SoundChannel) -> Result<(), SoundError> {
        self.with_channel(channel, |c| {
            if !c.in_mix {
                return Err(SoundError::NotFound);
            }
            c.in_mix = false;
            Ok(())
        })
    }

    fn start_recording<T: Recorder + 'static>(
        &self,
        recorder: &'static mut T,
        source: MicSource,
    ) -> Result<MicSource, SoundError> {
        let used = match source {
            MicSource::Autodetect if self.jack.get().mic => MicSource::Headset,
            MicSource::Autodetect => MicSource::Internal,
            MicSource::Headset if !self.jack.get().mic => return Err(SoundError::NotFound),
            other => other,
        };
        *self.recorder.borrow_mut() = Some(recorder as &'static mut dyn Recorder);
        Ok(used)
    }

    fn stop_recording(&self) {
        *self.recorder.borrow_mut() = None;
    }

    fn headphone_state(&self, on_change: Option<fn(HeadphoneState)>) -> HeadphoneState {
        self.jack_watcher.set(on_change);
        self.jack.get()
    }

    fn set_outputs_active(&self, headphone: bool, speaker: bool) {
        self.outputs.set((headphone, speaker));
    }

    fn new_channel(&self) -> Result<SoundChannel, SoundError> {
        let channel = SoundChannel::from_raw(self.next_raw()).ok_or(SoundError::OutOfMemory)?;
        self.channels.borrow_mut().insert(channel, Channel::default());
        Ok(channel)
    }

    fn free_channel(&self, channel: SoundChannel) {
        if let Some(c) = self.channels.borrow_mut().remove(&channel) {
            let mut sources = self.sources.borrow_mut();
            for source in c.sources {
                sources.remove(&source);
            }
        }
    }

    fn channel_add_source(
        &self,
        channel: SoundChannel,
        source: SoundSource,
    ) -> Result<(), SoundError> {
        if !self.sources.borrow().contains_key(&source) {
            return Err(SoundError::NotFound);
        }
        let mut channels = self.channels.borrow_mut();
        if !channels.contains_key(&channel) {
            return Err(SoundError::NotFound);
        }
        for c in channels.values_mut() {
            c.sources.retain(|s| *s != source);
        }
        if let Some(c) = channels.get_mut(&channel) {
            c.sources.push(source);
        }
        Ok(())
    }

    fn channel_remove_source(
        &self,
        channel: SoundChannel,
        source: SoundSource,
    ) -> Result<(), SoundError> {
        self.with_channel(channel, |c| {
            let before = c.sources.len();
            c.sources.retain(|s| *s != source);
            if c.sources.len() == before {
                Err(SoundError::NotFound)
            } else {
                Ok(())
            }
        })
    }

    fn channel_add_callback_source<T: AudioSource + 'static>(
        &self,
        channel: SoundChannel,
        source: &'static mut T,
        stereo: bool,
    ) -> Result<SoundSource, SoundError> {
        if !self.channels.borrow().contains_key(&channel) {
            return Err(SoundError::NotFound);
        }
        let id = self.register_source(source, stereo)?;
        self.channel_add_source(channel, id)?;
        Ok(id)
    }

    fn channel_add_effect(&self, channel: SoundChannel, effect: SoundEffect) {
        let result = self.with_channel(channel, |c| {
            if !c.effects.contains(&effect) {
                c.effects.push(effect);
            }
            Ok(())
        });
        if result.is_err() {
            log::warn!("effect added to unknown channel");
        }
    }

    fn channel_remove_effect(&self, channel: SoundChannel, effect: SoundEffect) {
        let _ = self.with_channel(channel, |c| {
            c.effects.retain(|e| *e != effect);
            Ok(())
        });
    }

    fn set_channel_volume(&self, channel: SoundChannel, volume: f32) {
        let _ = self.with_channel(channel, |c| {
            c.volume = volume.clamp(0.0, 1.0);
            Ok(())
        });
    }

    fn channel_volume(&self, channel: SoundChannel) -> f32 {
        self.channels.borrow().get(&channel).map_or(0.0, |c| c.volume)
    }

    fn set_channel_pan(&self, channel: SoundChannel, pan: f32) {
        let _ = self.with_channel(channel, |c| {
            c.pan = pan.clamp(-1.0, 1.0);
            Ok(())
        });
    }

    fn new_effect<T: EffectProcessor + 'static>(
        &self,
        processor: &'static mut T,
    ) -> Result<SoundEffect, SoundError> {
        let id = SoundEffect::from_raw(self.next_raw()).ok_or(SoundError::OutOfMemory)?;
        self.effects.borrow_mut().insert(
            id,
            Effect {
                inner: processor,
                mix: 1.0,
            },
        );
        Ok(id)
    }

    fn free_effect(&self, effect: SoundEffect) {
        self.effects.borrow_mut().remove(&effect);
        for c in self.channels.borrow_mut().values_mut() {
            c.effects.retain(|e| *e != effect);
        }
    }

    fn set_effect_mix(&self, effect: SoundEffect, level: f32) {
        if let Some(e) = self.effects.borrow_mut().get_mut(&effect) {
            e.mix = level.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant output.
    struct Dc(i16);

    impl AudioSource for Dc {
        fn render(&mut self, left: &mut [i16], right: Option<&mut [i16]>) -> bool {
            left.fill(self.0);
            if let Some(right) = right {
                right.fill(-self.0);
            }
            self.0 != 0
        }
    }

    struct Halve;

    impl EffectProcessor for Halve {
        fn process(&mut self, left: &mut [Sample], right: &mut [Sample], active: bool) -> bool {
            for s in left.iter_mut().chain(right.iter_mut()) {
                *s /= 2;
            }
            active
        }
    }

    struct Collect {
        samples: Vec<i16>,
        limit: usize,
    }

    impl Recorder for Collect {
        fn record(&mut self, samples: &[i16]) -> bool {
            self.samples.extend_from_slice(samples);
            self.samples.len() < self.limit
        }
    }

    fn leak<T>(value: T) -> &'static mut T {
        Box::leak(Box::new(value))
    }

    #[test]
    fn test_pull_sources() {
        let sound = SimSound::default();
        let mono = sound.add_source(leak(Dc(1000)), false).unwrap();
        assert_eq!(sound.pull_source(mono, 3), Some((vec![1000; 3], None, true)));

        let channel = sound.new_channel().unwrap();
        let stereo = sound
            .channel_add_callback_source(channel, leak(Dc(200)), true)
            .unwrap();
        assert_eq!(sound.channel_sources(channel), [stereo]);
        assert!(!sound.is_playing(channel));
        sound.add_channel(channel).unwrap();
        assert!(sound.is_playing(channel));

        let (left, right, playing) = sound.pull_source(stereo, 2).unwrap();
        assert_eq!(left, [200, 200]);
        assert_eq!(right, Some(vec![-200, -200]));
        assert!(playing);

        let silent = sound.add_source(leak(Dc(0)), false).unwrap();
        assert_eq!(sound.pull_source(silent, 1).map(|p| p.2), Some(false));

        assert_eq!(sound.current_time(), 0);
        sound.advance(44_100);
        assert_eq!(sound.current_time(), 44_100);
    }

    #[test]
    fn test_levels_and_effects() {
        let sound = SimSound::default();
        let channel = sound.default_channel().unwrap();

        sound.set_channel_volume(channel, 1.5);
        sound.set_channel_pan(channel, -0.25);
        assert_eq!(sound.channel_volume(channel), 1.0);
        assert_eq!(sound.channel_pan(channel), Some(-0.25));

        let effect = sound.new_effect(leak(Halve)).unwrap();
        sound.channel_add_effect(channel, effect);
        sound.channel_add_effect(channel, effect);
        assert_eq!(sound.channel_effects(channel), [effect]);

        sound.set_effect_mix(effect, 0.5);
        assert_eq!(sound.effect_mix(effect), Some(0.5));

        let mut left = [Sample::from_num(1); 2];
        let mut right = [Sample::from_num(-1); 2];
        assert_eq!(sound.run_effect(effect, &mut left, &mut right, true), Some(true));
        assert_eq!(left, [Sample::from_num(0.5); 2]);
        assert_eq!(right, [Sample::from_num(-0.5); 2]);

        sound.free_effect(effect);
        assert!(sound.channel_effects(channel).is_empty());
        assert_eq!(sound.run_effect(effect, &mut left, &mut right, true), None);
    }

    #[test]
    fn test_source_routing() {
        let sound = SimSound::default();
        let source = sound.add_source(leak(Dc(10)), false).unwrap();
        let channel = sound.new_channel().unwrap();

        sound.channel_add_source(channel, source).unwrap();
        assert_eq!(sound.remove_source(source), Err(SoundError::NotFound));
        sound.channel_remove_source(channel, source).unwrap();

        assert_eq!(sound.remove_channel(channel), Err(SoundError::NotFound));
        sound.free_channel(channel);
        assert_eq!(sound.add_channel(channel), Err(SoundError::NotFound));
    }

    #[test]
    fn test_recording() {
        let sound = SimSound::default();
        let used = sound
            .start_recording(leak(Collect { samples: Vec::new(), limit: 4 }), MicSource::Autodetect)
            .unwrap();
        assert_eq!(used, MicSource::Internal);
        assert!(sound.feed_microphone(&[1, 2]));
        assert!(!sound.feed_microphone(&[3, 4]));
        assert!(!sound.is_recording());

        assert_eq!(
            sound.start_recording(leak(Collect { samples: Vec::new(), limit: 1 }), MicSource::Headset),
            Err(SoundError::NotFound)
        );
    }

    static PLUGGED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

    fn on_jack(state: HeadphoneState) {
        PLUGGED.store(state.headphone, std::sync::atomic::Ordering::Relaxed);
    }

    #[test]
    fn test_headphones() {
        let sound = SimSound::default();
        assert_eq!(sound.headphone_state(Some(on_jack)), HeadphoneState::default());
        sound.plug(HeadphoneState {
            headphone: true,
            mic: true,
        });
        assert!(PLUGGED.load(std::sync::atomic::Ordering::Relaxed));

        let used = sound
            .start_recording(leak(Collect { samples: Vec::new(), limit: 1 }), MicSource::Autodetect)
            .unwrap();
        assert_eq!(used, MicSource::Headset);

        sound.set_outputs_active(true, false);
        assert_eq!(sound.outputs(), (true, false));
    }
}
