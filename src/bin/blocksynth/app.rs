//! Demo runner: audio stream setup and the note schedule

use std::time::Duration;

use blocksynth::io::BlockStream;
use blocksynth::synth::SynthMessage;
use blocksynth::{ParamId, Polysynth, SynthConfig};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

pub struct Demo {
    config: SynthConfig,
    params: Vec<(ParamId, f32)>,
    chord_seconds: f32,
}

impl Demo {
    pub fn new(config: SynthConfig) -> Self {
        Self {
            config,
            params: Vec::new(),
            chord_seconds: 2.0,
        }
    }

    /// Set a parameter before playback starts.
    pub fn param(mut self, id: ParamId, value: f32) -> Self {
        self.params.push((id, value));
        self
    }

    pub fn chord_seconds(mut self, seconds: f32) -> Self {
        self.chord_seconds = seconds;
        self
    }

    /// Play `chords` in order, `repeats` times, then release and let the tail ring.
    pub fn run(mut self, chords: &[&[u8]], repeats: usize) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        self.config.sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        tracing::info!(sample_rate = self.config.sample_rate, channels, "opened output device");

        let mut synth = Polysynth::new(self.config.clone()).wrap_err("failed to build synth")?;
        for &(id, value) in &self.params {
            synth.set_param(id, value);
        }
        let mut controls = synth.control_sender();

        let mut stream_out = BlockStream::new();
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                stream_out.fill_interleaved(data, channels, |block| synth.process(block));
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let hold = Duration::from_secs_f32(self.chord_seconds);
        for _ in 0..repeats {
            for chord in chords {
                for &note in chord.iter() {
                    controls.try_send(SynthMessage::NoteOn { note, velocity: 96 });
                }
                std::thread::sleep(hold);
                for &note in chord.iter() {
                    controls.try_send(SynthMessage::NoteOff { note });
                }
            }
        }

        controls.try_send(SynthMessage::AllNotesOff);
        std::thread::sleep(Duration::from_secs(3));
        if controls.dropped() > 0 {
            tracing::warn!(dropped = controls.dropped(), "control messages were dropped");
        }
        Ok(())
    }
}
