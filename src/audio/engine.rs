// Moteur audio - Callback CPAL temps-réel
//
// # Format Support
//
// Le moteur supporte plusieurs formats de sample :
// - **F32**: Floating point 32-bit (natif, pas de conversion nécessaire)
// - **I16**: Signed 16-bit integer (commun sur Windows/WASAPI)
// - **U16**: Unsigned 16-bit integer (moins courant)
//
// Les clicks sont rendus en f32 mono puis copiés dans chaque canal du device
// au moment de l'écriture (sans allocation).
//
// # Clock
//
// The callback owns the `ClickRenderer`, which advances the shared
// `SampleClock` once per block. That counter is the time base every onset is
// scheduled against.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use crate::audio::device::AudioDeviceManager;
use crate::audio::format_conversion::fill_interleaved;
use crate::audio::parameters::SharedVolume;
use crate::audio::status::{AtomicDeviceStatus, DeviceStatus};
use crate::audio::timing::SampleClock;
use crate::config::EngineConfig;
use crate::error::{MetronomeError, Result};
use crate::messaging::channels::create_click_channel;
use crate::synth::click::ClickSynthesizer;
use crate::synth::voice::ClickRenderer;

/// Something that has to be running before clicks can be heard
pub trait OutputDevice {
    /// Make sure audio is flowing. Called on every `start`.
    fn resume(&mut self) -> Result<()>;
}

/// cpal output stream rendering scheduled clicks
pub struct AudioEngine {
    _device: Device,
    stream: Stream,
    device_name: String,
    sample_rate: f32,
    channels: usize,
    status: AtomicDeviceStatus,
}

impl AudioEngine {
    /// Open the configured output device and build a (paused) stream
    ///
    /// Returns the engine together with the clock it drives and the producer
    /// side of its click queue.
    pub fn open(config: &EngineConfig, volume: SharedVolume) -> Result<(Self, SampleClock, ClickSynthesizer)> {
        let manager = AudioDeviceManager::new();
        let device = manager.output_device(config.output_device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported_config = device
            .default_output_config()
            .map_err(|e| MetronomeError::AudioConfig(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let stream_config: StreamConfig = supported_config.into();

        log::info!(
            "Audio device: {} ({} Hz, {} channels, {:?})",
            device_name,
            sample_rate,
            channels,
            sample_format
        );

        let clock = SampleClock::new(sample_rate);
        let (producer, consumer) = create_click_channel(config.click_queue_capacity);
        let renderer = ClickRenderer::new(
            consumer,
            clock.clone(),
            volume,
            config.volume_smoothing_ms,
            config.max_voices,
        );

        let status = AtomicDeviceStatus::new(DeviceStatus::Idle);

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &stream_config, channels, renderer, status.clone())
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &stream_config, channels, renderer, status.clone())
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &stream_config, channels, renderer, status.clone())
            }
            other => return Err(MetronomeError::UnsupportedSampleFormat(format!("{:?}", other))),
        }?;

        let engine = Self {
            _device: device,
            stream,
            device_name,
            sample_rate,
            channels,
            status,
        };

        Ok((engine, clock, ClickSynthesizer::new(producer)))
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn status(&self) -> DeviceStatus {
        self.status.get()
    }

    /// Build an output stream for any sample type (f32, i16, u16)
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut renderer: ClickRenderer,
        status: AtomicDeviceStatus,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No allocations, No I/O, No blocking locks
                    renderer.begin_block();
                    fill_interleaved(data, channels, || renderer.next_sample());
                    renderer.end_block();
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // Runs outside the audio callback, logging is fine here
                    log::error!("Audio stream error: {}", err);
                    status.set(DeviceStatus::Error);
                },
                None,
            )
            .map_err(|e| MetronomeError::StreamBuild(e.to_string()))
    }
}

impl OutputDevice for AudioEngine {
    fn resume(&mut self) -> Result<()> {
        if self.status.get() == DeviceStatus::Playing {
            return Ok(());
        }
        self.stream
            .play()
            .map_err(|e| MetronomeError::StreamPlay(e.to_string()))?;
        self.status.set(DeviceStatus::Playing);
        log::info!("Audio output running on {}", self.device_name);
        Ok(())
    }
}
