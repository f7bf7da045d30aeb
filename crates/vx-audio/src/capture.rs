use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};

use crate::error::AudioError;

/// Capture micro via cpal.
///
/// Écrit des samples f32 mono dans un ring buffer lock-free. La ressource
/// matérielle est détenue exclusivement par cette poignée : drop arrête le
/// stream et relâche le périphérique, sur tous les chemins de sortie.
///
/// `cpal::Stream` n'étant pas `Send`, la poignée doit vivre sur le thread
/// qui l'a créée ; le moteur la construit directement dans son thread de
/// scoring et remonte l'échec d'acquisition par canal.
///
/// # Example
/// ```no_run
/// use vx_audio::capture::MicCapture;
/// let capture = MicCapture::start_default().unwrap();
/// ```
pub struct MicCapture {
    stream: cpal::Stream,
    consumer: Consumer<f32>,
    sample_rate: u32,
    failed: Arc<AtomicBool>,
}

impl MicCapture {
    /// Start capturing from the default input device.
    ///
    /// # Errors
    /// Returns `AudioError::NoInputDevice` if no microphone is available or
    /// permission is denied, and a stream error if the stream cannot be
    /// built or started.
    pub fn start_default() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::InputConfig(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        // Ring buffer: 2 seconds of audio @ sample_rate
        let buf_size = sample_rate as usize * 2;
        let (mut producer, consumer) = RingBuffer::new(buf_size);

        let failed = Arc::new(AtomicBool::new(false));
        let failed_cb = Arc::clone(&failed);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Downmix to mono and push into ring buffer
                    for chunk in data.chunks(channels) {
                        let mono: f32 = chunk.iter().sum::<f32>() / channels as f32;
                        let _ = producer.push(mono);
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {err}");
                    failed_cb.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        Ok(Self {
            stream,
            consumer,
            sample_rate,
            failed,
        })
    }

    /// Reference to the underlying cpal stream (kept alive for capture).
    pub fn stream(&self) -> &cpal::Stream {
        &self.stream
    }

    /// Drain available samples from the ring buffer, appending to `out`.
    ///
    /// The caller keeps only the tail it needs; nothing is buffered beyond
    /// one in-flight frame. Returns how many samples were read.
    pub fn read_samples(&mut self, out: &mut Vec<f32>) -> usize {
        let available = self.consumer.slots();
        out.reserve(available);
        let mut count = 0;
        while let Ok(sample) = self.consumer.pop() {
            out.push(sample);
            count += 1;
        }
        count
    }

    /// `true` si le stream a signalé une erreur (perte du périphérique en
    /// cours de session). La boucle de scoring s'arrête proprement dessus.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    /// The sample rate of the capture stream.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
