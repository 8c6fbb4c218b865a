//! Duplex cpal transport.
//!
//! Opens an input and an output stream and joins them through a lock-free
//! SPSC ring: the input callback pushes converted samples, the output
//! callback pops one block, runs the looper callback on it and writes the
//! result to the device. The looper callback therefore runs on the output
//! device's real-time thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    BufferSize, Device, FromSample, HostId, Sample, SampleFormat, SampleRate, SizedSample, Stream,
    StreamConfig,
};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

use looper_core::models::audio_models::{BlockStatus, DeviceInfo};
use looper_core::models::config::{Latency, StreamConfiguration};
use looper_core::models::error::LooperError;
use looper_core::traits::transport::{AudioTransport, BlockCallback, StreamHandle};

use crate::device_enumerator::{device_name, DeviceEnumerator, DeviceKind};

/// Ring sizing when the device picks its own block size.
const DEFAULT_BLOCK_FRAMES: usize = 1024;

/// Blocks of input the ring can hold before samples are dropped.
const RING_BLOCKS: usize = 4;

/// Audio transport backed by a cpal host.
pub struct CpalTransport {
    host_id: HostId,
}

impl CpalTransport {
    /// Transport on the platform's default host.
    pub fn new() -> Self {
        Self::with_host(cpal::default_host().id())
    }

    pub fn with_host(host_id: HostId) -> Self {
        Self { host_id }
    }
}

impl Default for CpalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioTransport for CpalTransport {
    type Stream = CpalStream;

    fn open(
        &self,
        config: &StreamConfiguration,
        callback: BlockCallback,
    ) -> Result<CpalStream, LooperError> {
        let running = Arc::new(AtomicBool::new(true));
        let failed = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_running = Arc::clone(&running);
        let thread_failed = Arc::clone(&failed);
        let host_id = self.host_id;
        let config = config.clone();

        let handle = thread::Builder::new()
            .name("looper-audio".into())
            .spawn(move || {
                stream_thread(host_id, config, callback, thread_running, thread_failed, ready_tx)
            })
            .map_err(|e| LooperError::StreamFailed(format!("failed to spawn audio thread: {}", e)))?;

        let started = ready_rx.recv().unwrap_or_else(|_| {
            Err(LooperError::StreamFailed("audio thread exited during startup".into()))
        });

        match started {
            Ok((sample_rate, device)) => Ok(CpalStream {
                running,
                failed,
                sample_rate,
                device,
                handle: Some(handle),
            }),
            Err(e) => {
                running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn list_devices(&self) -> Vec<String> {
        match DeviceEnumerator::with_host(self.host_id) {
            Ok(enumerator) => enumerator.list_devices(),
            Err(e) => {
                log::warn!("Failed to list devices: {}", e);
                Vec::new()
            }
        }
    }
}

/// Handle to a running duplex stream. The cpal streams themselves live on
/// the audio thread; stopping clears the running flag and joins it.
pub struct CpalStream {
    running: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    sample_rate: u32,
    device: DeviceInfo,
    handle: Option<thread::JoinHandle<()>>,
}

impl StreamHandle for CpalStream {
    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.failed.load(Ordering::SeqCst)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn device(&self) -> DeviceInfo {
        self.device.clone()
    }

    fn stop(&mut self) -> Result<(), LooperError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| LooperError::StreamFailed("audio thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Failed to stop stream: {}", e);
        }
    }
}

/// Both halves of the duplex stream; dropping it stops the device callbacks.
struct DuplexStreams {
    _input: Stream,
    _output: Stream,
}

/// Body of the audio thread: start the streams, report back, hold them until
/// the running flag clears.
fn stream_thread(
    host_id: HostId,
    config: StreamConfiguration,
    callback: BlockCallback,
    running: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(u32, DeviceInfo), LooperError>>,
) {
    let streams = match start_streams(host_id, &config, callback, &failed) {
        Ok((streams, sample_rate, device)) => {
            let _ = ready.send(Ok((sample_rate, device)));
            streams
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(10));
    }

    drop(streams);
    log::debug!("Audio thread stopped");
}

/// Sequence:
/// 1. Find input and output devices (default or by name, with timeout)
/// 2. Derive stream configs from the device defaults
/// 3. Create the SPSC ring, primed with one block of silence
/// 4. Build both streams for the devices' sample formats
/// 5. Start input, then output
fn start_streams(
    host_id: HostId,
    config: &StreamConfiguration,
    callback: BlockCallback,
    failed: &Arc<AtomicBool>,
) -> Result<(DuplexStreams, u32, DeviceInfo), LooperError> {
    let enumerator = DeviceEnumerator::with_host(host_id)?;
    let timeout = config.search_timeout();
    let selection = config.device.as_ref();

    let input_device =
        enumerator.find_device(DeviceKind::Input, selection.map(|s| s.input()), timeout)?;
    let output_device =
        enumerator.find_device(DeviceKind::Output, selection.map(|s| s.output()), timeout)?;

    let input_default = input_device.default_input_config().map_err(|e| {
        LooperError::ConfigurationFailed(format!("default input config failed: {}", e))
    })?;
    let output_default = output_device.default_output_config().map_err(|e| {
        LooperError::ConfigurationFailed(format!("default output config failed: {}", e))
    })?;

    let sample_rate = config.sample_rate.unwrap_or(output_default.sample_rate().0);
    let input_config = StreamConfig {
        channels: input_default.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size: buffer_size(config.latency),
    };
    let output_config = StreamConfig {
        channels: output_default.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size: buffer_size(config.latency),
    };

    let device = DeviceInfo {
        input: device_name(&input_device),
        output: device_name(&output_device),
    };
    log::info!(
        "Input '{}': {} ch {:?}, output '{}': {} ch {:?}, {} Hz, buffer {:?}",
        device.input,
        input_config.channels,
        input_default.sample_format(),
        device.output,
        output_config.channels,
        output_default.sample_format(),
        sample_rate,
        output_config.buffer_size
    );

    let channels = config.channels as usize;
    let block_frames = config
        .latency
        .block_frames()
        .map_or(DEFAULT_BLOCK_FRAMES, |n| n as usize);
    let ring = HeapRb::<f32>::new(block_frames * channels * RING_BLOCKS);
    let (mut producer, consumer) = ring.split();
    producer.push_slice(&vec![0.0; block_frames * channels]);

    let overflow = Arc::new(AtomicBool::new(false));
    let input = InputSide {
        channels,
        producer,
        overflow: Arc::clone(&overflow),
        failed: Arc::clone(failed),
    };
    let output = OutputSide {
        channels,
        blocks: BlockBuffers::with_len(block_frames.max(DEFAULT_BLOCK_FRAMES) * channels),
        consumer,
        overflow,
        callback,
        failed: Arc::clone(failed),
    };

    let input_stream = match input_default.sample_format() {
        SampleFormat::F32 => build_input_stream::<f32>(&input_device, &input_config, input),
        SampleFormat::I16 => build_input_stream::<i16>(&input_device, &input_config, input),
        SampleFormat::U16 => build_input_stream::<u16>(&input_device, &input_config, input),
        format => Err(unsupported_format(format)),
    }?;
    let output_stream = match output_default.sample_format() {
        SampleFormat::F32 => build_output_stream::<f32>(&output_device, &output_config, output),
        SampleFormat::I16 => build_output_stream::<i16>(&output_device, &output_config, output),
        SampleFormat::U16 => build_output_stream::<u16>(&output_device, &output_config, output),
        format => Err(unsupported_format(format)),
    }?;

    input_stream
        .play()
        .map_err(|e| LooperError::StreamFailed(format!("input stream start failed: {}", e)))?;
    output_stream
        .play()
        .map_err(|e| LooperError::StreamFailed(format!("output stream start failed: {}", e)))?;

    Ok((
        DuplexStreams {
            _input: input_stream,
            _output: output_stream,
        },
        sample_rate,
        device,
    ))
}

fn buffer_size(latency: Latency) -> BufferSize {
    match latency.block_frames() {
        Some(frames) => BufferSize::Fixed(frames),
        None => BufferSize::Default,
    }
}

fn unsupported_format(format: SampleFormat) -> LooperError {
    LooperError::ConfigurationFailed(format!("unsupported sample format {}", format))
}

struct InputSide {
    channels: usize,
    producer: HeapProducer<f32>,
    overflow: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
}

struct OutputSide {
    channels: usize,
    blocks: BlockBuffers,
    consumer: HeapConsumer<f32>,
    overflow: Arc<AtomicBool>,
    callback: BlockCallback,
    failed: Arc<AtomicBool>,
}

fn build_input_stream<T>(
    device: &Device,
    config: &StreamConfig,
    side: InputSide,
) -> Result<Stream, LooperError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let InputSide {
        channels,
        mut producer,
        overflow,
        failed,
    } = side;
    let device_channels = (config.channels as usize).max(1);
    let mut device_frame = vec![0.0f32; device_channels];
    let mut frame = vec![0.0f32; channels];

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                for chunk in data.chunks(device_channels) {
                    for (dst, sample) in device_frame.iter_mut().zip(chunk) {
                        *dst = f32::from_sample(*sample);
                    }
                    remap_frame(&device_frame[..chunk.len()], &mut frame);
                    if producer.push_slice(&frame) < frame.len() {
                        overflow.store(true, Ordering::Relaxed);
                    }
                }
            },
            move |err| {
                log::error!("Input stream error: {}", err);
                failed.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| LooperError::StreamFailed(format!("input stream build failed: {}", e)))
}

fn build_output_stream<T>(
    device: &Device,
    config: &StreamConfig,
    side: OutputSide,
) -> Result<Stream, LooperError>
where
    T: SizedSample + FromSample<f32>,
{
    let OutputSide {
        channels,
        mut blocks,
        mut consumer,
        overflow,
        callback,
        failed,
    } = side;
    let device_channels = (config.channels as usize).max(1);
    let mut device_frame = vec![0.0f32; device_channels];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let samples = data.len() / device_channels * channels;
                let (input_block, output_block) = blocks.prepare(samples);

                let read = consumer.pop_slice(input_block);
                input_block[read..].fill(0.0);

                let status = BlockStatus {
                    input_overflow: overflow.swap(false, Ordering::Relaxed),
                    input_underflow: read < samples,
                };
                callback(input_block, output_block, status);

                for (chunk, frame) in data
                    .chunks_mut(device_channels)
                    .zip(output_block.chunks(channels))
                {
                    remap_frame(frame, &mut device_frame[..chunk.len()]);
                    for (dst, sample) in chunk.iter_mut().zip(&device_frame) {
                        *dst = T::from_sample(*sample);
                    }
                }
            },
            move |err| {
                log::error!("Output stream error: {}", err);
                failed.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| LooperError::StreamFailed(format!("output stream build failed: {}", e)))
}

/// Scratch blocks for the output callback, allocated before the stream
/// starts. Only a device block larger than the initial size reallocates.
struct BlockBuffers {
    input: Vec<f32>,
    output: Vec<f32>,
}

impl BlockBuffers {
    fn with_len(samples: usize) -> Self {
        Self {
            input: vec![0.0; samples],
            output: vec![0.0; samples],
        }
    }

    fn prepare(&mut self, samples: usize) -> (&mut [f32], &mut [f32]) {
        self.input.resize(samples, 0.0);
        self.output.resize(samples, 0.0);
        (&mut self.input, &mut self.output)
    }
}

/// Map one frame between channel layouts.
///
/// Downmixing to mono averages; otherwise channel `i` takes source channel
/// `i`, or the last source channel when the source is narrower.
pub fn remap_frame(src: &[f32], dst: &mut [f32]) {
    let Some(last) = src.len().checked_sub(1) else {
        dst.fill(0.0);
        return;
    };
    if dst.len() == 1 && src.len() > 1 {
        dst[0] = src.iter().sum::<f32>() / src.len() as f32;
        return;
    }
    for (i, sample) in dst.iter_mut().enumerate() {
        *sample = src[i.min(last)];
    }
}
