use ratelink::audio::codec::SampleFormat;
use ratelink::audio::interval::Interval;
use ratelink::audio::memory::MemoryTransport;
use ratelink::audio::negotiate::Constraints;
use ratelink::audio::pump::StreamPump;
use ratelink::audio::stream::{RateStream, StreamDirection, StreamParams};
use ratelink::common::logger;
use ratelink::config::Config;
use tracing::info;

const CLIENT_RATE: u32 = 44_100;
const CHUNK_FRAMES: usize = 1_024;
const CHANNELS: usize = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    logger::init(&config);

    let (target_rate, target_format) = config.stream.resolve()?;
    let slave_format = target_format.unwrap_or(SampleFormat::S16Le);

    // One second of slave-side room, more than the demo burst needs.
    let transport = MemoryTransport::new(
        StreamDirection::Playback,
        slave_format,
        CHANNELS,
        target_rate as usize,
    );
    let mut stream = RateStream::open(
        config.stream.name.clone(),
        StreamDirection::Playback,
        target_rate,
        target_format,
        transport,
    )?;

    let mut request = Constraints::any();
    request.rate = Interval::exact(CLIENT_RATE);
    request.channels = Interval::exact(CHANNELS as u32);
    let slave = stream.negotiate(&mut request)?;
    info!("negotiated slave side: {slave:?}");

    let client_format = request.formats.value().unwrap_or(SampleFormat::S16Le);
    stream.configure(StreamParams {
        format: client_format,
        rate: CLIENT_RATE,
        channels: CHANNELS,
    })?;
    stream.prepare()?;
    info!("{stream}");

    let frames = CLIENT_RATE as usize / 2;
    info!(
        "{frames} client frames correspond to {} slave frames",
        stream.to_slave_frames(frames)?
    );

    // Half a second of 440 Hz, fed to the pump in paced chunks.
    let pcm = sine_stereo(frames, 440.0, CLIENT_RATE);
    let frame_bytes = client_format.width() * CHANNELS;

    let pump = StreamPump::spawn(stream)?;
    for chunk in pcm.chunks(CHUNK_FRAMES * frame_bytes) {
        if !pump.feed(chunk.to_vec()) {
            break;
        }
    }
    let (report, mut stream) = pump.finish();
    let report = report?;

    let converted = stream.transport().available();
    info!(
        "pumped {} client frames in {} chunks, {converted} slave frames ready at {target_rate} Hz",
        report.client_frames, report.chunks
    );

    let mut out = vec![0u8; converted * slave_format.width() * CHANNELS];
    let drained = stream.transport_mut().drain(&mut out);
    info!("drained {drained} slave frames from the ring");

    Ok(())
}

/// Interleaved stereo s16le sine burst at half scale.
fn sine_stereo(frames: usize, freq: f32, rate: u32) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(frames * 4);
    for i in 0..frames {
        let t = i as f32 / rate as f32;
        let sample = ((t * freq * std::f32::consts::TAU).sin() * 16_384.0) as i16;
        let bytes = sample.to_le_bytes();
        pcm.extend_from_slice(&bytes);
        pcm.extend_from_slice(&bytes);
    }
    pcm
}
