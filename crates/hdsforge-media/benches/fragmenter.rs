//! Benchmark Fragmenter::run() over synthetic timelines of increasing length.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hdsforge_media::fragment::{Fragmenter, MemorySink};
use hdsforge_media::{Sample, SourceBuffer, Timeline, TrackCapabilities, TrackInfo, TrackKind};

const VIDEO_FRAME: u32 = 2_000;
const AUDIO_FRAME: u32 = 300;

/// 25 fps video with a keyframe every 2s, plus interleaved AAC frames.
fn make_timeline(seconds: usize) -> Timeline {
    let frames = seconds * 25;
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let ts = i as f64 / 25.0;
        samples.push(Sample {
            timestamp: ts,
            duration: 0.04,
            track: TrackKind::Video,
            offset: 0,
            size: VIDEO_FRAME,
            keyframe: i % 50 == 0,
            composition_offset: 80,
        });
        samples.push(Sample {
            timestamp: ts + 0.01,
            duration: 0.023,
            track: TrackKind::Audio,
            offset: VIDEO_FRAME as u64,
            size: AUDIO_FRAME,
            keyframe: false,
            composition_offset: 0,
        });
    }

    Timeline {
        duration: seconds as f64,
        capabilities: TrackCapabilities {
            video: Some(TrackInfo::new(1000, vec![0x01, 0x64, 0x00, 0x28])),
            audio: Some(TrackInfo::new(48000, vec![0x11, 0x90])),
            bitrate: 700_000,
        },
        samples,
    }
}

fn bench_fragmenter(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmenter");
    group.sample_size(10);

    let source = SourceBuffer::from_bytes(vec![0x5Au8; (VIDEO_FRAME + AUDIO_FRAME) as usize]);
    let fragmenter = Fragmenter::new(10.0).unwrap();

    for (name, seconds) in [("5min", 300), ("30min", 1800), ("2hr", 7200)] {
        let timeline = make_timeline(seconds);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut sink = MemorySink::new();
                fragmenter
                    .run(black_box(&timeline), &source, &mut sink)
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fragmenter);
criterion_main!(benches);
