//! Source fetching and decoding.
//!
//! A channel's locator resolves to an audio file which is fetched and fully
//! decoded into an interleaved f32 buffer. Loads run off the engine thread;
//! completions come back over a channel tagged with the requesting channel's
//! generation counter so the engine can discard results that arrive after
//! the user has already turned the sound off again.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Sender;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use dreammixer_core::{MixerError, Result};

/// A fully decoded audio source, ready for looped playback.
#[derive(Clone)]
pub struct DecodedSource {
    /// Interleaved samples (`channels` per frame).
    pub samples: Arc<[f32]>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedSource {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

impl std::fmt::Debug for DecodedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedSource")
            .field("frames", &self.frames())
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Fetch-and-decode behind a seam so tests can substitute canned sources.
pub trait SourceLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<DecodedSource>;
}

/// Loads sources from the filesystem and decodes them with symphonia.
#[derive(Default)]
pub struct FileSourceLoader;

impl SourceLoader for FileSourceLoader {
    fn load(&self, path: &Path) -> Result<DecodedSource> {
        let locator = path.display().to_string();
        let bytes = fs::read(path).map_err(|source| MixerError::Fetch {
            locator: locator.clone(),
            source,
        })?;
        decode_bytes(&locator, bytes)
    }
}

/// Decode an in-memory audio file into an interleaved f32 buffer.
fn decode_bytes(locator: &str, bytes: Vec<u8>) -> Result<DecodedSource> {
    let decode_err = |reason: String| MixerError::Decode {
        locator: locator.to_string(),
        reason,
    };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(locator).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(e.to_string()))?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| decode_err("no default audio track".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_err("unknown sample rate".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| decode_err("unknown channel count".to_string()))?
        .count() as u16;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut samples = Vec::<f32>::new();
    loop {
        match reader.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }
                match decoder.decode(&packet) {
                    Ok(decoded) => {
                        let mut buf =
                            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                    Err(e) => {
                        // Corrupt packets are skipped, not fatal.
                        warn!(locator, "skipping undecodable packet: {e}");
                    }
                }
            }
            // Symphonia signals end-of-stream as an I/O error.
            Err(symphonia::core::errors::Error::IoError(_)) => break,
            Err(e) => return Err(decode_err(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(decode_err("decoded to zero samples".to_string()));
    }

    debug!(
        locator,
        frames = samples.len() / channels as usize,
        sample_rate,
        "decoded source"
    );

    Ok(DecodedSource {
        samples: samples.into(),
        channels,
        sample_rate,
    })
}

/// A request to load one channel's source.
#[derive(Debug)]
pub struct LoadRequest {
    pub channel_id: String,
    pub generation: u64,
    pub path: PathBuf,
}

/// Completion of a [`LoadRequest`], delivered back to the engine thread.
pub struct LoadComplete {
    pub channel_id: String,
    pub generation: u64,
    pub result: Result<DecodedSource>,
}

/// Hands load requests to whatever executes them.
///
/// The real implementation runs loads on background threads; tests hold
/// requests and complete them by hand.
pub trait LoadDispatcher: Send {
    fn dispatch(&mut self, request: LoadRequest);
}

/// Runs each load on its own background thread.
///
/// The decoded set is small (a handful of ambient loops), so a thread per
/// load is plenty; nothing here is on a hot path.
pub struct ThreadedLoader {
    loader: Arc<dyn SourceLoader>,
    completions: Sender<LoadComplete>,
}

impl ThreadedLoader {
    pub fn new(loader: Arc<dyn SourceLoader>, completions: Sender<LoadComplete>) -> Self {
        Self {
            loader,
            completions,
        }
    }
}

impl LoadDispatcher for ThreadedLoader {
    fn dispatch(&mut self, request: LoadRequest) {
        let loader = Arc::clone(&self.loader);
        let completions = self.completions.clone();
        std::thread::spawn(move || {
            let result = loader.load(&request.path);
            // The engine may have been dropped; nothing to do then.
            let _ = completions.send(LoadComplete {
                channel_id: request.channel_id,
                generation: request.generation,
                result,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_source_frame_count() {
        let source = DecodedSource {
            samples: vec![0.0f32; 96].into(),
            channels: 2,
            sample_rate: 48000,
        };
        assert_eq!(source.frames(), 48);
    }

    #[test]
    fn file_loader_reports_fetch_error_for_missing_file() {
        let loader = FileSourceLoader;
        let err = loader
            .load(Path::new("/nonexistent/dreammixer/rain.mp3"))
            .unwrap_err();
        assert!(matches!(err, MixerError::Fetch { .. }));
    }

    #[test]
    fn garbage_bytes_report_decode_error() {
        let err = decode_bytes("garbage.mp3", vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, MixerError::Decode { .. }));
    }
}
