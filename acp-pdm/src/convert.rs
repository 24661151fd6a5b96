//! Capture sample conversion: 32-bit PCM from the PDM decimator to `f32`.
//!
//! The ring holds interleaved signed 32-bit stereo frames. The engine asks for
//! a run of frames starting anywhere in the ring; a run that crosses the end
//! continues from frame 0.

use crate::constants::NUM_CHANNELS;

/// Lowest accepted gain in dB.
pub const MIN_GAIN_DB: f32 = -48.0;
/// Highest accepted gain in dB.
pub const MAX_GAIN_DB: f32 = 24.0;

/// 1.0 / 2^31: maps `i32::MIN` to exactly -1.0.
const SAMPLE_SCALE: f32 = 1.0 / 2_147_483_648.0;

/// Input gain applied during conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    db: f32,
    muted: bool,
}

impl Gain {
    /// 0 dB, not muted.
    pub const UNITY: Gain = Gain {
        db: 0.0,
        muted: false,
    };

    /// Gain of `db` decibels, clamped to [`MIN_GAIN_DB`]..=[`MAX_GAIN_DB`].
    /// NaN is treated as 0 dB.
    pub fn from_db(db: f32) -> Self {
        let db = if db.is_nan() {
            0.0
        } else {
            db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
        };
        Gain { db, muted: false }
    }

    pub fn set_db(&mut self, db: f32) {
        self.db = Gain::from_db(db).db;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn db(&self) -> f32 {
        self.db
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Linear multiplier: `10^(db/20)`, or 0 when muted.
    pub fn linear(&self) -> f32 {
        if self.muted {
            0.0
        } else if self.db == 0.0 {
            1.0
        } else {
            libm::powf(10.0, self.db / 20.0)
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Convert `src` sample by sample into `dst`, applying `gain`.
///
/// Converts `min(src.len(), dst.len())` samples. Output is not clipped, so
/// positive gain can exceed ±1.0.
pub fn convert_samples(src: &[i32], dst: &mut [f32], gain: &Gain) {
    let scale = SAMPLE_SCALE * gain.linear();

    if scale == 0.0 {
        let n = src.len().min(dst.len());
        dst[..n].fill(0.0);
        return;
    }

    for (out, &sample) in dst.iter_mut().zip(src) {
        *out = sample as f32 * scale;
    }
}

/// Convert `num_frames` frames of the capture ring starting at `first_frame`
/// into `dst`, wrapping at the end of the ring.
///
/// `ring` is the whole ring buffer as interleaved samples. Frames past the
/// capacity of `dst` are ignored. Returns the number of frames written.
pub fn convert_input_samples(
    ring: &[i32],
    dst: &mut [f32],
    first_frame: u32,
    num_frames: u32,
    gain: &Gain,
) -> usize {
    let channels = NUM_CHANNELS as usize;
    let ring_frames = ring.len() / channels;
    if ring_frames == 0 {
        return 0;
    }

    let frames = (num_frames as usize).min(dst.len() / channels);
    let start = first_frame as usize % ring_frames;

    // First run up to the end of the ring, then the wrapped remainder.
    let head = frames.min(ring_frames - start);
    let tail = frames - head;

    let (dst_head, dst_rest) = dst.split_at_mut(head * channels);
    convert_samples(
        &ring[start * channels..(start + head) * channels],
        dst_head,
        gain,
    );
    if tail > 0 {
        let tail = tail.min(ring_frames);
        convert_samples(&ring[..tail * channels], &mut dst_rest[..tail * channels], gain);
        return head + tail;
    }
    head
}
