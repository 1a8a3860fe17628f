use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

/// Output frame rate of every reel.
pub const OUTPUT_FPS: Fps = Fps::integer(30);

/// Where a frame falls on the script timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    /// Output frame index.
    pub frame: FrameIndex,
    /// `frame / fps`.
    pub time_secs: f64,
    /// Active script line.
    pub segment_index: usize,
    /// Position inside the active line's time slot, in `[0, 1]`.
    pub segment_progress: f64,
}

/// Deterministic frame index -> segment mapping for equal-length script segments.
#[derive(Clone, Copy, Debug)]
pub struct FrameScheduler {
    fps: Fps,
    total_frames: u64,
    segment_count: usize,
    segment_duration_secs: f64,
}

impl FrameScheduler {
    pub fn new(duration_secs: f64, segment_count: usize, fps: Fps) -> ReelResult<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ReelError::validation("duration must be finite and > 0"));
        }
        if segment_count == 0 {
            return Err(ReelError::validation(
                "scheduler needs at least one script segment",
            ));
        }
        let total_frames = fps.secs_to_frames_round(duration_secs);
        if total_frames == 0 {
            return Err(ReelError::validation(format!(
                "duration {duration_secs}s is shorter than one frame at {} fps",
                fps.as_f64()
            )));
        }
        Ok(Self {
            fps,
            total_frames,
            segment_count,
            segment_duration_secs: duration_secs / segment_count as f64,
        })
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn segment_duration_secs(&self) -> f64 {
        self.segment_duration_secs
    }

    /// Map a frame to its segment and in-segment progress.
    ///
    /// The segment index is clamped to the last line so float drift near the final frame never
    /// indexes past the script.
    pub fn state_at(&self, frame: FrameIndex) -> FrameState {
        let time_secs = self.fps.frames_to_secs(frame.0);
        let raw = (time_secs / self.segment_duration_secs).floor();
        let last = self.segment_count - 1;
        let (segment_index, segment_progress) = if raw >= last as f64 {
            let local = time_secs - (last as f64) * self.segment_duration_secs;
            (last, local / self.segment_duration_secs)
        } else {
            let local = time_secs % self.segment_duration_secs;
            (raw.max(0.0) as usize, local / self.segment_duration_secs)
        };
        FrameState {
            frame,
            time_secs,
            segment_index,
            segment_progress: segment_progress.clamp(0.0, 1.0),
        }
    }

    /// Every frame state from 0 to `total_frames - 1`, in order.
    pub fn iter(&self) -> impl Iterator<Item = FrameState> + '_ {
        (0..self.total_frames).map(|f| self.state_at(FrameIndex(f)))
    }
}

/// Background slot for a segment: media cycles when there are fewer assets than lines.
pub fn media_index_for_segment(segment_index: usize, media_len: usize) -> usize {
    if media_len == 0 {
        0
    } else {
        segment_index % media_len
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/frame.rs"]
mod tests;
