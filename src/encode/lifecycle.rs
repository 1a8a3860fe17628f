use crate::encode::encoder::{EncodedVideo, EncoderConfig, FrameEncoder};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::FrameRGBA;

/// Where an [`EncoderSession`] is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderState {
    Idle,
    Recording,
    Finalizing,
    Complete,
    Failed,
}

/// Drives a [`FrameEncoder`] through `Idle -> Recording -> Finalizing -> Complete`.
///
/// Any error, or a call that does not fit the current state, moves the session to `Failed` and
/// aborts the encoder. Dropping a session that has not completed also aborts it.
pub struct EncoderSession {
    encoder: Box<dyn FrameEncoder>,
    state: EncoderState,
    next_frame: u64,
}

impl EncoderSession {
    pub fn new(encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            encoder,
            state: EncoderState::Idle,
            next_frame: 0,
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Frames accepted so far.
    pub fn frames_pushed(&self) -> u64 {
        self.next_frame
    }

    pub fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        self.expect_state(EncoderState::Idle, "begin")?;
        let res = cfg.validate().and_then(|()| self.encoder.begin(cfg));
        self.settle(res)?;
        self.state = EncoderState::Recording;
        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            bitrate_bps = cfg.bitrate_bps,
            "encoder recording"
        );
        Ok(())
    }

    /// Push the next frame; indices must arrive contiguously from zero.
    pub fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        self.expect_state(EncoderState::Recording, "push_frame")?;
        if index.0 != self.next_frame {
            let err = ReelError::encode(format!(
                "frame {} pushed out of order, expected {}",
                index.0, self.next_frame
            ));
            return self.settle(Err(err));
        }
        let res = self.encoder.push_frame(index, frame);
        self.settle(res)?;
        self.next_frame += 1;
        Ok(())
    }

    /// Stop recording and collect the payload.
    pub fn finalize(&mut self) -> ReelResult<EncodedVideo> {
        self.expect_state(EncoderState::Recording, "finalize")?;
        self.state = EncoderState::Finalizing;
        let res = self.encoder.finalize();
        let video = self.settle(res)?;
        self.state = EncoderState::Complete;
        tracing::debug!(
            frames = self.next_frame,
            bytes = video.bytes.len(),
            mime = %video.mime,
            "encoder complete"
        );
        Ok(video)
    }

    /// Abandon the session, releasing the encoder.
    pub fn abort(&mut self) {
        if matches!(self.state, EncoderState::Complete | EncoderState::Failed) {
            return;
        }
        self.encoder.abort();
        self.state = EncoderState::Failed;
    }

    fn expect_state(&mut self, want: EncoderState, op: &str) -> ReelResult<()> {
        if self.state == want {
            return Ok(());
        }
        let err = ReelError::encode(format!(
            "cannot {op} while encoder is {:?}",
            self.state
        ));
        self.settle(Err(err))
    }

    fn settle<T>(&mut self, res: ReelResult<T>) -> ReelResult<T> {
        if res.is_err() && self.state != EncoderState::Failed {
            self.encoder.abort();
            self.state = EncoderState::Failed;
        }
        res
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        if matches!(
            self.state,
            EncoderState::Recording | EncoderState::Finalizing
        ) {
            tracing::debug!(frames = self.next_frame, "aborting unfinished encoder");
            self.abort();
        }
    }
}

impl std::fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSession")
            .field("state", &self.state)
            .field("next_frame", &self.next_frame)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/lifecycle.rs"]
mod tests;
