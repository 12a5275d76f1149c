//! Per-step audio/video synchronization between the active game and the frontend


use crate::session::ActiveSession;
use polyemu_common::{
    Deinterlacer, FrameContext, GameType, MidSync, PixelFormat, Rect, SoundBuffer,
};
use std::fmt::{Display, Formatter};
use std::ops::Range;
use thiserror::Error;

pub const REWIND_UNSUPPORTED_MESSAGE: &str = "Music player rewinding is unsupported.";

/// Receives output and notifications from the pipeline.
pub trait HostFrontend {
    /// Show a short user-facing message.
    fn display_message(&mut self, message: &str);

    /// The output sample rate changed; resize the resampling buffer to `frames` frames.
    fn resize_resample_buffer(&mut self, frames: usize);

    /// The game flushed partial output mid-step. `new_frames` is the range of sound frames in
    /// `ctx.sound` that have not been reported before.
    fn mid_sync(&mut self, ctx: &FrameContext, new_frames: Range<usize>);
}

/// A step that completed but broke the frame contract. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractViolation {
    pub display_rect: Rect,
}

impl Display for ContractViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Non-skipped step produced a zero-height frame: {:?}", self.display_rect)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Sound frames in the context's buffer that were not already reported by a mid-step sync
    pub sound_frames: Range<usize>,
    /// Master cycles elapsed since the last mid-step sync (or since the start of the step)
    pub master_cycles: u64,
    pub video_format_changed: bool,
    pub sound_format_changed: bool,
    pub rewind_suppressed: bool,
    pub contract_violation: Option<ContractViolation>,
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("No game is loaded")]
    NoActiveSession,
    #[error("Inconsistent sound request: {0}")]
    InconsistentSound(String),
}

/// State carried across steps, reset whenever a session is loaded or closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    last_pixel_format: Option<PixelFormat>,
    last_sound_rate: Option<f64>,
    prev_interlaced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FrameSyncPipeline {
    state: PipelineState,
    deinterlacer: Deinterlacer,
}

/// Resampling buffer size for an output sample rate: half the rate, rounded down to an even
/// frame count.
#[must_use]
pub fn resample_buffer_frames(sound_rate: f64) -> usize {
    ((sound_rate / 2.0) as usize) & !1
}

// Average each stereo frame in the range and write it back to both channels
fn downmix_to_mono(sound: &mut SoundBuffer, frames: Range<usize>) {
    if sound.channels() != 2 || frames.is_empty() {
        return;
    }

    for frame in sound.frames_mut(frames).chunks_exact_mut(2) {
        let mono = ((i32::from(frame[0]) + i32::from(frame[1])) >> 1) as i16;
        frame[0] = mono;
        frame[1] = mono;
    }
}

/// The mid-sync hook handed to the game during a step.
struct StepMidSync<'a> {
    frontend: &'a mut dyn HostFrontend,
    force_mono: bool,
}

impl MidSync for StepMidSync<'_> {
    fn mid_sync(&mut self, ctx: &mut FrameContext) {
        let new_frames = ctx.sound_frames_synced..ctx.sound.len_frames();
        if self.force_mono {
            downmix_to_mono(&mut ctx.sound, new_frames.clone());
        }

        self.frontend.mid_sync(ctx, new_frames.clone());

        ctx.sound_frames_synced = new_frames.end;
        ctx.master_cycles_synced = ctx.master_cycles;
    }
}

impl FrameSyncPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Forget all state from the previous session so that the next step reports both formats as
    /// changed.
    pub fn reset(&mut self) {
        self.state = PipelineState::default();
        self.deinterlacer.clear_state();
    }

    /// Drive exactly one step of the active game.
    ///
    /// # Errors
    ///
    /// Returns an error if the context's sound rate and sound buffer capacity disagree about
    /// whether sound is wanted. The game is not stepped in that case.
    pub fn step(
        &mut self,
        session: &mut ActiveSession,
        ctx: &mut FrameContext,
        frontend: &mut dyn HostFrontend,
    ) -> Result<StepReport, StepError> {
        let wants_sound = ctx.sound_rate > 0.0;
        if wants_sound != (ctx.sound.capacity_frames() > 0) {
            return Err(StepError::InconsistentSound(format!(
                "sound rate is {} but sound buffer capacity is {} frames",
                ctx.sound_rate,
                ctx.sound.capacity_frames()
            )));
        }

        ctx.display_rect = Rect::EMPTY;
        ctx.line_widths.clear();
        ctx.sound.clear();
        ctx.interlace = None;
        ctx.master_cycles = 0;
        ctx.sound_frames_synced = 0;
        ctx.master_cycles_synced = 0;

        let pixel_format = ctx.surface.format();
        ctx.video_format_changed = self.state.last_pixel_format != Some(pixel_format);
        if ctx.video_format_changed {
            log::debug!("Video format changed to {pixel_format}");
            self.state.last_pixel_format = Some(pixel_format);
            self.deinterlacer.clear_state();
        }

        ctx.sound_format_changed = self
            .state
            .last_sound_rate
            .is_none_or(|last_rate| last_rate.to_bits() != ctx.sound_rate.to_bits());
        if ctx.sound_format_changed {
            log::debug!("Sound rate changed to {} Hz", ctx.sound_rate);
            self.state.last_sound_rate = Some(ctx.sound_rate);
            session.set_sound_rate(wants_sound.then_some(ctx.sound_rate));
            frontend.resize_resample_buffer(resample_buffer_frames(ctx.sound_rate));
        }

        let mut rewind_suppressed = false;
        if ctx.rewind_requested && session.descriptor().game_type == GameType::Player {
            ctx.rewind_requested = false;
            rewind_suppressed = true;
            frontend.display_message(REWIND_UNSUPPORTED_MESSAGE);
        }

        let force_mono = session.force_mono();
        {
            let mut mid_sync = StepMidSync { frontend, force_mono };
            session.game_mut().emulate(ctx, &mut mid_sync);
        }

        let contract_violation = (!ctx.skip && ctx.display_rect.h == 0).then(|| {
            let violation = ContractViolation { display_rect: ctx.display_rect };
            log::error!("{violation}");
            violation
        });

        if let Some(parity) = ctx.interlace {
            if !self.state.prev_interlaced {
                self.deinterlacer.clear_state();
            }

            self.deinterlacer.process(
                &mut ctx.surface,
                &mut ctx.display_rect,
                &mut ctx.line_widths,
                parity,
            );

            self.state.prev_interlaced = true;
            ctx.interlace = None;
        } else {
            self.state.prev_interlaced = false;
        }

        let sound_frames = ctx.sound_frames_synced..ctx.sound.len_frames();
        if force_mono {
            downmix_to_mono(&mut ctx.sound, sound_frames.clone());
        }

        Ok(StepReport {
            sound_frames,
            master_cycles: ctx.master_cycles.saturating_sub(ctx.master_cycles_synced),
            video_format_changed: ctx.video_format_changed,
            sound_format_changed: ctx.sound_format_changed,
            rewind_suppressed,
            contract_violation,
        })
    }
}
