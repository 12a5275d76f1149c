//! Public interface for the CD-DA player module


use crate::player::{CD_DA_FREQUENCY, Playback, RateConverter};
use crate::render::{self, ProgressView};
use cdrom::Disc;
use polyemu_common::{
    Capabilities, Fingerprint, FrameContext, Game, GameType, MidSync, ModuleDescriptor,
    ModuleError, ModuleResult, SimpleCommand, SystemModule,
};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Source frames produced per step (1/60 of a second at 44.1 kHz)
pub const FRAMES_PER_STEP: usize = (CD_DA_FREQUENCY / 60) as usize;

static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    short_name: "cdplay",
    full_name: "Compact Disc Digital Audio",
    // Lower than every console module
    priority: -1000,
    game_type: GameType::Player,
    capabilities: Capabilities { file_load: false, cd_load: true },
    sound_channels: 2,
    nominal_width: render::SCREEN_WIDTH,
    nominal_height: render::SCREEN_HEIGHT,
    file_extensions: &[],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CdPlayModule;

fn first_disc_has_audio(discs: &[Arc<dyn Disc>]) -> bool {
    discs.first().is_some_and(|disc| disc.toc().has_audio_tracks())
}

impl SystemModule for CdPlayModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    fn test_magic_cd(&self, discs: &[Arc<dyn Disc>], _fingerprint: Fingerprint) -> bool {
        first_disc_has_audio(discs)
    }

    fn load_cd(
        &self,
        discs: &[Arc<dyn Disc>],
        _fingerprint: Fingerprint,
    ) -> ModuleResult<Box<dyn Game>> {
        if !first_disc_has_audio(discs) {
            return Err(ModuleError::InvalidContent("first disc has no audio tracks".into()));
        }

        Ok(Box::new(CdPlayer::new(discs.to_vec())))
    }
}

pub struct CdPlayer {
    discs: Vec<Arc<dyn Disc>>,
    disc_idx: usize,
    playback: Playback,
    converter: RateConverter,
}

impl CdPlayer {
    /// # Panics
    ///
    /// Panics if `discs` is empty.
    #[must_use]
    pub fn new(discs: Vec<Arc<dyn Disc>>) -> Self {
        let playback = Playback::new(discs[0].toc());
        log::info!(
            "Playing {} audio tracks from disc 1 of {}",
            playback.tracks().len(),
            discs.len()
        );

        Self { discs, disc_idx: 0, playback, converter: RateConverter::default() }
    }

    #[must_use]
    pub fn disc_idx(&self) -> usize {
        self.disc_idx
    }

    fn restart(&mut self) {
        self.playback.restart();
        self.converter.reset();
    }

    fn select_next_disc(&mut self) {
        self.disc_idx = (self.disc_idx + 1) % self.discs.len();
        self.playback = Playback::new(self.discs[self.disc_idx].toc());
        self.converter.reset();

        log::info!(
            "Selected disc {} of {} ({} audio tracks)",
            self.disc_idx + 1,
            self.discs.len(),
            self.playback.tracks().len()
        );
    }

    fn progress_view(&self) -> ProgressView {
        ProgressView {
            track_count: self.playback.tracks().len(),
            position: self.playback.position(),
            disc_idx: self.disc_idx,
            disc_count: self.discs.len(),
        }
    }
}

impl Game for CdPlayer {
    fn emulate(&mut self, ctx: &mut FrameContext, mid_sync: &mut dyn MidSync) {
        let output_rate = if ctx.sound_rate > 0.0 { ctx.sound_rate.round() as u64 } else { 0 };
        let disc = Arc::clone(&self.discs[self.disc_idx]);

        for i in 0..FRAMES_PER_STEP {
            if i == FRAMES_PER_STEP / 2 {
                ctx.master_cycles = i as u64;
                mid_sync.mid_sync(ctx);
            }

            let (sample_l, sample_r) = self.playback.next_frame(disc.as_ref()).unwrap_or((0, 0));
            for _ in 0..self.converter.outputs_for_next(output_rate) {
                if ctx.sound.channels() == 1 {
                    let mono = ((i32::from(sample_l) + i32::from(sample_r)) >> 1) as i16;
                    ctx.sound.push_frame(&[mono]);
                } else {
                    ctx.sound.push_frame(&[sample_l, sample_r]);
                }
            }
        }
        ctx.master_cycles = FRAMES_PER_STEP as u64;

        if !ctx.skip {
            ctx.display_rect = render::render(&mut ctx.surface, self.progress_view());
        }
    }

    fn close(&mut self) {
        log::info!("Stopping playback");
    }

    fn simple_command(&mut self, command: SimpleCommand) {
        match command {
            SimpleCommand::Power | SimpleCommand::Reset => self.restart(),
            SimpleCommand::SelectDisk => self.select_next_disc(),
            _ => log::debug!("Ignoring command {command:?}"),
        }
    }
}

impl Debug for CdPlayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdPlayer")
            .field("disc_idx", &self.disc_idx)
            .field("disc_count", &self.discs.len())
            .field("position", &self.playback.position())
            .finish_non_exhaustive()
    }
}
