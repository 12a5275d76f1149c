use cdrom::{AUDIO_FRAMES_PER_SECTOR, CdRomError, CdRomResult, Disc, Toc, TocTrack};
use std::sync::Arc;

/// In-memory disc whose audio frame `i` of sector `lba` is `(lba, i)`.
#[derive(Debug)]
pub struct PatternDisc {
    toc: Toc,
    unreadable_lba: Option<i32>,
}

impl PatternDisc {
    pub fn new(toc: Toc) -> Self {
        Self { toc, unreadable_lba: None }
    }

    pub fn with_unreadable_lba(mut self, lba: i32) -> Self {
        self.unreadable_lba = Some(lba);
        self
    }

    /// Audio 0..10, data 10..20, audio 20..30
    pub fn mixed() -> Self {
        Self::new(Toc::new(
            1,
            vec![TocTrack::audio(0), TocTrack::data(10), TocTrack::audio(20)],
            30,
        ))
    }

    pub fn data_only() -> Self {
        Self::new(Toc::new(1, vec![TocTrack::data(0)], 100))
    }

    pub fn shared(self) -> Arc<dyn Disc> {
        Arc::new(self)
    }
}

impl Disc for PatternDisc {
    fn toc(&self) -> &Toc {
        &self.toc
    }

    fn read_sector(&self, lba: i32, out: &mut [u8]) -> CdRomResult<()> {
        if self.unreadable_lba == Some(lba) {
            return Err(CdRomError::DiscReadIo(std::io::Error::other("unreadable sector")));
        }

        for (i, frame) in out.chunks_exact_mut(4).take(AUDIO_FRAMES_PER_SECTOR).enumerate() {
            frame[..2].copy_from_slice(&(lba as i16).to_le_bytes());
            frame[2..].copy_from_slice(&(i as i16).to_le_bytes());
        }
        Ok(())
    }
}
