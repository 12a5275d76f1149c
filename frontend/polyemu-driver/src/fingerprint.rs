//! Module-independent content fingerprints

use cdrom::{Disc, Toc};
use md5::{Digest, Md5};
use polyemu_common::Fingerprint;
use std::sync::Arc;

/// MD5 over the layout of every disc's table of contents, in disc order.
///
/// Per disc: first track, last track, leadout LBA, then each track's LBA and data bit, each as a
/// 32-bit little-endian value.
#[must_use]
pub fn toc_fingerprint<'a>(tocs: impl IntoIterator<Item = &'a Toc>) -> Fingerprint {
    let mut hasher = Md5::new();

    for toc in tocs {
        hasher.update(u32::from(toc.first_track()).to_le_bytes());
        hasher.update(u32::from(toc.last_track()).to_le_bytes());
        hasher.update(toc.leadout_lba().to_le_bytes());

        for (_, track) in toc.tracks() {
            hasher.update(track.lba.to_le_bytes());
            hasher.update(u32::from(track.control & cdrom::toc::CONTROL_DATA).to_le_bytes());
        }
    }

    Fingerprint(hasher.finalize().into())
}

#[must_use]
pub fn disc_set_fingerprint(discs: &[Arc<dyn Disc>]) -> Fingerprint {
    toc_fingerprint(discs.iter().map(|disc| disc.toc()))
}

#[must_use]
pub fn file_fingerprint(data: &[u8]) -> Fingerprint {
    Fingerprint(Md5::digest(data).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdrom::TocTrack;

    fn toc(leadout: i32, tracks: Vec<TocTrack>) -> Toc {
        Toc::new(1, tracks, leadout)
    }

    fn reference_toc() -> Toc {
        toc(1000, vec![TocTrack::audio(0), TocTrack::data(500)])
    }

    #[test]
    fn deterministic() {
        assert_eq!(toc_fingerprint([&reference_toc()]), toc_fingerprint([&reference_toc()]));
    }

    #[test]
    fn leadout_changes_digest() {
        let changed = toc(1001, vec![TocTrack::audio(0), TocTrack::data(500)]);
        assert_ne!(toc_fingerprint([&reference_toc()]), toc_fingerprint([&changed]));
    }

    #[test]
    fn track_order_changes_digest() {
        let swapped = toc(1000, vec![TocTrack::data(500), TocTrack::audio(0)]);
        assert_ne!(toc_fingerprint([&reference_toc()]), toc_fingerprint([&swapped]));
    }

    #[test]
    fn only_data_bit_of_control_is_used() {
        let with_emphasis = toc(
            1000,
            vec![TocTrack { lba: 0, control: 0x01 }, TocTrack { lba: 500, control: 0x06 }],
        );
        assert_eq!(toc_fingerprint([&reference_toc()]), toc_fingerprint([&with_emphasis]));
    }

    #[test]
    fn disc_order_changes_digest() {
        let other = toc(2000, vec![TocTrack::audio(0)]);
        assert_ne!(
            toc_fingerprint([&reference_toc(), &other]),
            toc_fingerprint([&other, &reference_toc()])
        );
    }

    #[test]
    fn known_layout_digest() {
        // first=1, last=2, leadout=1000, (0, audio), (500, data)
        let mut expected = Vec::new();
        for value in [1_u32, 2, 1000, 0, 0, 500, 4] {
            expected.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(toc_fingerprint([&reference_toc()]), file_fingerprint(&expected));
    }
}
