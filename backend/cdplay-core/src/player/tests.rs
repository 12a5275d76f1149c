use super::*;
use crate::testdisc::PatternDisc;

fn play(playback: &mut Playback, disc: &dyn Disc, frames: usize) -> Vec<Option<(i16, i16)>> {
    (0..frames).map(|_| playback.next_frame(disc)).collect()
}

#[test]
fn data_tracks_are_not_played() {
    let disc = PatternDisc::mixed();
    assert_eq!(
        audio_tracks(disc.toc()),
        vec![
            AudioTrack { number: 1, start: 0, end: 10 },
            AudioTrack { number: 3, start: 20, end: 30 }
        ]
    );
}

#[test]
fn plays_tracks_in_order() {
    let disc = PatternDisc::mixed();
    let mut playback = Playback::new(disc.toc());

    let frames = play(&mut playback, &disc, AUDIO_FRAMES_PER_SECTOR + 1);
    assert_eq!(frames[0], Some((0, 0)));
    assert_eq!(frames[AUDIO_FRAMES_PER_SECTOR - 1], Some((0, 587)));
    assert_eq!(frames[AUDIO_FRAMES_PER_SECTOR], Some((1, 0)));

    // Rest of track 1, then straight to track 3
    play(&mut playback, &disc, 9 * AUDIO_FRAMES_PER_SECTOR - 1);
    assert_eq!(playback.position(), Some((1, 0.0)));
    assert_eq!(playback.next_frame(&disc), Some((20, 0)));

    play(&mut playback, &disc, 10 * AUDIO_FRAMES_PER_SECTOR - 1);
    assert_eq!(playback.next_frame(&disc), None);
    assert_eq!(playback.position(), None);
}

#[test]
fn position_within_track() {
    let disc = PatternDisc::mixed();
    let mut playback = Playback::new(disc.toc());

    play(&mut playback, &disc, 5 * AUDIO_FRAMES_PER_SECTOR);
    assert_eq!(playback.position(), Some((0, 0.5)));
}

#[test_log::test]
fn unreadable_sector_skips_rest_of_track() {
    let disc = PatternDisc::mixed().with_unreadable_lba(5);
    let mut playback = Playback::new(disc.toc());

    play(&mut playback, &disc, 5 * AUDIO_FRAMES_PER_SECTOR);
    assert_eq!(playback.next_frame(&disc), Some((20, 0)));
}

#[test]
fn restart_returns_to_first_track() {
    let disc = PatternDisc::mixed();
    let mut playback = Playback::new(disc.toc());

    play(&mut playback, &disc, 12 * AUDIO_FRAMES_PER_SECTOR + 3);
    playback.restart();
    assert_eq!(playback.next_frame(&disc), Some((0, 0)));
}

#[test]
fn disc_without_audio_is_already_finished() {
    let disc = PatternDisc::data_only();
    let mut playback = Playback::new(disc.toc());

    assert!(playback.tracks().is_empty());
    assert_eq!(playback.position(), None);
    assert_eq!(playback.next_frame(&disc), None);
}

#[test]
fn rate_conversion() {
    let mut converter = RateConverter::default();
    assert!((0..100).all(|_| converter.outputs_for_next(44100) == 1));

    let mut converter = RateConverter::default();
    let total: u64 = (0..735).map(|_| converter.outputs_for_next(22050)).sum();
    assert_eq!(total, 367);

    let mut converter = RateConverter::default();
    let total: u64 = (0..44100).map(|_| converter.outputs_for_next(48000)).sum();
    assert_eq!(total, 48000);

    let mut converter = RateConverter::default();
    assert_eq!(converter.outputs_for_next(0), 0);
}
