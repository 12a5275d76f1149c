use super::*;

const STANDARD_SPACE: &str = "
REM GENRE Game
FILE \"Standard Space.bin\" BINARY
  TRACK 01 MODE1/2352
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    PREGAP 00:02:00
    INDEX 01 13:10:11
  TRACK 03 AUDIO
    INDEX 00 13:14:25
    INDEX 01 13:16:25
";

#[test]
fn single_file_with_pregap_and_pause() {
    let files = parse(STANDARD_SPACE).unwrap();
    assert_eq!(
        files,
        vec![CueFile {
            file_name: "Standard Space.bin".into(),
            tracks: vec![
                CueTrack {
                    number: 1,
                    mode: TrackMode::Mode1,
                    pregap_len: None,
                    pause_start: None,
                    track_start: CdTime::new(0, 0, 0),
                },
                CueTrack {
                    number: 2,
                    mode: TrackMode::Audio,
                    pregap_len: Some(CdTime::new(0, 2, 0)),
                    pause_start: None,
                    track_start: CdTime::new(13, 10, 11),
                },
                CueTrack {
                    number: 3,
                    mode: TrackMode::Audio,
                    pregap_len: None,
                    pause_start: Some(CdTime::new(13, 14, 25)),
                    track_start: CdTime::new(13, 16, 25),
                },
            ],
        }]
    );
}

const MULTI_FILE: &str = "FILE \"Multi File (Track 01).bin\" BINARY\r
  TRACK 01 MODE2/2352\r
    INDEX 01 00:00:00\r
FILE \"Multi File (Track 02).bin\" BINARY\r
  TRACK 02 AUDIO\r
    INDEX 00 00:00:00\r
    INDEX 01 00:02:00\r
";

#[test]
fn multi_file_with_crlf() {
    let files = parse(MULTI_FILE).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_name, "Multi File (Track 01).bin");
    assert_eq!(files[0].tracks[0].mode, TrackMode::Mode2);
    assert_eq!(files[1].tracks[0].number, 2);
    assert_eq!(files[1].tracks[0].data_start(), CdTime::ZERO);
    assert_eq!(files[1].tracks[0].track_start, CdTime::new(0, 2, 0));
}

#[test]
fn tracks_out_of_order() {
    let cue = "FILE \"a.bin\" BINARY\n TRACK 02 AUDIO\n  INDEX 01 00:00:00\n";
    assert!(matches!(parse(cue), Err(CdRomError::CueParse(_))));
}

#[test]
fn track_without_index_01() {
    let cue = "FILE \"a.bin\" BINARY\n TRACK 01 AUDIO\n  INDEX 00 00:00:00\n";
    assert!(matches!(parse(cue), Err(CdRomError::CueParse(_))));
}

#[test]
fn unsupported_track_mode() {
    let cue = "FILE \"a.bin\" BINARY\n TRACK 01 MODE1/2048\n  INDEX 01 00:00:00\n";
    assert!(matches!(parse(cue), Err(CdRomError::CueInvalidTrackLine(_))));
}

#[test]
fn empty_sheet() {
    assert!(matches!(parse("REM nothing here\n"), Err(CdRomError::CueParse(_))));
}
