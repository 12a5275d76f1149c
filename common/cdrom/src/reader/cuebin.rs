//! Code for loading and reading CD-ROM images in CUE/BIN format


use crate::cue::{CueFile, TrackMode, TrackType};
use crate::reader::Disc;
use crate::toc::{CONTROL_DATA, Toc, TocTrack};
use crate::{CdRomError, CdRomResult, cue};
use crc::Crc;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::{fs, io};

const CD_ROM_CRC: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_CD_ROM_EDC);
const CRC32_DIGEST_RANGE: Range<usize> = 0..2064;
const CRC32_CHECKSUM_LOCATION: Range<usize> = 2064..2068;

#[derive(Debug)]
struct BinFile {
    file: BufReader<File>,
    position: u64,
}

impl BinFile {
    fn read_sector(&mut self, sector_number: u32, out: &mut [u8]) -> io::Result<()> {
        let sector_addr = u64::from(sector_number) * crate::BYTES_PER_SECTOR;

        // Only seek if the file descriptor is not already at the desired position
        if self.position != sector_addr {
            self.file.seek(SeekFrom::Start(sector_addr))?;
        }

        self.file.read_exact(&mut out[..crate::BYTES_PER_SECTOR as usize])?;
        self.position = sector_addr + crate::BYTES_PER_SECTOR;

        Ok(())
    }
}

/// Where one track lives on the disc and in its BIN file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrackLayout {
    number: u8,
    mode: TrackMode,
    // First LBA of the track's region, including any unstored pregap
    region_start: i32,
    // First LBA that is backed by file data (INDEX 00 if present, otherwise INDEX 01)
    stored_start: i32,
    // One past the last LBA of the track's region
    end: i32,
    file_idx: usize,
    // Sector in the BIN file that corresponds to `stored_start`
    file_sector: u32,
}

#[derive(Debug)]
pub struct CueBinDisc {
    toc: Toc,
    layout: Vec<TrackLayout>,
    files: Vec<Mutex<BinFile>>,
}

impl CueBinDisc {
    /// Open a CUE sheet and all of the BIN files that it references.
    ///
    /// # Errors
    ///
    /// Returns an error if the CUE sheet cannot be read or parsed, or if any BIN file cannot be
    /// opened.
    pub fn open<P: AsRef<Path>>(cue_path: P) -> CdRomResult<Self> {
        let cue_path = cue_path.as_ref();

        let cue_contents = fs::read_to_string(cue_path).map_err(|source| CdRomError::CueOpen {
            path: cue_path.display().to_string(),
            source,
        })?;
        let cue_files = cue::parse(&cue_contents)?;

        let parent_dir = cue_path
            .parent()
            .ok_or_else(|| CdRomError::CueParentDir(cue_path.display().to_string()))?;

        let mut files = Vec::with_capacity(cue_files.len());
        let mut file_sectors = Vec::with_capacity(cue_files.len());
        for cue_file in &cue_files {
            let bin_path = parent_dir.join(&cue_file.file_name);
            let file = File::open(&bin_path).map_err(|source| CdRomError::BinOpen {
                path: bin_path.display().to_string(),
                source,
            })?;
            let len = file.metadata().map_err(|source| CdRomError::FsMetadata {
                path: bin_path.display().to_string(),
                source,
            })?;

            file_sectors.push((len.len() / crate::BYTES_PER_SECTOR) as u32);
            files.push(Mutex::new(BinFile { file: BufReader::new(file), position: 0 }));
        }

        let (toc, layout) = build_layout(&cue_files, &file_sectors)?;

        log::debug!("Opened CUE/BIN disc '{}' with TOC {toc:?}", cue_path.display());

        Ok(Self { toc, layout, files })
    }

    fn find_track(&self, lba: i32) -> Option<&TrackLayout> {
        let idx = self.layout.partition_point(|track| track.end <= lba);
        self.layout.get(idx).filter(|track| track.region_start <= lba)
    }
}

impl Disc for CueBinDisc {
    fn toc(&self) -> &Toc {
        &self.toc
    }

    fn read_sector(&self, lba: i32, out: &mut [u8]) -> CdRomResult<()> {
        let out_of_range = || CdRomError::LbaOutOfRange { lba, leadout: self.toc.leadout_lba() };
        if lba < 0 {
            return Err(out_of_range());
        }
        let track = self.find_track(lba).ok_or_else(out_of_range)?;

        if lba < track.stored_start {
            // Pregap that does not exist in the file
            out[..crate::BYTES_PER_SECTOR as usize].fill(0);
            return Ok(());
        }

        let sector_number = track.file_sector + (lba - track.stored_start) as u32;
        self.files[track.file_idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_sector(sector_number, out)
            .map_err(CdRomError::DiscReadIo)?;

        if track.mode == TrackMode::Mode1 {
            check_edc(track.number, lba, out)?;
        }

        Ok(())
    }
}

fn check_edc(track_number: u8, lba: i32, sector: &[u8]) -> CdRomResult<()> {
    let checksum = CD_ROM_CRC.checksum(&sector[CRC32_DIGEST_RANGE]);

    let mut edc_bytes = [0; 4];
    edc_bytes.copy_from_slice(&sector[CRC32_CHECKSUM_LOCATION]);
    let edc = u32::from_le_bytes(edc_bytes);

    if checksum != edc {
        return Err(CdRomError::DiscReadInvalidChecksum {
            track_number,
            lba,
            expected: edc,
            actual: checksum,
        });
    }

    Ok(())
}

fn build_layout(cue_files: &[CueFile], file_sectors: &[u32]) -> CdRomResult<(Toc, Vec<TrackLayout>)> {
    let mut lba: i32 = 0;
    let mut toc_tracks = Vec::new();
    let mut layout = Vec::new();

    for (file_idx, (cue_file, &file_len_sectors)) in cue_files.iter().zip(file_sectors).enumerate() {
        for (i, track) in cue_file.tracks.iter().enumerate() {
            let region_start = lba;
            let pregap_sectors = track.pregap_len.map_or(0, |pregap| pregap.to_sector_number());
            let stored_start = region_start + pregap_sectors as i32;

            let data_start = track.data_start().to_sector_number();
            let data_end = cue_file
                .tracks
                .get(i + 1)
                .map_or(file_len_sectors, |next| next.data_start().to_sector_number());
            if data_end < data_start {
                return Err(CdRomError::CueParse(format!(
                    "Track {:02} starts past the end of '{}'",
                    track.number, cue_file.file_name
                )));
            }

            let pause_sectors = track.track_start.to_sector_number() - data_start;
            let end = stored_start + (data_end - data_start) as i32;

            let control = match track.mode.track_type() {
                TrackType::Data => CONTROL_DATA,
                TrackType::Audio => 0,
            };
            toc_tracks.push(TocTrack { lba: stored_start + pause_sectors as i32, control });
            layout.push(TrackLayout {
                number: track.number,
                mode: track.mode,
                region_start,
                stored_start,
                end,
                file_idx,
                file_sector: data_start,
            });

            lba = end;
        }
    }

    Ok((Toc::new(1, toc_tracks, lba), layout))
}
