//! IPS binary patches

use std::path::Path;
use std::{fs, io};
use thiserror::Error;

const HEADER: &[u8; 5] = b"PATCH";
const EOF_MARKER: u32 = 0x45_4F_46;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Patch does not begin with an IPS header")]
    MissingHeader,
    #[error("Patch ends unexpectedly at byte {0}")]
    Truncated(usize),
    #[error("Patch has {0} unexpected bytes after its EOF marker")]
    TrailingData(usize),
    #[error("I/O error reading patch: {0}")]
    Io(#[source] io::Error),
}

struct PatchReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> PatchReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], PatchError> {
        let end = self.position + len;
        let slice = self.bytes.get(self.position..end).ok_or(PatchError::Truncated(self.position))?;
        self.position = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<usize, PatchError> {
        let bytes = self.take(2)?;
        Ok(usize::from(u16::from_be_bytes([bytes[0], bytes[1]])))
    }

    fn u24(&mut self) -> Result<u32, PatchError> {
        let bytes = self.take(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }
}

fn write_at(data: &mut Vec<u8>, offset: usize, len: usize) -> &mut [u8] {
    if data.len() < offset + len {
        data.resize(offset + len, 0);
    }
    &mut data[offset..offset + len]
}

/// Apply an IPS patch in place. Writes past the end of `data` extend it.
///
/// Returns the number of records applied.
///
/// # Errors
///
/// Returns an error if the patch is structurally invalid. `data` may be partially patched when
/// this happens.
pub fn apply_ips(patch: &[u8], data: &mut Vec<u8>) -> Result<u32, PatchError> {
    if !patch.starts_with(HEADER) {
        return Err(PatchError::MissingHeader);
    }

    let mut reader = PatchReader { bytes: patch, position: HEADER.len() };
    let mut records = 0;
    loop {
        let offset = reader.u24()?;
        if offset == EOF_MARKER {
            break;
        }
        let offset = offset as usize;

        let len = reader.u16()?;
        if len == 0 {
            // RLE record
            let run_len = reader.u16()?;
            let value = reader.take(1)?[0];
            write_at(data, offset, run_len).fill(value);
        } else {
            let bytes = reader.take(len)?;
            write_at(data, offset, len).copy_from_slice(bytes);
        }

        records += 1;
    }

    match reader.remaining() {
        0 => {}
        3 => {
            let truncate_len = reader.u24()? as usize;
            data.truncate(truncate_len);
        }
        remaining => return Err(PatchError::TrailingData(remaining)),
    }

    Ok(records)
}

/// Apply the patch at `patch_path` if it exists.
///
/// Returns `Ok(false)` if there is no patch file.
///
/// # Errors
///
/// Returns an error if the patch file exists but cannot be read or is structurally invalid.
pub fn apply_if_present(patch_path: &Path, data: &mut Vec<u8>) -> Result<bool, PatchError> {
    let patch = match fs::read(patch_path) {
        Ok(patch) => patch,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(PatchError::Io(err)),
    };

    let records = apply_ips(&patch, data)?;
    log::info!("Applied {records} IPS records from '{}'", patch_path.display());

    Ok(true)
}
