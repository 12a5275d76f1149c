//! Extracting content from .zip and .7z archives

use crate::extensions;
use std::fs::File;
use std::io;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error reading archive file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error reading .zip archive '{path}': {source}")]
    Zip {
        path: String,
        #[source]
        source: ZipError,
    },
    #[error("Error reading .7z archive '{path}': {source}")]
    SevenZ {
        path: String,
        #[source]
        source: sevenz_rust::Error,
    },
    #[error("No files with supported extensions found in archive '{path}'")]
    NoSupportedFiles { path: String },
    #[error("Unsupported archive format: '{path}'")]
    UnsupportedFormat { path: String },
}

impl ArchiveError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    fn zip(path: &Path, source: ZipError) -> Self {
        Self::Zip { path: path.display().to_string(), source }
    }

    fn sevenz(path: &Path, source: sevenz_rust::Error) -> Self {
        Self::SevenZ { path: path.display().to_string(), source }
    }

    fn no_supported_files(path: &Path) -> Self {
        Self::NoSupportedFiles { path: path.display().to_string() }
    }
}

/// A file extracted from an archive.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    pub file_name: String,
    pub extension: String,
    pub data: Vec<u8>,
}

fn supported_extension(file_name: &str, supported_extensions: &[&str]) -> Option<String> {
    extensions::from_path(file_name)
        .filter(|extension| supported_extensions.contains(&extension.as_str()))
}

/// Extract the first file in a .zip or .7z archive whose extension is in `supported_extensions`.
///
/// # Errors
///
/// Propagates any I/O or decoding errors, and returns [`ArchiveError::NoSupportedFiles`] if no
/// entry has a supported extension.
pub fn read_first_supported(
    archive_path: &Path,
    supported_extensions: &[&str],
) -> Result<ArchiveFile, ArchiveError> {
    let file = match extensions::from_path(archive_path).as_deref() {
        Some("zip") => first_supported_in_zip(archive_path, supported_extensions)?,
        Some("7z") => first_supported_in_7z(archive_path, supported_extensions)?,
        _ => {
            return Err(ArchiveError::UnsupportedFormat {
                path: archive_path.display().to_string(),
            });
        }
    };
    let file = file.ok_or_else(|| ArchiveError::no_supported_files(archive_path))?;

    log::info!("Extracted '{}' from archive '{}'", file.file_name, archive_path.display());

    Ok(file)
}

fn first_supported_in_zip(
    zip_path: &Path,
    supported_extensions: &[&str],
) -> Result<Option<ArchiveFile>, ArchiveError> {
    let io_err_fn = |source| ArchiveError::io(zip_path, source);
    let zip_err_fn = |source| ArchiveError::zip(zip_path, source);

    let file = File::open(zip_path).map_err(io_err_fn)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(zip_err_fn)?;

    let Some((file_name, extension)) = archive.file_names().find_map(|file_name| {
        supported_extension(file_name, supported_extensions)
            .map(|extension| (file_name.to_string(), extension))
    }) else {
        return Ok(None);
    };

    let mut entry = archive.by_name(&file_name).map_err(zip_err_fn)?;
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data).map_err(io_err_fn)?;

    Ok(Some(ArchiveFile { file_name, extension, data }))
}

fn first_supported_in_7z(
    sevenz_path: &Path,
    supported_extensions: &[&str],
) -> Result<Option<ArchiveFile>, ArchiveError> {
    let io_err_fn = |source| ArchiveError::io(sevenz_path, source);
    let sevenz_err_fn = |source| ArchiveError::sevenz(sevenz_path, source);

    let file = File::open(sevenz_path).map_err(io_err_fn)?;
    let file_len = file.metadata().map_err(io_err_fn)?.len();
    let mut reader = BufReader::new(file);
    let archive = sevenz_rust::Archive::read(&mut reader, file_len, &[]).map_err(sevenz_err_fn)?;

    for folder_idx in 0..archive.folders.len() {
        let decoder = sevenz_rust::BlockDecoder::new(folder_idx, &archive, &[], &mut reader);

        let mut found: Option<ArchiveFile> = None;
        decoder
            .for_each_entries(&mut |entry, entry_reader| {
                // Directories have no stream
                let extension = entry
                    .has_stream
                    .then(|| supported_extension(entry.name.as_str(), supported_extensions))
                    .flatten();

                match extension {
                    Some(extension) => {
                        let mut data = Vec::new();
                        entry_reader.read_to_end(&mut data)?;
                        found = Some(ArchiveFile { file_name: entry.name.clone(), extension, data });
                        Ok(false)
                    }
                    None => {
                        io::copy(entry_reader, &mut io::sink())?;
                        Ok(true)
                    }
                }
            })
            .map_err(sevenz_err_fn)?;

        if found.is_some() {
            return Ok(found);
        }
    }

    Ok(None)
}
