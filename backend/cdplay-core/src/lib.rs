//! Built-in CD-DA player module: plays the audio tracks of a disc set in order

pub mod api;
mod player;
mod render;

pub use api::{CdPlayModule, CdPlayer};

#[cfg(test)]
mod testdisc;
