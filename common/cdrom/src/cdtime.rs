//! Minutes/seconds/frames addressing as used in CUE sheets

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CdTime {
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl CdTime {
    pub const ZERO: Self = Self { minutes: 0, seconds: 0, frames: 0 };

    pub const MAX_MINUTES: u8 = 100;
    pub const SECONDS_PER_MINUTE: u8 = 60;
    pub const FRAMES_PER_SECOND: u8 = 75;

    /// # Panics
    ///
    /// Panics if any component is out of range.
    #[must_use]
    pub fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self::new_checked(minutes, seconds, frames)
            .unwrap_or_else(|| panic!("Invalid CD time: {minutes:02}:{seconds:02}:{frames:02}"))
    }

    #[must_use]
    pub fn new_checked(minutes: u8, seconds: u8, frames: u8) -> Option<Self> {
        (minutes < Self::MAX_MINUTES
            && seconds < Self::SECONDS_PER_MINUTE
            && frames < Self::FRAMES_PER_SECOND)
            .then_some(Self { minutes, seconds, frames })
    }

    #[must_use]
    pub fn to_sector_number(self) -> u32 {
        (u32::from(Self::SECONDS_PER_MINUTE) * u32::from(self.minutes) + u32::from(self.seconds))
            * u32::from(Self::FRAMES_PER_SECOND)
            + u32::from(self.frames)
    }

}

impl PartialOrd for CdTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CdTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.minutes
            .cmp(&other.minutes)
            .then(self.seconds.cmp(&other.seconds))
            .then(self.frames.cmp(&other.frames))
    }
}

impl FromStr for CdTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = s.split(':');
        let (Some(minutes), Some(seconds), Some(frames), None) =
            (components.next(), components.next(), components.next(), components.next())
        else {
            return Err(format!("Unexpected time format: {s}"));
        };

        let err_fn = |_err| format!("Invalid time string: {s}");
        let minutes: u8 = minutes.parse().map_err(err_fn)?;
        let seconds: u8 = seconds.parse().map_err(err_fn)?;
        let frames: u8 = frames.parse().map_err(err_fn)?;

        Self::new_checked(minutes, seconds, frames)
            .ok_or_else(|| format!("Time component out of range: {s}"))
    }
}

impl Display for CdTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minutes, self.seconds, self.frames)
    }
}
