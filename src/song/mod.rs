//! Song concept domain types.

mod models;

pub use models::{
    AlbumArt, Dial, LatentParams, Lyrics, ParamError, SongStructure, VoiceName, DIAL_MAX,
};

#[cfg(test)]
pub(crate) use models::sample_song;
