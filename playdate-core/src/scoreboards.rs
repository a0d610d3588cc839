//! Online leaderboards.
//!
//! Every request completes later through its callback, which gets either the
//! payload or the server's error message. Payloads are only borrowed for the
//! duration of the callback.

/// A single leaderboard entry (`PDScore`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Score<'a> {
    pub rank: u32,
    pub value: u32,
    pub player: &'a str,
}

/// One page of a leaderboard (`PDScoresList`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScoresList<'a> {
    pub board_id: &'a str,
    /// Seconds since epoch of the server's last update.
    pub last_updated: u32,
    /// The current player appears in `scores`.
    pub player_included: bool,
    pub limit: u32,
    pub scores: &'a [Score<'a>],
}

/// A leaderboard known to the server (`PDBoard`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Board<'a> {
    pub board_id: &'a str,
    pub name: &'a str,
}

/// All leaderboards of the game (`PDBoardsList`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardsList<'a> {
    pub last_updated: u32,
    pub boards: &'a [Board<'a>],
}

pub type ScoreCallback = for<'a> fn(Result<Score<'a>, &'a str>);
pub type ScoresCallback = for<'a> fn(Result<ScoresList<'a>, &'a str>);
pub type BoardsCallback = for<'a> fn(Result<BoardsList<'a>, &'a str>);

/// Error type for starting a scoreboard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoreboardError {
    /// The firmware table lacks the entry point.
    Missing,
    /// Board id contains a NUL byte or is too long.
    InvalidBoardId,
    /// A request of the same kind is still in flight.
    Busy,
    /// The firmware refused to start the request.
    Rejected,
}

/// The `Scoreboards` table.
pub trait Scoreboards {
    /// Submit `value`. The callback receives the resulting entry.
    fn add_score(
        &self,
        board_id: &str,
        value: u32,
        callback: ScoreCallback,
    ) -> Result<(), ScoreboardError>;

    fn personal_best(&self, board_id: &str, callback: ScoreCallback)
        -> Result<(), ScoreboardError>;

    fn boards(&self, callback: BoardsCallback) -> Result<(), ScoreboardError>;

    fn scores(&self, board_id: &str, callback: ScoresCallback) -> Result<(), ScoreboardError>;
}
