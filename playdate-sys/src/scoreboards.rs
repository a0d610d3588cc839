//! `playdate_scoreboards`: online leaderboards.
//!
//! Results passed to callbacks are owned by the caller and must be released
//! with the matching `free*` function.

use core::ffi::{c_char, c_int, c_uint};

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PDScore {
    pub rank: u32,
    pub value: u32,
    pub player: *mut c_char,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PDScoresList {
    pub boardID: *mut c_char,
    pub count: c_uint,
    pub lastUpdated: u32,
    pub playerIncluded: c_int,
    pub limit: c_uint,
    pub scores: *mut PDScore,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PDBoard {
    pub boardID: *mut c_char,
    pub name: *mut c_char,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PDBoardsList {
    pub count: c_uint,
    pub lastUpdated: u32,
    pub boards: *mut PDBoard,
}

pub type AddScoreCallback = unsafe extern "C" fn(score: *mut PDScore, error_message: *const c_char);
pub type PersonalBestCallback =
    unsafe extern "C" fn(score: *mut PDScore, error_message: *const c_char);
pub type BoardsListCallback =
    unsafe extern "C" fn(boards: *mut PDBoardsList, error_message: *const c_char);
pub type ScoresCallback =
    unsafe extern "C" fn(scores: *mut PDScoresList, error_message: *const c_char);

#[repr(C)]
pub struct playdate_scoreboards {
    pub addScore: Option<
        unsafe extern "C" fn(
            board_id: *const c_char,
            value: u32,
            callback: Option<AddScoreCallback>,
        ) -> c_int,
    >,
    pub getPersonalBest: Option<
        unsafe extern "C" fn(board_id: *const c_char, callback: Option<PersonalBestCallback>) -> c_int,
    >,
    pub freeScore: Option<unsafe extern "C" fn(score: *mut PDScore)>,
    pub getScoreboards: Option<unsafe extern "C" fn(callback: Option<BoardsListCallback>) -> c_int>,
    pub freeBoardsList: Option<unsafe extern "C" fn(boards: *mut PDBoardsList)>,
    pub getScores: Option<
        unsafe extern "C" fn(board_id: *const c_char, callback: Option<ScoresCallback>) -> c_int,
    >,
    pub freeScoresList: Option<unsafe extern "C" fn(scores: *mut PDScoresList)>,
}
