//! Leaderboard requests.
//!
//! The firmware's completion callbacks carry no context, so each request
//! kind has one static slot holding the game's callback. A second request
//! of the same kind before the first completes is refused as
//! [`ScoreboardError::Busy`].

use core::ffi::{c_char, c_int};
use core::sync::atomic::{AtomicPtr, Ordering};

use ::playdate_sys as sys;
use playdate_core::scoreboards::{
    Board, BoardsCallback, BoardsList, Score, ScoreCallback, ScoreboardError, Scoreboards,
    ScoresCallback, ScoresList,
};
use sys::{playdate_scoreboards, PDBoardsList, PDScore, PDScoresList};

use crate::ffi::{borrow_str, invoke, Name};

/// Scores delivered per list; extra entries are dropped.
pub const MAX_SCORES: usize = 64;
/// Boards delivered per list; extra entries are dropped.
pub const MAX_BOARDS: usize = 64;

const UNKNOWN_ERROR: &str = "unknown error";

static TABLE: AtomicPtr<playdate_scoreboards> = AtomicPtr::new(core::ptr::null_mut());

/// One pending callback, stored as a type-erased fn pointer.
struct CallbackSlot(AtomicPtr<()>);

impl CallbackSlot {
    const fn new() -> Self {
        Self(AtomicPtr::new(core::ptr::null_mut()))
    }

    fn claim(&self, callback: *mut ()) -> Result<(), ScoreboardError> {
        self.0
            .compare_exchange(
                core::ptr::null_mut(),
                callback,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(drop)
            .map_err(|_| ScoreboardError::Busy)
    }

    fn take(&self) -> Option<*mut ()> {
        let callback = self.0.swap(core::ptr::null_mut(), Ordering::AcqRel);
        (!callback.is_null()).then_some(callback)
    }
}

static ADD_SCORE: CallbackSlot = CallbackSlot::new();
static PERSONAL_BEST: CallbackSlot = CallbackSlot::new();
static BOARDS: CallbackSlot = CallbackSlot::new();
static SCORES: CallbackSlot = CallbackSlot::new();

fn table() -> Option<&'static playdate_scoreboards> {
    // SAFETY: only set from a `&'static playdate_scoreboards`.
    unsafe { TABLE.load(Ordering::Acquire).as_ref() }
}

fn error_text<'a>(message: *const c_char) -> &'a str {
    // SAFETY: null or a message owned by the firmware for the callback.
    unsafe { borrow_str(message) }.unwrap_or(UNKNOWN_ERROR)
}

/// # Safety
///
/// `player` must be null or a NUL-terminated string valid for `'a`.
unsafe fn to_score<'a>(raw: &PDScore) -> Score<'a> {
    Score {
        rank: raw.rank,
        value: raw.value,
        // SAFETY: per the caller.
        player: unsafe { borrow_str(raw.player) }.unwrap_or_default(),
    }
}

fn score_done(slot: &CallbackSlot, score: *mut PDScore, message: *const c_char) {
    let Some(callback) = slot.take() else {
        return;
    };
    // SAFETY: the slot only ever holds a `ScoreCallback`.
    let callback = unsafe { core::mem::transmute::<*mut (), ScoreCallback>(callback) };
    // SAFETY: a non-null score is valid until freed below.
    match unsafe { score.as_ref() } {
        Some(raw) => {
            // SAFETY: the player name lives as long as the score.
            callback(Ok(unsafe { to_score(raw) }));
            if let Some(table) = table() {
                invoke!(table, freeScore(score));
            }
        }
        None => callback(Err(error_text(message))),
    }
}

unsafe extern "C" fn add_score_done(score: *mut PDScore, message: *const c_char) {
    score_done(&ADD_SCORE, score, message);
}

unsafe extern "C" fn personal_best_done(score: *mut PDScore, message: *const c_char) {
    score_done(&PERSONAL_BEST, score, message);
}

unsafe extern "C" fn boards_done(boards: *mut PDBoardsList, message: *const c_char) {
    let Some(callback) = BOARDS.take() else {
        return;
    };
    // SAFETY: the slot only ever holds a `BoardsCallback`.
    let callback = unsafe { core::mem::transmute::<*mut (), BoardsCallback>(callback) };
    // SAFETY: a non-null list is valid until freed below.
    let Some(raw) = (unsafe { boards.as_ref() }) else {
        callback(Err(error_text(message)));
        return;
    };
    let mut list: heapless::Vec<Board<'_>, MAX_BOARDS> = heapless::Vec::new();
    if !raw.boards.is_null() {
        // SAFETY: `count` boards follow, owned by the list.
        let items = unsafe { core::slice::from_raw_parts(raw.boards, raw.count as usize) };
        for board in items {
            // SAFETY: ids and names live as long as the list.
            let entry = unsafe {
                Board {
                    board_id: borrow_str(board.boardID).unwrap_or_default(),
                    name: borrow_str(board.name).unwrap_or_default(),
                }
            };
            if list.push(entry).is_err() {
                log::warn!("boards: dropped {} entries", items.len() - MAX_BOARDS);
                break;
            }
        }
    }
    callback(Ok(BoardsList {
        last_updated: raw.lastUpdated,
        boards: &list,
    }));
    if let Some(table) = table() {
        invoke!(table, freeBoardsList(boards));
    }
}

unsafe extern "C" fn scores_done(scores: *mut PDScoresList, message: *const c_char) {
    let Some(callback) = SCORES.take() else {
        return;
    };
    // SAFETY: the slot only ever holds a `ScoresCallback`.
    let callback = unsafe { core::mem::transmute::<*mut (), ScoresCallback>(callback) };
    // SAFETY: a non-null list is valid until freed below.
    let Some(raw) = (unsafe { scores.as_ref() }) else {
        callback(Err(error_text(message)));
        return;
    };
    let mut list: heapless::Vec<Score<'_>, MAX_SCORES> = heapless::Vec::new();
    if !raw.scores.is_null() {
        // SAFETY: `count` scores follow, owned by the list.
        let items = unsafe { core::slice::from_raw_parts(raw.scores, raw.count as usize) };
        for score in items {
            // SAFETY: player names live as long as the list.
            if list.push(unsafe { to_score(score) }).is_err() {
                log::warn!("scores: dropped {} entries", items.len() - MAX_SCORES);
                break;
            }
        }
    }
    callback(Ok(ScoresList {
        // SAFETY: the id lives as long as the list.
        board_id: unsafe { borrow_str(raw.boardID) }.unwrap_or_default(),
        last_updated: raw.lastUpdated,
        player_included: raw.playerIncluded != 0,
        limit: raw.limit,
        scores: &list,
    }));
    if let Some(table) = table() {
        invoke!(table, freeScoresList(scores));
    }
}

/// [`Scoreboards`] over `playdate_scoreboards`.
#[derive(Clone, Copy)]
pub struct DeviceScoreboards {
    table: &'static playdate_scoreboards,
}

impl DeviceScoreboards {
    pub(crate) fn new(table: &'static playdate_scoreboards) -> Self {
        Self { table }
    }

    /// Park `callback` in `slot` and issue the request. The slot is released
    /// again if the request never leaves.
    fn request(
        &self,
        slot: &CallbackSlot,
        callback: *mut (),
        send: impl FnOnce() -> Option<c_int>,
    ) -> Result<(), ScoreboardError> {
        TABLE.store(core::ptr::from_ref(self.table).cast_mut(), Ordering::Release);
        slot.claim(callback)?;
        match send() {
            None => {
                slot.take();
                Err(ScoreboardError::Missing)
            }
            Some(0) => {
                slot.take();
                Err(ScoreboardError::Rejected)
            }
            Some(_) => Ok(()),
        }
    }
}

fn board_id(id: &str) -> Result<Name, ScoreboardError> {
    Name::new(id).ok_or(ScoreboardError::InvalidBoardId)
}

impl Scoreboards for DeviceScoreboards {
    fn add_score(
        &self,
        board_id: &str,
        value: u32,
        callback: ScoreCallback,
    ) -> Result<(), ScoreboardError> {
        let mut id = self::board_id(board_id)?;
        self.request(&ADD_SCORE, callback as *mut (), || {
            invoke!(self.table, addScore(id.as_ptr(), value, Some(add_score_done)))
        })
    }

    fn personal_best(
        &self,
        board_id: &str,
        callback: ScoreCallback,
    ) -> Result<(), ScoreboardError> {
        let mut id = self::board_id(board_id)?;
        self.request(&PERSONAL_BEST, callback as *mut (), || {
            invoke!(self.table, getPersonalBest(id.as_ptr(), Some(personal_best_done)))
        })
    }

    fn boards(&self, callback: BoardsCallback) -> Result<(), ScoreboardError> {
        self.request(&BOARDS, callback as *mut (), || {
            invoke!(self.table, getScoreboards(Some(boards_done)))
        })
    }

    fn scores(&self, board_id: &str, callback: ScoresCallback) -> Result<(), ScoreboardError> {
        let mut id = self::board_id(board_id)?;
        self.request(&SCORES, callback as *mut (), || {
            invoke!(self.table, getScores(id.as_ptr(), Some(scores_done)))
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::{Cell, RefCell};
    use std::boxed::Box;
    use std::string::{String, ToString};
    use std::vec::Vec;

    // The callback slots are process-wide, so the whole request cycle is
    // exercised in one test.

    std::thread_local! {
        static PENDING: Cell<Option<sys::ScoresCallback>> = const { Cell::new(None) };
        static SEEN: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        static FREED: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn get_scores(
        _board_id: *const c_char,
        callback: Option<sys::ScoresCallback>,
    ) -> c_int {
        PENDING.with(|p| p.set(callback));
        1
    }

    unsafe extern "C" fn free_scores_list(_scores: *mut PDScoresList) {
        FREED.with(|f| f.set(f.get() + 1));
    }

    fn on_scores(result: Result<ScoresList<'_>, &str>) {
        let line = match result {
            Ok(list) => {
                let names: Vec<&str> = list.scores.iter().map(|s| s.player).collect();
                std::format!("{} {}", list.board_id, names.join(","))
            }
            Err(message) => message.to_string(),
        };
        SEEN.with(|s| s.borrow_mut().push(line));
    }

    fn on_score(_result: Result<Score<'_>, &str>) {}

    fn scoreboards() -> DeviceScoreboards {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_scoreboards = unsafe { core::mem::zeroed() };
        table.getScores = Some(get_scores);
        table.freeScoresList = Some(free_scores_list);
        DeviceScoreboards::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_request_cycle() {
        let boards = scoreboards();
        boards.scores("hiscores", on_scores).unwrap();
        assert_eq!(
            boards.scores("hiscores", on_scores),
            Err(ScoreboardError::Busy)
        );

        let mut scores = [
            PDScore {
                rank: 1,
                value: 900,
                player: c"ada".as_ptr().cast_mut(),
            },
            PDScore {
                rank: 2,
                value: 400,
                player: c"lin".as_ptr().cast_mut(),
            },
        ];
        let mut list = PDScoresList {
            boardID: c"hiscores".as_ptr().cast_mut(),
            count: 2,
            lastUpdated: 0,
            playerIncluded: 1,
            limit: 10,
            scores: scores.as_mut_ptr(),
        };
        let deliver = PENDING.with(Cell::get).unwrap();
        unsafe { deliver(&mut list, core::ptr::null()) };
        FREED.with(|f| assert_eq!(f.get(), 1));

        // The slot is free again; this time the server fails
        boards.scores("hiscores", on_scores).unwrap();
        unsafe { deliver(core::ptr::null_mut(), c"offline".as_ptr()) };
        SEEN.with(|s| assert_eq!(*s.borrow(), ["hiscores ada,lin", "offline"]));

        assert_eq!(
            boards.add_score("hiscores", 5, on_score),
            Err(ScoreboardError::Missing)
        );
        // A refused request does not hold the slot
        assert_eq!(
            boards.add_score("hiscores", 5, on_score),
            Err(ScoreboardError::Missing)
        );
        assert_eq!(
            boards.personal_best("bad\0id", on_score),
            Err(ScoreboardError::InvalidBoardId)
        );
    }
}
