//! In-memory leaderboard server.
//!
//! Requests queue up until [`SimScoreboards::deliver`] answers them, like a
//! network round trip finishing on a later frame.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use playdate_core::scoreboards::{
    Board, BoardsCallback, BoardsList, Score, ScoreCallback, ScoreboardError, Scoreboards,
    ScoresCallback, ScoresList,
};

pub const MAX_BOARD_ID: usize = 64;
/// Entries per page returned by [`Scoreboards::scores`].
pub const PAGE_LIMIT: u32 = 10;

enum Request {
    Add(String, u32, ScoreCallback),
    Best(String, ScoreCallback),
    Boards(BoardsCallback),
    Scores(String, ScoresCallback),
}

impl Request {
    fn same_kind(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

struct Leaderboard {
    name: String,
    /// Best value per player.
    entries: BTreeMap<String, u32>,
}

impl Leaderboard {
    /// Entries ordered best first, ties by player name.
    fn ranked(&self) -> Vec<(&str, u32)> {
        let mut ranked: Vec<_> = self.entries.iter().map(|(p, v)| (p.as_str(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked
    }

    fn score_of<'a>(&'a self, player: &'a str) -> Option<Score<'a>> {
        let ranked = self.ranked();
        let rank = ranked.iter().position(|(p, _)| *p == player)?;
        Some(Score {
            rank: rank as u32 + 1,
            value: ranked[rank].1,
            player,
        })
    }
}

/// Host [`Scoreboards`].
pub struct SimScoreboards {
    player: RefCell<String>,
    boards: RefCell<BTreeMap<String, Leaderboard>>,
    pending: RefCell<Vec<Request>>,
    offline: Cell<Option<&'static str>>,
    now: Cell<u32>,
}

impl Default for SimScoreboards {
    fn default() -> Self {
        Self {
            player: RefCell::new("player".into()),
            boards: RefCell::new(BTreeMap::new()),
            pending: RefCell::new(Vec::new()),
            offline: Cell::new(None),
            now: Cell::new(0),
        }
    }
}

impl SimScoreboards {
    pub fn add_board(&self, board_id: &str, name: &str) {
        self.boards.borrow_mut().insert(
            board_id.into(),
            Leaderboard {
                name: name.into(),
                entries: BTreeMap::new(),
            },
        );
    }

    /// Record a score for someone other than the current player.
    pub fn seed(&self, board_id: &str, player: &str, value: u32) {
        if let Some(board) = self.boards.borrow_mut().get_mut(board_id) {
            let best = board.entries.entry(player.into()).or_insert(value);
            *best = (*best).max(value);
        }
    }

    pub fn set_player(&self, player: &str) {
        *self.player.borrow_mut() = player.into();
    }

    /// Fail every delivered request with `message`, or go back online.
    pub fn set_offline(&self, message: Option<&'static str>) {
        self.offline.set(message);
    }

    /// Timestamp reported as `last_updated`.
    pub fn set_time(&self, seconds: u32) {
        self.now.set(seconds);
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Answer every queued request in order.
    pub fn deliver(&self) {
        let requests = self.pending.take();
        for request in requests {
            self.answer(request);
        }
    }

    fn answer(&self, request: Request) {
        if let Some(message) = self.offline.get() {
            match request {
                Request::Add(_, _, cb) | Request::Best(_, cb) => cb(Err(message)),
                Request::Boards(cb) => cb(Err(message)),
                Request::Scores(_, cb) => cb(Err(message)),
            }
            return;
        }

        let player = self.player.borrow().clone();
        match request {
            Request::Add(id, value, cb) => {
                if !self.boards.borrow().contains_key(&id) {
                    return cb(Err("unknown board"));
                }
                self.seed(&id, &player, value);
                let boards = self.boards.borrow();
                match boards.get(&id).and_then(|b| b.score_of(&player)) {
                    Some(score) => cb(Ok(score)),
                    None => cb(Err("unknown board")),
                }
            }
            Request::Best(id, cb) => {
                let boards = self.boards.borrow();
                match boards.get(&id) {
                    None => cb(Err("unknown board")),
                    Some(board) => match board.score_of(&player) {
                        Some(score) => cb(Ok(score)),
                        None => cb(Err("no score")),
                    },
                }
            }
            Request::Boards(cb) => {
                let boards = self.boards.borrow();
                let list: Vec<Board<'_>> = boards
                    .iter()
                    .map(|(id, b)| Board {
                        board_id: id,
                        name: &b.name,
                    })
                    .collect();
                cb(Ok(BoardsList {
                    last_updated: self.now.get(),
                    boards: &list,
                }));
            }
            Request::Scores(id, cb) => {
                let boards = self.boards.borrow();
                let Some(board) = boards.get(&id) else {
                    return cb(Err("unknown board"));
                };
                let scores: Vec<Score<'_>> = board
                    .ranked()
                    .into_iter()
                    .take(PAGE_LIMIT as usize)
                    .enumerate()
                    .map(|(i, (p, value))| Score {
                        rank: i as u32 + 1,
                        value,
                        player: p,
                    })
                    .collect();
                cb(Ok(ScoresList {
                    board_id: &id,
                    last_updated: self.now.get(),
                    player_included: scores.iter().any(|s| s.player == player),
                    limit: PAGE_LIMIT,
                    scores: &scores,
                }));
            }
        }
    }

    fn queue(&self, request: Request) -> Result<(), ScoreboardError> {
        let mut pending = self.pending.borrow_mut();
        if pending.iter().any(|r| r.same_kind(&request)) {
            return Err(ScoreboardError::Busy);
        }
        pending.push(request);
        Ok(())
    }
}

fn check_board_id(board_id: &str) -> Result<String, ScoreboardError> {
    if board_id.is_empty() || board_id.len() >= MAX_BOARD_ID || board_id.contains('\0') {
        return Err(ScoreboardError::InvalidBoardId);
    }
    Ok(board_id.into())
}

impl Scoreboards for SimScoreboards {
    fn add_score(
        &self,
        board_id: &str,
        value: u32,
        callback: ScoreCallback,
    ) -> Result<(), ScoreboardError> {
        self.queue(Request::Add(check_board_id(board_id)?, value, callback))
    }

    fn personal_best(
        &self,
        board_id: &str,
        callback: ScoreCallback,
    ) -> Result<(), ScoreboardError> {
        self.queue(Request::Best(check_board_id(board_id)?, callback))
    }

    fn boards(&self, callback: BoardsCallback) -> Result<(), ScoreboardError> {
        self.queue(Request::Boards(callback))
    }

    fn scores(&self, board_id: &str, callback: ScoresCallback) -> Result<(), ScoreboardError> {
        self.queue(Request::Scores(check_board_id(board_id)?, callback))
    }
}
