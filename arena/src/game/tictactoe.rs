//! TikTakToe: 3x3 grid, player1 plays X and moves first.

use super::{GameRules, Terminal};
use crate::{
    bracket::models::Seat,
    tournament::errors::{TournamentError, TournamentResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GAME_ID: &str = "tiktaktoe";

const CELLS: usize = 9;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn of(seat: Seat) -> Self {
        match seat {
            Seat::Player1 => Mark::X,
            Seat::Player2 => Mark::O,
        }
    }

    fn seat(self) -> Seat {
        match self {
            Mark::X => Seat::Player1,
            Mark::O => Seat::Player2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub seat: Seat,
    pub mark: Mark,
    pub position: usize,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub board: [Option<Mark>; CELLS],
    pub next: Seat,
    pub moves: Vec<MoveRecord>,
    pub started_at: DateTime<Utc>,
}

impl BoardState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            board: [None; CELLS],
            next: Seat::Player1,
            moves: Vec::new(),
            started_at: now,
        }
    }

    fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| match self.board[a] {
            Some(mark) if self.board[b] == Some(mark) && self.board[c] == Some(mark) => Some(mark),
            _ => None,
        })
    }

    fn is_full(&self) -> bool {
        self.board.iter().all(Option::is_some)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Move {
    position: usize,
}

fn decode_state(state: &serde_json::Value) -> TournamentResult<BoardState> {
    serde_json::from_value(state.clone())
        .map_err(|e| TournamentError::IntegrityFault(format!("unreadable board state: {e}")))
}

fn decode_move(mv: &serde_json::Value) -> TournamentResult<Move> {
    serde_json::from_value(mv.clone())
        .map_err(|e| TournamentError::Validation(format!("malformed move: {e}")))
}

fn encode_state(state: &BoardState) -> TournamentResult<serde_json::Value> {
    serde_json::to_value(state)
        .map_err(|e| TournamentError::IntegrityFault(format!("cannot encode board state: {e}")))
}

/// TikTakToe rules
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl GameRules for TicTacToe {
    fn new_state(&self, now: DateTime<Utc>) -> TournamentResult<serde_json::Value> {
        encode_state(&BoardState::new(now))
    }

    fn validate_move(&self, state: &serde_json::Value, seat: Seat, mv: &serde_json::Value) -> TournamentResult<()> {
        let board = decode_state(state)?;
        let Move { position } = decode_move(mv)?;

        if board.winner().is_some() {
            return Err(TournamentError::InvalidState("game is already decided".to_string()));
        }
        if board.next != seat {
            return Err(TournamentError::InvalidState("not your turn".to_string()));
        }
        if position >= CELLS {
            return Err(TournamentError::Validation(format!(
                "position {position} is off the board"
            )));
        }
        if board.board[position].is_some() {
            return Err(TournamentError::Validation(format!(
                "position {position} is already taken"
            )));
        }
        Ok(())
    }

    fn apply_move(
        &self,
        state: serde_json::Value,
        seat: Seat,
        mv: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> TournamentResult<serde_json::Value> {
        self.validate_move(&state, seat, mv)?;
        let mut board = decode_state(&state)?;
        let Move { position } = decode_move(mv)?;

        let mark = Mark::of(seat);
        board.board[position] = Some(mark);
        board.moves.push(MoveRecord {
            seat,
            mark,
            position,
            played_at: now,
        });
        board.next = seat.opponent();

        encode_state(&board)
    }

    fn detect_terminal(&self, state: &serde_json::Value) -> TournamentResult<Option<Terminal>> {
        let board = decode_state(state)?;
        Ok(match board.winner() {
            Some(mark) => Some(Terminal::Winner(mark.seat())),
            None if board.is_full() => Some(Terminal::Draw),
            None => None,
        })
    }
}
