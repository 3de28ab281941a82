//! Wire types for the Playroom game server.
//!
//! Everything the server pushes is wrapped in a [`Frame`]: either an error
//! with a message, or a payload in `data`. Room connections carry a
//! [`RoomSnapshot`] per frame; the roster connection carries a
//! `Vec<RoomSnapshot>`. The client answers with plain-text [`Command`]s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ProtocolError;

/// Side length of the game board.
pub const BOARD_SIZE: usize = 15;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a room.
///
/// Serialized as the bare string (`"abc123"`), not as an object.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Numeric user identifier.
///
/// The server may send it either as a JSON number or as a decimal string;
/// both decode to the same value. It is always written back as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(UserId(id)),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(UserId)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A stored file reference, used for avatars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub key: String,
    pub url: String,
}

/// A registered user as the server describes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<Asset>,
}

/// One seat's occupant. `user` is `None` for anonymous guests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub user: Option<User>,
}

impl Player {
    /// An anonymous player.
    pub fn guest() -> Self {
        Self { user: None }
    }

    pub fn new(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// The user's name, or `"Guest"` for anonymous players.
    pub fn display_name(&self) -> &str {
        self.user.as_ref().map_or("Guest", |user| user.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Which of the two seats in a room.
///
/// On the wire: `0` for the host, `1` for the other player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Seat {
    Host,
    Other,
}

impl Seat {
    pub fn opponent(self) -> Seat {
        match self {
            Seat::Host => Seat::Other,
            Seat::Other => Seat::Host,
        }
    }
}

impl TryFrom<u8> for Seat {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Seat::Host),
            1 => Ok(Seat::Other),
            other => Err(ProtocolError::InvalidMessage(format!(
                "seat must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> u8 {
        match seat {
            Seat::Host => 0,
            Seat::Other => 1,
        }
    }
}

/// One board position: empty (`null` on the wire) or owned by a seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<Seat>", into = "Option<Seat>")]
pub enum Cell {
    #[default]
    Empty,
    Taken(Seat),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    pub fn owner(self) -> Option<Seat> {
        match self {
            Cell::Empty => None,
            Cell::Taken(seat) => Some(seat),
        }
    }
}

impl From<Option<Seat>> for Cell {
    fn from(seat: Option<Seat>) -> Self {
        seat.map_or(Cell::Empty, Cell::Taken)
    }
}

impl From<Cell> for Option<Seat> {
    fn from(cell: Cell) -> Self {
        cell.owner()
    }
}

/// The 15×15 grid of a room.
///
/// Decoding rejects any array that is not exactly 15 rows of 15 cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// The cell at (`row`, `col`), or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Overwrites one cell. Returns `false` when out of range.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Builder form of [`set`](Self::set); out-of-range positions are ignored.
    pub fn with(mut self, row: usize, col: usize, cell: Cell) -> Self {
        self.set(row, col, cell);
        self
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_SIZE]> {
        self.cells.iter()
    }

    /// Number of occupied cells.
    pub fn marks(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Positions whose value differs between `self` and `next`.
    pub fn diff(&self, next: &Board) -> ChangeMask {
        let mut mask = ChangeMask::default();
        for (row, (old, new)) in self.cells.iter().zip(next.cells.iter()).enumerate() {
            for (col, (a, b)) in old.iter().zip(new.iter()).enumerate() {
                mask.changed[row][col] = a != b;
            }
        }
        mask
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = ProtocolError;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        if rows.len() != BOARD_SIZE {
            return Err(ProtocolError::InvalidMessage(format!(
                "board must have {BOARD_SIZE} rows, got {}",
                rows.len()
            )));
        }
        let mut board = Board::new();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return Err(ProtocolError::InvalidMessage(format!(
                    "board row {r} must have {BOARD_SIZE} cells, got {}",
                    row.len()
                )));
            }
            for (c, cell) in row.into_iter().enumerate() {
                board.cells[r][c] = cell;
            }
        }
        Ok(board)
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Self {
        board.cells.iter().map(|row| row.to_vec()).collect()
    }
}

/// Per-position "did this cell change on the last merge" flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeMask {
    changed: [[bool; BOARD_SIZE]; BOARD_SIZE],
}

impl ChangeMask {
    pub fn is_changed(&self, row: usize, col: usize) -> bool {
        self.changed
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Returns `true` if any position changed.
    pub fn any(&self) -> bool {
        self.changed.iter().flatten().any(|&c| c)
    }

    pub fn count(&self) -> usize {
        self.changed.iter().flatten().filter(|&&c| c).count()
    }

    /// Changed positions as `(row, col)`, in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.changed.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, changed)| **changed)
                .map(move |(col, _)| (row, col))
        })
    }
}

impl Default for ChangeMask {
    fn default() -> Self {
        Self {
            changed: [[false; BOARD_SIZE]; BOARD_SIZE],
        }
    }
}

// ---------------------------------------------------------------------------
// Room snapshot
// ---------------------------------------------------------------------------

/// The full state of one room as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    /// Append-only event log.
    #[serde(default)]
    pub logs: Vec<String>,
    pub host: Player,
    #[serde(default)]
    pub other: Option<Player>,
    #[serde(default)]
    pub board: Board,
    /// Whose move it is. Only meaningful once `started` is set.
    #[serde(default = "host_seat")]
    pub turn: Seat,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub ended: bool,
    /// `None` while the game runs or when it ended without a winner.
    #[serde(default, deserialize_with = "winner_or_unset")]
    pub winner: Option<Seat>,
}

impl RoomSnapshot {
    /// A freshly created room: host seated, nothing played yet.
    pub fn new(id: impl Into<RoomId>, host: Player) -> Self {
        Self {
            id: id.into(),
            logs: Vec::new(),
            host,
            other: None,
            board: Board::new(),
            turn: Seat::Host,
            started: false,
            ended: false,
            winner: None,
        }
    }
}

fn host_seat() -> Seat {
    Seat::Host
}

/// Servers encode "no winner" as `null`, omit the field, or send an
/// out-of-range sentinel such as `-1`. All of those decode to `None`.
fn winner_or_unset<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Seat>, D::Error> {
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(match raw {
        Some(0) => Some(Seat::Host),
        Some(1) => Some(Seat::Other),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// The envelope of every server-pushed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame<T> {
    #[serde(default)]
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Frame<T> {
    /// A successful frame carrying `data`.
    pub fn data(data: T) -> Self {
        Self {
            error: false,
            message: None,
            data: Some(data),
        }
    }

    /// An error frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A plain-text command sent from the client over a connection.
///
/// | Command            | Text          |
/// |--------------------|---------------|
/// | `Start`            | `START`       |
/// | `Chat(text)`       | `CHAT <text>` |
/// | `Move { row, col }`| `MOVE r c`    |
/// | `Request`          | `REQUEST`     |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Chat(String),
    Move { row: usize, col: usize },
    /// Asks the roster endpoint to push the current room list.
    Request,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => f.write_str("START"),
            Command::Chat(text) => write!(f, "CHAT {text}"),
            Command::Move { row, col } => write!(f, "MOVE {row} {col}"),
            Command::Request => f.write_str("REQUEST"),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = text.split_once(' ').unwrap_or((text, ""));
        match verb {
            "START" if rest.is_empty() => Ok(Command::Start),
            "REQUEST" if rest.is_empty() => Ok(Command::Request),
            "CHAT" => Ok(Command::Chat(rest.to_string())),
            "MOVE" => {
                let mut coords = rest.split_whitespace().map(str::parse::<usize>);
                match (coords.next(), coords.next(), coords.next()) {
                    (Some(Ok(row)), Some(Ok(col)), None) => {
                        Ok(Command::Move { row, col })
                    }
                    _ => Err(ProtocolError::InvalidMessage(format!(
                        "malformed move: {text:?}"
                    ))),
                }
            }
            _ => Err(ProtocolError::InvalidMessage(format!(
                "unknown command: {text:?}"
            ))),
        }
    }
}
