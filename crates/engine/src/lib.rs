//! Authoritative model of a Hexboard table.
//!
//! The board is laid out in cube coordinates (`hex`, `layout`), stocked with
//! resources and number tokens (`resource`), and mutated only through
//! `Game::apply`. Every applied action can be recorded in the SQLite
//! `Journal`, which also keeps the latest table so a restart resumes play.

pub mod board;
pub mod deck;
pub mod error;
pub mod game;
pub mod hex;
pub mod journal;
pub mod layout;
pub mod player;
pub mod resource;

pub use deck::DevCard;
pub use error::GameError;
pub use game::{Action, Applied, Game, Settings};
pub use journal::{Journal, LoggedEvent};
pub use layout::LayoutKind;
pub use resource::Resource;
