pub use achievements::*;
pub use board::*;
pub use cell::*;
pub use combo::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use game::*;
pub use powerup::*;
pub use progress::*;
pub use session::*;
pub use types::*;

mod achievements;
mod board;
mod cell;
mod combo;
mod engine;
mod error;
mod events;
mod game;
mod powerup;
mod progress;
mod session;
mod types;
