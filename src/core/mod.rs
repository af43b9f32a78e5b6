pub mod display;
pub mod entity;
pub mod game;
pub mod page;

pub use entity::Entity;
pub use game::{ExternalLink, Game, PlayerCountRec};
pub use page::{ListResponse, Page};
