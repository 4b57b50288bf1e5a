pub mod action;
pub mod game_state;
pub mod player;
pub mod tile;
pub mod tile_set;
