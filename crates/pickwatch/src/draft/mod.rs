// Draft domain: players, picks, roster composition and draft state.

pub mod pick;
pub mod player;
pub mod roster;
pub mod state;
