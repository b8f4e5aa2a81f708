pub mod collision;
pub mod constants;
pub mod map;
pub mod progression;
pub mod simulation;
pub mod state;
pub mod systems;
pub mod timers;
pub mod weapons;
