pub mod ai;
pub mod combat;
pub mod economy;
pub mod movement;
pub mod waves;
