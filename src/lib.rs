pub mod arena;
pub mod bot;
pub mod config;
pub mod distance;
pub mod game;
pub mod policy;
pub mod safety;
pub mod select;
pub mod step;
pub mod trace;

pub use arena::*;
pub use bot::*;
pub use config::*;
pub use distance::{Route, Router};
pub use game::*;
pub use policy::*;
pub use safety::{BoardGate, MoveGate, Safety};
pub use step::StepPlanner;
pub use trace::*;
