mod events;
mod graph;
mod reconnect;
pub mod seed;
mod store;
mod substitution;
mod validation;

pub use events::*;
pub use graph::*;
pub use reconnect::*;
pub use store::*;
pub use substitution::*;
pub use validation::*;
