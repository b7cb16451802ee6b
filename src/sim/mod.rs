pub mod arcade;
pub mod builder;
pub mod event;
pub mod step;
pub mod world;
