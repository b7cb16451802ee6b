pub mod entity;
pub mod grid;
pub mod level;
pub mod player;
pub mod policy;
pub mod sensor;
