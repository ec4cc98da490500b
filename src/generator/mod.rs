pub mod compose;
pub mod context;
pub mod crew;
pub mod outlet;
pub mod research;
pub mod workflow;
