pub mod cancel;
pub mod consts;
pub mod error;
pub mod inference;
pub mod io;
pub mod job;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod provision;
pub mod stage;
pub mod staging;
