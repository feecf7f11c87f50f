//! Radio event dispatch

pub mod handler;

pub use handler::EventDispatcher;
