//! Library entry for sortscope, the execution core of a sorting-algorithm
//! visualizer.
//!
//! The crate owns a fixed-size dataset of 128 values, synthesizes inputs of a
//! selectable shape class, runs one of five in-place sorting algorithms inside
//! a cancellable background task, and paces every elementary step so a
//! renderer can observe progress between steps. Rendering itself is out of
//! scope: a presentation layer reads [`session::SortSession::snapshot`] once
//! per redraw tick and draws whatever it finds there.

pub mod engine;
pub mod generate;
pub mod session;
pub mod state;
