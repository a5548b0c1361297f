#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-sub-cell overlays drawn on top of the ground: tree canopies with the
//! shadows they cast, and burning fire zones.

mod canopy;
mod fire;

pub use canopy::CanopyPainter;
pub use fire::FireManager;
