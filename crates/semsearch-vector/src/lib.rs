//! Exact nearest-neighbor index over dense embeddings.
//!
//! Vectors are stored row-major in one contiguous buffer; row `i` is the
//! embedding of document `i` in the companion document store. Search is a
//! brute-force squared-L2 scan with deterministic ordering.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod distance;
pub mod index;
pub mod persist;

pub use distance::squared_l2;
pub use index::{Neighbor, VectorIndex};
