//! Generic collections used by the front-end.

pub mod priority_queue;

pub use priority_queue::{NaturalOrder, PriorityComparer, PriorityQueue, ReverseOrder};
