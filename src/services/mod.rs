pub mod chapter_flow;
pub mod generation;
