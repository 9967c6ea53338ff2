pub mod recommendation;
pub mod serving;
