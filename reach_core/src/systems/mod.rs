pub mod clouds;
pub mod pointer;
pub mod scoring;

pub use clouds::*;
pub use pointer::*;
pub use scoring::*;
