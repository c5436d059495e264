mod paths;

pub use paths::{Direction, Path, PathFinder};
