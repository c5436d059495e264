mod datapath;
mod fsm_detect;
mod fsm_simplify;
mod hier_rrg;
mod rrg;

pub use datapath::{Datapath, DatapathOptions, extract_datapath};
pub use fsm_detect::{FsmOptions, FsmReport, detect_fsms, detect_fsms_with};
pub use fsm_simplify::simplify_fsm;
pub use hier_rrg::{HierRrg, build_hier_rrg};
pub use rrg::{Rrg, build_rrg};
