use std::path::PathBuf;

use argh::FromArgs;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help"))]
/// Synchronous data-flow graph engine for elaborated hardware netlists
pub struct Opts {
    /// enables debug logging
    #[argh(switch, long = "debug-logging")]
    pub debug_logging: bool,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
pub enum Command {
    ReportFsm(ReportFsm),
    Write(WriteCmd),
    ReportPath(ReportPath),
    SimplifyFsm(SimplifyFsm),
    Print(PrintCmd),
}

/// print a plain-text listing of a design
#[derive(FromArgs)]
#[argh(subcommand, name = "print")]
pub struct PrintCmd {
    /// input design
    #[argh(positional)]
    pub file: PathBuf,
}

/// detect the FSM registers of a design
#[derive(FromArgs)]
#[argh(subcommand, name = "report-fsm")]
pub struct ReportFsm {
    /// input design
    #[argh(positional)]
    pub file: PathBuf,

    /// restrict the scan to the top module
    #[argh(switch, long = "fast")]
    pub fast: bool,

    /// recompute reachability even when memoized state exists
    #[argh(switch, long = "force")]
    pub force: bool,
}

/// re-serialize a design, optionally reduced
#[derive(FromArgs)]
#[argh(subcommand, name = "write")]
pub struct WriteCmd {
    /// input design
    #[argh(positional)]
    pub file: PathBuf,

    /// write the flat register relation graph instead of the design
    #[argh(switch, long = "rrg")]
    pub rrg: bool,

    /// write the extracted datapath instead of the design
    #[argh(switch, long = "datapath")]
    pub datapath: bool,

    /// keep confirmed FSM registers in the datapath
    #[argh(switch, long = "with-fsm")]
    pub with_fsm: bool,

    /// treat control-adjacent logic as datapath
    #[argh(switch, long = "with-ctl")]
    pub with_ctl: bool,

    /// reduce the extracted datapath to its register relation
    #[argh(switch, long = "to-rrg")]
    pub to_rrg: bool,

    /// output file, default is stdout
    #[argh(option, short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// enumerate the paths between two nodes
#[derive(FromArgs)]
#[argh(subcommand, name = "report-path")]
pub struct ReportPath {
    /// input design
    #[argh(positional)]
    pub file: PathBuf,

    /// source node, `node` in the top graph or `module.node`
    #[argh(option, long = "from")]
    pub from: String,

    /// target node, `node` in the top graph or `module.node`
    #[argh(option, long = "to")]
    pub to: String,

    /// maximum number of paths to enumerate
    #[argh(option, long = "max", default = "100")]
    pub max: usize,

    /// stay within the source node's graph, treating module instances
    /// and ports as terminals
    #[argh(switch, long = "fast")]
    pub fast: bool,
}

/// contract two-node cycles of an FSM graph to a fixpoint
#[derive(FromArgs)]
#[argh(subcommand, name = "simplify-fsm")]
pub struct SimplifyFsm {
    /// input design
    #[argh(positional)]
    pub file: PathBuf,

    /// output file, default is stdout
    #[argh(option, short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
