//! Command line driver for the SDFG engine.

mod cmdline;

use std::fs::File;
use std::io::{BufReader, Write, stdout};
use std::path::Path;

use cmdline::{
    Command, Opts, PrintCmd, ReportFsm, ReportPath, SimplifyFsm, WriteCmd,
};
use sdfg_ir::{Context, GraphId, NodeRef, Printer};
use sdfg_opt::DiagnosticContext;
use sdfg_opt::analysis::PathFinder;
use sdfg_opt::passes::{
    DatapathOptions, FsmOptions, build_rrg, detect_fsms_with, extract_datapath,
    simplify_fsm,
};
use sdfg_utils::{Error, SdfgResult};

fn main() {
    let opts: Opts = argh::from_env();
    let level = if opts.debug_logging {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .init();
    if let Err(err) = run(opts) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(opts: Opts) -> SdfgResult<()> {
    match opts.command {
        Command::ReportFsm(cmd) => report_fsm(cmd),
        Command::Write(cmd) => write(cmd),
        Command::ReportPath(cmd) => report_path(cmd),
        Command::SimplifyFsm(cmd) => simplify(cmd),
        Command::Print(cmd) => print(cmd),
    }
}

fn print(cmd: PrintCmd) -> SdfgResult<()> {
    let (ctx, top) = load(&cmd.file)?;
    Printer::write_context(&ctx, top, &mut stdout())?;
    Ok(())
}

fn load(path: &Path) -> SdfgResult<(Context, GraphId)> {
    let file = File::open(path)?;
    let ctx = sdfg_backend::read_xml(BufReader::new(file))?;
    let top = ctx
        .entrypoint()
        .ok_or_else(|| Error::invalid_file("document has no graphs"))?;
    Ok((ctx, top))
}

fn emit(ctx: &Context, top: GraphId, output: Option<&Path>) -> SdfgResult<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            sdfg_backend::write_xml(ctx, top, &mut file)
        }
        None => sdfg_backend::write_xml(ctx, top, &mut stdout()),
    }
}

fn print_warnings(diag: &DiagnosticContext) {
    for w in diag.errors_iter().chain(diag.warning_iter()) {
        eprintln!("warning: {w}");
    }
}

fn report_fsm(cmd: ReportFsm) -> SdfgResult<()> {
    let (ctx, top) = load(&cmd.file)?;
    let mut diag = DiagnosticContext::default();
    let mut finder = PathFinder::new(&ctx);
    let opts = FsmOptions { fast: cmd.fast, force: cmd.force };
    let report = detect_fsms_with(&mut finder, top, opts, &mut diag)?;
    print_warnings(&diag);
    let mut out = stdout();
    writeln!(out, "nodes scanned:  {}", report.scanned)?;
    writeln!(out, "registers seen: {}", report.registers)?;
    writeln!(out, "potential FSMs: {}", report.potential)?;
    writeln!(out, "confirmed FSMs: {}", report.confirmed.len())?;
    for n in &report.confirmed {
        if let Some(node) = ctx.resolve(*n) {
            writeln!(out, "  {}", node.hier_name)?;
        }
    }
    Ok(())
}

/// The datapath switches only make sense together with `--datapath`;
/// silently ignoring them would hide a mistyped invocation.
fn check_write_flags(cmd: &WriteCmd) -> SdfgResult<()> {
    if cmd.rrg && cmd.datapath {
        return Err(Error::malformed_structure(
            "--rrg and --datapath are mutually exclusive",
        ));
    }
    if !cmd.datapath && (cmd.with_fsm || cmd.with_ctl || cmd.to_rrg) {
        return Err(Error::malformed_structure(
            "--with-fsm, --with-ctl, and --to-rrg require --datapath",
        ));
    }
    Ok(())
}

fn write(cmd: WriteCmd) -> SdfgResult<()> {
    check_write_flags(&cmd)?;
    let (ctx, top) = load(&cmd.file)?;
    let mut diag = DiagnosticContext::default();
    let output = cmd.output.as_deref();
    if cmd.rrg {
        let mut finder = PathFinder::new(&ctx);
        let rrg = build_rrg(&mut finder, top, &mut diag)?;
        print_warnings(&diag);
        return emit(&rrg.ctx, rrg.top, output);
    }
    if cmd.datapath {
        let opts = DatapathOptions {
            with_fsm: cmd.with_fsm,
            with_ctl: cmd.with_ctl,
            to_rrg: cmd.to_rrg,
        };
        let dp = extract_datapath(&ctx, top, opts, &mut diag)?;
        print_warnings(&diag);
        return emit(&dp.ctx, dp.top, output);
    }
    emit(&ctx, top, output)
}

fn report_path(cmd: ReportPath) -> SdfgResult<()> {
    let (ctx, top) = load(&cmd.file)?;
    let from = resolve_name(&ctx, top, &cmd.from)?;
    let to = resolve_name(&ctx, top, &cmd.to)?;
    let mut finder = PathFinder::new(&ctx);
    let paths = finder.enumerate_paths(from, to, cmd.max, cmd.fast)?;
    let mut out = stdout();
    if paths.is_empty() {
        writeln!(out, "no path from `{}` to `{}`", cmd.from, cmd.to)?;
        return Ok(());
    }
    for path in &paths {
        writeln!(out, "{}", path.render(&ctx))?;
    }
    if paths.len() == cmd.max {
        writeln!(out, "(stopped after {} paths)", cmd.max)?;
    }
    Ok(())
}

fn simplify(cmd: SimplifyFsm) -> SdfgResult<()> {
    let (mut ctx, top) = load(&cmd.file)?;
    let rewrites = simplify_fsm(ctx.graph_mut(top))?;
    log::debug!("fsm simplification performed {rewrites} rewrites");
    emit(&ctx, top, cmd.output.as_deref())
}

/// Resolves `module.node` through the named graph and a bare name through
/// the top graph.
fn resolve_name(ctx: &Context, top: GraphId, name: &str) -> SdfgResult<NodeRef> {
    if let Some((gname, nname)) = name.split_once('.') {
        let g = ctx
            .graph_by_name(gname)
            .ok_or_else(|| Error::undefined(format!("graph `{gname}`")))?;
        let n = ctx
            .graph(g)
            .get_node_by_name(nname)
            .ok_or_else(|| Error::undefined(format!("node `{name}`")))?;
        return Ok(NodeRef::new(g, n));
    }
    let n = ctx
        .graph(top)
        .get_node_by_name(name)
        .ok_or_else(|| Error::undefined(format!("node `{name}`")))?;
    Ok(NodeRef::new(top, n))
}
