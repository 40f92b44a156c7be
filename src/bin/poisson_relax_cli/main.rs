mod compare;
mod solve;
mod util;

use clap::{Parser, Subcommand};
use compare::{run_compare, CompareArgs};
use solve::{run_solve, SolveArgs};

#[derive(Parser, Debug)]
#[command(version, about)]
struct CLIParser {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Relax the Poisson equation on an N^3 grid until the residual drops below the tolerance
    Solve(SolveArgs),
    /// Run every method on the same problem and compare their fixed points and sweep counts
    Compare(CompareArgs),
}

fn main() -> anyhow::Result<()> {
    let args = CLIParser::parse();

    match args.action {
        Action::Solve(args) => run_solve(args),
        Action::Compare(args) => run_compare(args),
    }
}
