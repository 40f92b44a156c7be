use crate::util::{grouped, local_time, print_report, MethodArg, NormArg, ProblemArg};
use anyhow::Context;
use clap::Args;
use poisson_relax::{to_file, Method, SolverConfig, WORKER_THREADS};

#[derive(Args, Debug)]
pub(super) struct SolveArgs {
    /// Interior cells per axis
    n: usize,

    /// Maximum number of sweeps
    iter_max: usize,

    /// The solve stops once the residual is below this value
    tolerance: f64,

    /// Initial temperature of the interior cells
    start_t: f64,

    /// The relaxation method, default is jacobi
    #[arg(short, long, value_enum, default_value_t = MethodArg::Jacobi)]
    method: MethodArg,

    /// How the change between sweeps is measured, default is rms
    #[arg(long, value_enum, default_value_t = NormArg::Rms)]
    norm: NormArg,

    /// The number of worker threads for the parallel methods, one per core by default
    #[arg(short, long)]
    workers: Option<u32>,

    /// Boundary values and heat sources, default is radiator
    #[arg(short, long, value_enum, default_value_t = ProblemArg::Radiator)]
    problem: ProblemArg,

    /// Path to the file where the solution will be saved; supports .bin, .bin.gz and .vtk formats
    #[arg(short, long)]
    output: Option<String>,

    /// Print the residual of every sweep
    #[arg(short, long)]
    verbose: bool,
}

pub(super) fn run_solve(args: SolveArgs) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        WORKER_THREADS.store(workers, std::sync::atomic::Ordering::Relaxed);
    }
    let method = Method::from(args.method);
    let config =
        SolverConfig::new(args.n, args.iter_max, args.tolerance).with_norm(args.norm.into());

    let timer = std::time::Instant::now();
    let problem = args.problem.build(args.n, args.start_t)?;
    let mut solver = method
        .build(config, problem)
        .with_context(|| format!("Failed to set up the {} solver", method.name()))?;
    println!(
        "[{}] Initialized {} solver for {} cells ({} bytes) in {:.3} secs",
        local_time(),
        method.name(),
        grouped(args.n.pow(3)),
        grouped(solver.bytes_total()),
        timer.elapsed().as_secs_f64()
    );

    let timer = std::time::Instant::now();
    let report = solver.solve()?;
    if args.verbose {
        for (i, residual) in report.residuals.iter().enumerate() {
            println!("{:>6} {:.6e}", i + 1, residual);
        }
    }
    print_report(&report, timer.elapsed().as_secs_f64());

    if let Some(output) = args.output {
        let timer = std::time::Instant::now();
        to_file(solver.solution(), &output)?;
        println!(
            "[{}] Saved solution to {} in {:.3} secs",
            local_time(),
            output,
            timer.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
