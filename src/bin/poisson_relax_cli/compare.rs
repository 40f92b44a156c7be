use crate::util::{local_time, ProblemArg};
use clap::Args;
use poisson_relax::{Grid3, Method, SolverConfig, WORKER_THREADS};

#[derive(Args, Debug)]
pub(super) struct CompareArgs {
    /// Interior cells per axis
    n: usize,

    /// Maximum number of sweeps
    iter_max: usize,

    /// The solve stops once the residual is below this value
    tolerance: f64,

    /// Boundary values and heat sources, default is radiator
    #[arg(short, long, value_enum, default_value_t = ProblemArg::Radiator)]
    problem: ProblemArg,

    /// The number of worker threads for the parallel methods, one per core by default
    #[arg(short, long)]
    workers: Option<u32>,
}

pub(super) fn run_compare(args: CompareArgs) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        WORKER_THREADS.store(workers, std::sync::atomic::Ordering::Relaxed);
    }
    let config = SolverConfig::new(args.n, args.iter_max, args.tolerance);
    let problem = args.problem.build(args.n, 0.0)?;

    let mut reference: Option<(Method, Grid3)> = None;
    for method in Method::ALL {
        let timer = std::time::Instant::now();
        let mut solver = method.build(config, problem.clone())?;
        let report = solver.solve()?;
        let secs = timer.elapsed().as_secs_f64();

        let diff = match &reference {
            Some((first, field)) => format!(
                "max diff to {} {:.3e}",
                first.name(),
                field.max_abs_diff(solver.solution())
            ),
            None => "reference".to_string(),
        };
        println!(
            "[{}] {:<18} sweeps {:>6}  converged {:<5}  residual {:.3e}  {:.3} secs  {}",
            local_time(),
            method.name(),
            report.iterations,
            report.converged,
            report.residual,
            secs,
            diff
        );
        if reference.is_none() {
            reference = Some((method, solver.solution().try_clone()?));
        }
    }
    Ok(())
}
