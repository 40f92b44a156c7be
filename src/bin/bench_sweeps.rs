use poisson_relax::*;

const SWEEPS: usize = 20;

fn main() {
    let cores = std::thread::available_parallelism().map_or(1, |c| c.get());
    let worker_counts: Vec<usize> = [1, 2, 4, 8, 16]
        .into_iter()
        .filter(|&w| w <= cores)
        .collect();

    for n in [32, 64, 128] {
        let problem = Problem::radiator(n, 0.0).unwrap();
        println!("n={n}\t{} interior cells", n * n * n);

        for method in Method::ALL {
            let counts: &[usize] = if method.is_parallel() {
                &worker_counts
            } else {
                &[1]
            };
            for &workers in counts {
                // never converges, so every sweep runs
                let config = SolverConfig::new(n, SWEEPS, f64::MIN_POSITIVE).with_workers(workers);
                let mut solver = method.build(config, problem.clone()).unwrap();

                let timer = std::time::Instant::now();
                for _ in 0..SWEEPS {
                    solver.sweep().unwrap();
                }
                let secs = timer.elapsed().as_secs_f64();
                println!(
                    "{:<18} workers={:<2} -> {:.1} sweeps/sec, {:.1} Mcells/sec",
                    method.name(),
                    workers,
                    SWEEPS as f64 / secs,
                    (SWEEPS * n * n * n) as f64 / secs / 1e6
                );
            }
        }
    }
}
