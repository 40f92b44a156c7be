use chrono::Local;
use clap::ValueEnum;
use num_format::{CustomFormat, Grouping, ToFormattedString};
use poisson_relax::{Method, Norm, Problem, SolveReport};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum MethodArg {
    /// Two fields, every sweep reads the old one and writes the new one
    Jacobi,
    /// Jacobi with the planes of every sweep split across the workers
    JacobiParallel,
    /// Single field updated in place in (i, j, k) order
    GaussSeidel,
    /// Gauss-Seidel with columns scheduled as soon as their two predecessors are done
    Wavefront,
    /// Gauss-Seidel with a barrier after every diagonal of columns
    WavefrontBarrier,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Jacobi => Method::Jacobi,
            MethodArg::JacobiParallel => Method::JacobiParallel,
            MethodArg::GaussSeidel => Method::GaussSeidel,
            MethodArg::Wavefront => Method::Wavefront,
            MethodArg::WavefrontBarrier => Method::WavefrontBarrier,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum NormArg {
    /// Root mean square of the per-cell change
    Rms,
    /// Largest absolute per-cell change
    Max,
}

impl From<NormArg> for Norm {
    fn from(arg: NormArg) -> Self {
        match arg {
            NormArg::Rms => Norm::Rms,
            NormArg::Max => Norm::MaxAbs,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum ProblemArg {
    /// Walls at 20 degrees and an off-centre heat source of 200
    Radiator,
    /// Walls at 20 degrees and a 2x2x2 heat source of 200 at the centre
    Centered,
}

impl ProblemArg {
    pub(super) fn build(self, n: usize, start: f64) -> anyhow::Result<Problem> {
        match self {
            ProblemArg::Radiator => Problem::radiator(n, start),
            ProblemArg::Centered => Problem::centered_block(
                n,
                poisson_relax::RADIATOR_WALL_TEMPERATURE,
                start,
                2.min(n),
                poisson_relax::RADIATOR_SOURCE,
            ),
        }
    }
}

pub(super) fn grouped(value: usize) -> String {
    let fmt = CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator("_")
        .build()
        .unwrap();
    value.to_formatted_string(&fmt)
}

pub(super) fn local_time() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

pub(super) fn print_report(report: &SolveReport, secs: f64) {
    if report.converged {
        println!(
            "[{}] Converged after {} sweeps in {:.3} secs, residual {:.3e} ({:?})",
            local_time(),
            report.iterations,
            secs,
            report.residual,
            report.norm
        );
    } else {
        println!(
            "[{}] Warning: no convergence after {} sweeps in {:.3} secs, residual {:.3e} ({:?})",
            local_time(),
            report.iterations,
            secs,
            report.residual,
            report.norm
        );
    }
}
