use crate::run::BenchmarkConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
pub struct BenchCli {
    /// Which annotation server adapter to benchmark
    pub server: String,

    /// The endpoint the annotation server is listening on, including the
    /// http(s) scheme and port if on localhost
    #[clap(short, long)]
    pub endpoint: String,

    /// The number of step groups to run, starting from the smallest scale
    #[clap(long, default_value = "2")]
    pub steps: usize,

    /// The fraction of canvases that receive annotations
    #[clap(long, default_value = "0.01")]
    pub sample_ratio: f64,

    /// The number of worker threads per batch
    #[clap(long, default_value = "20")]
    pub threads: usize,

    /// The number of timed repetitions for the read/write/update
    /// micro-benchmarks
    #[clap(long, default_value = "100")]
    pub iterations: u64,

    /// The number of annotations inserted on each sampled canvas
    #[clap(long, default_value = "1000")]
    pub annotations_per_canvas: u64,

    /// The directory the benchmark log is written to
    #[clap(long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Do not write the benchmark log to disk
    #[clap(long, default_value = "false")]
    pub no_write_log: bool,

    /// Do not show progress bars on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't
    /// being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

impl BenchCli {
    pub fn to_config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            threads: self.threads,
            sample_ratio: self.sample_ratio,
            iterations: self.iterations,
            annotations_per_canvas: self.annotations_per_canvas,
            out_dir: self.out_dir.clone(),
            write_log: !self.no_write_log,
            show_progress: !self.no_progress,
        }
    }
}
