use crate::cli::SplitArgs;
use crate::dataset;
use crate::error::Result;
use tracing::info;

pub fn run(args: SplitArgs) -> Result<()> {
    let inputs = dataset::discover_inputs(&args.input_dir)?;
    let written =
        dataset::write_job_lists(&args.sample, &inputs, args.files_per_job, &args.output_dir)?;

    info!(
        sample = %args.sample,
        files = inputs.len(),
        jobs = written.len(),
        "Wrote job lists."
    );
    println!(
        "✓ Split {} file(s) of {} into {} job list(s) under {}",
        inputs.len(),
        args.sample,
        written.len(),
        args.output_dir.display()
    );
    Ok(())
}
