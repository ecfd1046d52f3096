use crate::cli::RunArgs;
use crate::config::{PartialAnalysisConfig, RunSettings};
use crate::dataset;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use dimuon::{
    core::{
        io::{
            events::{EventCsvReader, EventReadError},
            histograms::write_to_path,
        },
        models::event::Event,
    },
    engine::{
        error::EngineError,
        pileup::PileupReweightingTable,
        progress::{Progress, ProgressReporter},
    },
    workflows::analyze::{self, RunSummary},
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialAnalysisConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;

    let inputs = dataset::discover_inputs(&args.input_dir)?;
    let jobs = dataset::job_count(inputs.len(), settings.files_per_job)?;
    let pileup = analyze::load_pileup_table(&settings.analysis)?;

    let output_dir = args.output_dir.join(&args.era).join(&args.sample);
    std::fs::create_dir_all(&output_dir)?;

    let job = JobContext {
        settings: &settings,
        pileup: pileup.as_ref(),
        inputs: &inputs,
        output_dir: &output_dir,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summaries = if args.jobs.all_jobs {
        println!("Running {} job(s) for {}...", jobs, args.sample);
        reporter.report(Progress::PhaseStart { name: "Jobs" });
        reporter.report(Progress::TaskStart {
            expected_events: Some(jobs as u64),
        });
        let quiet = ProgressReporter::new();
        let summaries = (0..jobs)
            .into_par_iter()
            .map(|index| -> Result<RunSummary> {
                let summary = job.run(index, &quiet)?;
                reporter.message(job_message(index, &summary));
                reporter.report(Progress::TaskIncrement { count: 1 });
                Ok(summary)
            })
            .collect::<Result<Vec<_>>>()?;
        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);
        summaries
    } else if let Some(index) = args.jobs.job_index {
        println!("Running job {} of {} for {}...", index, jobs, args.sample);
        vec![job.run(index, &reporter)?]
    } else {
        return Err(CliError::Argument(
            "either --job-index or --all-jobs is required".to_string(),
        ));
    };

    let processed: u64 = summaries.iter().map(|s| s.events_processed).sum();
    let selected: u64 = summaries.iter().map(|s| s.events_selected()).sum();
    let skipped: u64 = summaries.iter().map(|s| s.pileup_out_of_range).sum();
    if skipped > 0 {
        warn!(skipped, "Events were skipped for out-of-range pileup values.");
    }
    println!(
        "✓ {} job(s) finished: {} event(s) processed, {} selected. Histograms written to {}",
        summaries.len(),
        processed,
        selected,
        output_dir.display()
    );
    Ok(())
}

fn job_message(index: usize, summary: &RunSummary) -> String {
    format!(
        "Job {}: {} event(s), {} selected",
        index,
        summary.events_processed,
        summary.events_selected()
    )
}

/// Read-only state shared by every job of one invocation.
struct JobContext<'a> {
    settings: &'a RunSettings,
    pileup: Option<&'a PileupReweightingTable>,
    inputs: &'a [PathBuf],
    output_dir: &'a Path,
}

impl JobContext<'_> {
    fn run(&self, index: usize, reporter: &ProgressReporter) -> Result<RunSummary> {
        let files = dataset::job_slice(self.inputs, self.settings.files_per_job, index)?;
        let sample = &self.settings.analysis.sample.name;
        info!(job = index, files = files.len(), "Starting job.");

        let result = analyze::run(&self.settings.analysis, self.pileup, events_from(files), reporter)
            .map_err(unwrap_event_input)?;

        let output_path = self.output_dir.join(format!("{sample}_{index}.csv"));
        write_to_path(&result.histograms, &output_path).map_err(EngineError::from)?;
        info!(
            job = index,
            processed = result.summary.events_processed,
            selected = result.summary.events_selected(),
            "Histograms written to {:?}",
            &output_path
        );
        Ok(result.summary)
    }
}

/// Chains the events of `files`, tagging read errors with the offending file.
fn events_from<'a>(files: &'a [PathBuf]) -> impl Iterator<Item = Result<Event>> + 'a {
    files
        .iter()
        .flat_map(|path| -> Box<dyn Iterator<Item = Result<Event>> + 'a> {
            debug!("Reading events from {:?}", path);
            let with_path = move |source: EventReadError| CliError::EventInput {
                path: path.clone(),
                source,
            };
            match EventCsvReader::from_path(path) {
                Ok(reader) => Box::new(reader.map(move |event| event.map_err(with_path))),
                Err(e) => Box::new(std::iter::once(Err(with_path(e)))),
            }
        })
}

/// Recovers a file read error from the engine's event source wrapper.
fn unwrap_event_input(error: EngineError) -> CliError {
    match error {
        EngineError::EventSource(source) => match source.downcast::<CliError>() {
            Ok(cli_error) => *cli_error,
            Err(other) => CliError::DimuonCore(EngineError::EventSource(other)),
        },
        other => CliError::DimuonCore(other),
    }
}
