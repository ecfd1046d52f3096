/// Progress notifications emitted while a job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// Start of the event loop. `expected_events` is `None` when the source length is unknown.
    TaskStart { expected_events: Option<u64> },
    /// `count` more events were processed since the last increment.
    TaskIncrement { count: u64 },
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Number of events between two [`Progress::TaskIncrement`] notifications.
pub const EVENTS_PER_INCREMENT: u64 = 1000;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        if self.callback.is_some() {
            self.report(Progress::Message(text.into()));
        }
    }

    /// Reports an increment if `processed` just crossed a multiple of
    /// [`EVENTS_PER_INCREMENT`].
    #[inline]
    pub fn tick(&self, processed: u64) {
        if processed % EVENTS_PER_INCREMENT == 0 {
            self.report(Progress::TaskIncrement {
                count: EVENTS_PER_INCREMENT,
            });
        }
    }

    /// Reports the events processed since the last full increment.
    pub fn flush(&self, processed: u64) {
        let rest = processed % EVENTS_PER_INCREMENT;
        if rest > 0 {
            self.report(Progress::TaskIncrement { count: rest });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::PhaseFinish);
        reporter.message("ignored");
    }

    #[test]
    fn ticks_and_flush_account_for_every_event() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            seen.lock().unwrap().push(p);
        }));

        let total = 2 * EVENTS_PER_INCREMENT + 17;
        for processed in 1..=total {
            reporter.tick(processed);
        }
        reporter.flush(total);
        drop(reporter);

        let counted: u64 = seen
            .into_inner()
            .unwrap()
            .into_iter()
            .map(|p| match p {
                Progress::TaskIncrement { count } => count,
                _ => 0,
            })
            .sum();
        assert_eq!(counted, total);
    }

    #[test]
    fn messages_reach_the_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            seen.lock().unwrap().push(p);
        }));

        reporter.message("Job 3: 120 events, 7 selected");
        drop(reporter);

        assert_eq!(
            seen.into_inner().unwrap(),
            vec![Progress::Message("Job 3: 120 events, 7 selected".to_string())]
        );
    }
}
