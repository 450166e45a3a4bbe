//! Crash-reporting sink shared by the engine and the auth executor.

use std::error::Error;
use std::sync::Arc;

/// Receives every error the core decides is worth reporting: failed
/// reductions in the engine, blocked-IP responses in the auth executor.
///
/// Reporting never changes control flow; the caller still handles or
/// propagates the error itself.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, component: &str, error: &(dyn Error + 'static));
}

/// Default reporter: logs through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, component: &str, error: &(dyn Error + 'static)) {
        tracing::error!(component, error = %error, "reported error");
    }
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Arc<R> {
    fn report(&self, component: &str, error: &(dyn Error + 'static)) {
        (**self).report(component, error)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Reporter that remembers what it was given.
    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub(crate) reports: Mutex<Vec<(String, String)>>,
    }

    impl RecordingReporter {
        pub(crate) fn messages(&self) -> Vec<(String, String)> {
            self.reports.lock().clone()
        }
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, component: &str, error: &(dyn Error + 'static)) {
            self.reports
                .lock()
                .push((component.to_string(), error.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingReporter;
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn arc_reporter_forwards() {
        let inner = Arc::new(RecordingReporter::default());
        let reporter: Arc<dyn ErrorReporter> = inner.clone();

        reporter.report("engine", &Boom);

        assert_eq!(
            inner.messages(),
            vec![("engine".to_string(), "boom".to_string())]
        );
    }

    #[test]
    fn tracing_reporter_does_not_panic() {
        TracingReporter.report("engine", &Boom);
    }
}
