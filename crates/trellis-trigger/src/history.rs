use std::sync::{Arc, Mutex, PoisonError};

use crate::report::ExecutionReport;

/// Shared list of the executions a trigger has started.
///
/// Handlers registered on collaborators hold a clone and record into it
/// from whichever task they run on.
#[derive(Debug, Clone, Default)]
pub struct ExecutionHistory {
  reports: Arc<Mutex<Vec<ExecutionReport>>>,
}

impl ExecutionHistory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&self, report: ExecutionReport) {
    self
      .reports
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(report);
  }

  pub fn snapshot(&self) -> Vec<ExecutionReport> {
    self
      .reports
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn len(&self) -> usize {
    self.reports.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
