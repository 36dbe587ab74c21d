use async_trait::async_trait;
use tracing::debug;
use trellis_trigger::{ExecutionReport, FlowRunner};

use crate::flow::Flow;

#[async_trait]
impl FlowRunner for Flow {
  async fn run(&self, input: serde_json::Value) -> ExecutionReport {
    let mut execution = self.create_execution();
    if let Err(e) = execution.start(input).await {
      // Kept on the execution and carried by the report.
      debug!(flow = %self.name(), error = %e, "run aborted");
    }
    execution.report()
  }
}
