//! Projects internal orchestrator state into the caller-visible report
//! schema (`SPEC_FULL.md` §4.7 / §6).

use crate::orchestrator::RunResult;
use crate::registry::Report;
use crate::{BreakpointReport, HitReport, InlineExprValue, RunReport};

/// Build the public [`RunReport`] from the orchestrator's internal
/// [`RunResult`] and the registry's reports, in registration order.
pub fn build(result: &RunResult, reports: Vec<&Report>) -> RunReport {
    RunReport {
        stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        exit_code: result.exit_code,
        signal: result.signal.clone(),
        has_timeout: result.timeout,
        breakpoints: reports.into_iter().map(breakpoint_report).collect(),
    }
}

fn breakpoint_report(report: &Report) -> BreakpointReport {
    BreakpointReport {
        id: report.id,
        file_path: report.file_path.clone(),
        line: report.line,
        function_name: report.function_name.clone(),
        hit_times: report.hit_times,
        hits_info: report
            .hits_info
            .iter()
            .map(|hit| HitReport {
                callstack: hit.callstack.clone(),
                inline_expr: hit
                    .inline_expr
                    .iter()
                    .map(|expr| InlineExprValue { name: expr.name.clone(), value: expr.value.clone() })
                    .collect(),
            })
            .collect(),
    }
}
