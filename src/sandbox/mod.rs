//! Embedded-Python execution sandbox for generated plotting code
//!
//! Evaluates candidate code against a restricted binding set: `plt`
//! (matplotlib.pyplot on the Agg backend), `pd` (pandas), `df` (the demo
//! dataset as a DataFrame) and `go` (plotly.graph_objects). After evaluation,
//! a binding named `fig` holding a plotly Figure wins as the render target;
//! otherwise matplotlib's current global figure is rasterized.
//!
//! This is not a security boundary: code runs in the host interpreter, shared
//! state can be mutated before a failure is raised, and there is no execution
//! timeout - an infinite loop in generated code blocks the session. Cleanup
//! (`plt.close('all')`) is best-effort so later cycles start from a fresh
//! figure state.

use crate::dataset::TabularDataset;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::Serialize;
use std::ffi::CString;
use thiserror::Error;

/// Errors from sandboxed execution
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The Python environment itself could not be prepared (missing
    /// matplotlib/pandas/plotly, interpreter failure)
    #[error("sandbox environment error: {0}")]
    Environment(String),

    /// The generated code raised during evaluation
    #[error("execution error: {0}")]
    Execution(String),
}

/// A rendered chart, ready for the UI surface
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderResult {
    /// Interactive plotly figure, serialized as its JSON spec
    Interactive { spec: String },
    /// Static matplotlib figure, rasterized to PNG
    Static { png_base64: String },
}

/// Remove the "display the chart now" directives; the pipeline renders charts
/// through its own mechanism rather than the code's.
pub fn strip_show_directives(code: &str) -> String {
    code.replace("plt.show()", "").replace("fig.show()", "")
}

const PRELUDE: &str = "\
import matplotlib
matplotlib.use('Agg')
import matplotlib.pyplot as plt
import pandas as pd
import plotly.graph_objects as go
import io as _io
df = pd.read_csv(_io.StringIO(_csv_text))
del _io, _csv_text, matplotlib
";

const RASTERIZE: &str = "\
import io as _io, base64 as _b64
_buf = _io.BytesIO()
plt.gcf().savefig(_buf, format='png', bbox_inches='tight')
_png = _b64.b64encode(_buf.getvalue()).decode('ascii')
";

fn cstr(code: &str) -> Result<CString, SandboxError> {
    CString::new(code).map_err(|_| SandboxError::Environment("code contains NUL byte".to_string()))
}

/// Execution sandbox bound to nothing; the dataset is supplied per call
pub struct PlotSandbox;

impl PlotSandbox {
    pub fn new() -> Self {
        Self
    }

    /// Execute generated plotting code against the dataset and capture the
    /// resulting chart. Blocking; runs to completion or failure.
    pub fn execute(
        &self,
        code: &str,
        dataset: &TabularDataset,
    ) -> Result<RenderResult, SandboxError> {
        let exec_code = strip_show_directives(code);

        Python::with_gil(|py| {
            // One namespace as both globals and locals, so functions defined
            // by the generated code can see its other top-level names.
            let ns = PyDict::new(py);
            ns.set_item("_csv_text", dataset.csv_text())
                .map_err(|e| SandboxError::Environment(e.to_string()))?;

            py.run(&cstr(PRELUDE)?, Some(&ns), None)
                .map_err(|e| SandboxError::Environment(e.to_string()))?;

            // Evaluate the candidate source
            let exec_result = py.run(&cstr(&exec_code)?, Some(&ns), None);

            if let Err(e) = exec_result {
                let message = e.to_string();
                Self::close_figures(py, &ns);
                return Err(SandboxError::Execution(message));
            }

            let render = self.extract_render(py, &ns);
            Self::close_figures(py, &ns);
            render
        })
    }

    /// Prefer a `fig` binding holding a plotly Figure; fall back to
    /// matplotlib's current global figure.
    fn extract_render(
        &self,
        py: Python<'_>,
        ns: &Bound<'_, PyDict>,
    ) -> Result<RenderResult, SandboxError> {
        let figure_ty = py
            .import("plotly.graph_objects")
            .and_then(|m| m.getattr("Figure"))
            .map_err(|e| SandboxError::Environment(e.to_string()))?;

        if let Ok(Some(fig)) = ns.get_item("fig") {
            if fig.is_instance(&figure_ty).unwrap_or(false) {
                let spec = fig
                    .call_method0("to_json")
                    .and_then(|s| s.extract::<String>())
                    .map_err(|e| SandboxError::Execution(e.to_string()))?;
                return Ok(RenderResult::Interactive { spec });
            }
        }

        py.run(&cstr(RASTERIZE)?, Some(ns), None)
            .map_err(|e| SandboxError::Execution(e.to_string()))?;

        let png_base64 = ns
            .get_item("_png")
            .ok()
            .flatten()
            .and_then(|v| v.extract::<String>().ok())
            .ok_or_else(|| {
                SandboxError::Environment("figure rasterization produced no output".to_string())
            })?;

        Ok(RenderResult::Static { png_base64 })
    }

    /// Reset the plotting library's figure state so later cycles are
    /// unaffected. Best-effort.
    fn close_figures(py: Python<'_>, ns: &Bound<'_, PyDict>) {
        if let Ok(code) = CString::new("plt.close('all')") {
            py.run(&code, Some(ns), None).ok();
        }
    }
}

impl Default for PlotSandbox {
    fn default() -> Self {
        Self::new()
    }
}
