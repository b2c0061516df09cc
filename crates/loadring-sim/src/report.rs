//! CSV reports.
//!
//! Both reports are a header, one row per node, then `#name,value` summary
//! rows that CSV readers can skip as comments.

use std::io::{self, Write};

use loadring_metrics::{ChurnReport, IntStats};
use loadring_router::{Algorithm, Options};

/// Parameters of one simulation run, echoed into every report.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub algo: Algorithm,
    pub nodes: usize,
    pub keys: usize,
    pub zipf_s: f64,
    pub options: Options,
    pub seed: u64,
}

impl RunParams {
    fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "#algo,{}", self.algo)?;
        writeln!(w, "#nodes,{}", self.nodes)?;
        writeln!(w, "#keys,{}", self.keys)?;
        writeln!(w, "#zipf_s,{:.3}", self.zipf_s)?;
        writeln!(w, "#table_size,{}", self.options.table_size)?;
        writeln!(w, "#load_factor,{:.3}", self.options.load_factor)?;
        writeln!(w, "#vnodes,{}", self.options.vnodes)?;
        writeln!(w, "#walk_threshold,{}", self.options.walk_threshold)?;
        writeln!(w, "#seed,{}", self.seed)
    }
}

/// Per-node key counts for a single pass.
pub fn write_distribution<W: Write>(
    w: &mut W,
    params: &RunParams,
    nodes: &[String],
    counts: &[usize],
    stats: &IntStats,
) -> io::Result<()> {
    writeln!(w, "node_id,count")?;
    for (node, count) in nodes.iter().zip(counts) {
        writeln!(w, "{node},{count}")?;
    }

    params.write_summary(w)?;
    writeln!(w, "#mean,{:.3}", stats.mean)?;
    writeln!(w, "#max,{}", stats.max)?;
    writeln!(w, "#std,{:.3}", stats.std)?;
    writeln!(w, "#cv,{:.5}", stats.cv)?;
    w.flush()
}

/// Per-node counts before and after a membership change.
pub fn write_churn<W: Write>(
    w: &mut W,
    params: &RunParams,
    churn_op: &str,
    nodes_after: usize,
    report: &ChurnReport,
) -> io::Result<()> {
    writeln!(w, "node_id,count_before,count_after")?;
    for row in &report.nodes {
        writeln!(w, "{},{},{}", row.node, row.before, row.after)?;
    }

    params.write_summary(w)?;
    writeln!(w, "#churn_op,{churn_op}")?;
    writeln!(w, "#nodes_before,{}", params.nodes)?;
    writeln!(w, "#nodes_after,{nodes_after}")?;
    writeln!(w, "#moved,{}", report.moved)?;
    writeln!(w, "#moved_ratio,{:.5}", report.moved_ratio)?;
    w.flush()
}
