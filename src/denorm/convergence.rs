use crate::error::PlazaResult;

/// What one recompute step observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The root document no longer exists; nothing to do.
    Missing,
    /// The freshly computed value already matched the stored one.
    Clean,
    /// The step wrote a new value; the loop must run again to verify it
    /// against whatever is persisted by then.
    Wrote,
}

/// How a convergence run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Missing,
    /// Clean state reached; `writes` counts the steps that had to write
    /// (0 when the stored value was already correct).
    Converged { writes: usize },
}

impl Outcome {
    pub fn writes(&self) -> usize {
        match self {
            Outcome::Missing => 0,
            Outcome::Converged { writes } => *writes,
        }
    }
}

/// Recompute until clean.
///
/// `step` must re-read the authoritative document, compute the derived
/// value purely from currently-persisted state (never from a previous
/// computation), and issue a conditional write that reports whether it
/// changed anything. Because each iteration starts from a fresh read, a
/// concurrent writer racing the loop only causes one more iteration
/// against fresher data.
///
/// Retries are unbounded: sustained contention on the same document can
/// keep the loop running. Errors from `step` abort immediately and
/// propagate to the caller.
pub fn converge<F>(mut step: F) -> PlazaResult<Outcome>
where
    F: FnMut() -> PlazaResult<StepResult>,
{
    let mut writes = 0usize;
    loop {
        match step()? {
            StepResult::Missing => return Ok(Outcome::Missing),
            StepResult::Clean => {
                tracing::debug!(writes, "converged");
                return Ok(Outcome::Converged { writes });
            }
            StepResult::Wrote => {
                writes += 1;
                tracing::debug!(writes, "wrote, re-verifying");
            }
        }
    }
}
