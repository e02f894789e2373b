//! The Viterbi DP core: drives the candidate/emission/transition pipeline
//! over an observation sequence, maintaining a lattice of log-probabilities
//! and backpointers, and produces the single best path.

use std::collections::HashSet;
use std::io::Write;

use log::{error, warn};

use crate::candidates::{self, Candidate};
use crate::config::MatchOptions;
use crate::emission::{self, NoSpeedLimitData, SpeedLimitSource};
use crate::error::MatchError;
use crate::geo::ProjectedPoint;
use crate::ingest::Observation;
use crate::store::SegmentStore;
use crate::transition;

/// Sentinel for a zero-probability / unreachable state in log-space.
pub const LOG0: f64 = f64::NEG_INFINITY;

fn safe_ln(p: f64) -> f64 {
    if p <= 0.0 { LOG0 } else { p.ln() }
}

/// One column of the lattice: the candidates considered for a single
/// (non-skipped) observation, their log-probabilities, and backpointers
/// into the most recent previous non-skipped column.
struct Column {
    candidates: Vec<Candidate>,
    log_probs: Vec<f64>,
    backptrs: Vec<Option<usize>>,
    /// The observation's projected point, used as `p_prev` by the next
    /// real transition.
    anchor: ProjectedPoint,
}

/// Runs candidate selection at `radius`, retrying once at `2 * radius` if
/// nothing is found. Returns `(anchor, candidates)`; `candidates` may still
/// be empty after the retry.
fn query_with_retry(
    store: &dyn SegmentStore,
    observation: &Observation,
    radius: f64,
    max_states: usize,
) -> Result<(ProjectedPoint, Vec<Candidate>), MatchError> {
    let (anchor, found) = candidates::query(store, observation, radius, max_states)?;
    if !found.is_empty() {
        return Ok((anchor, found));
    }
    let (anchor, found) = candidates::query(store, observation, radius * 2.0, max_states)?;
    Ok((anchor, found))
}

fn emissions_for(
    candidates: &[Candidate],
    observation: &Observation,
    options: &MatchOptions,
    speed_source: &dyn SpeedLimitSource,
) -> Vec<f64> {
    candidates
        .iter()
        .map(|c| {
            emission::emission_probability(
                c,
                observation,
                &options.emission_weights,
                emission::DEFAULT_SIGMA_D,
                speed_source,
            )
        })
        .collect()
}

/// Runs the Viterbi algorithm over `observations` and returns the best
/// path's segment ids, with consecutive duplicates collapsed.
///
/// `output_sink`, if present, receives one segment id per line as the final
/// path is written out.
pub fn match_trace(
    observations: &[Observation],
    options: &MatchOptions,
    store: &dyn SegmentStore,
    mut output_sink: Option<&mut dyn Write>,
) -> Result<Vec<i64>, MatchError> {
    options.validate()?;

    if observations.is_empty() {
        return Ok(Vec::new());
    }

    let end = options.end.unwrap_or(observations.len()).min(observations.len());
    let start = options.start.min(end);
    let observations = &observations[start..end];

    if observations.is_empty() {
        return Ok(Vec::new());
    }

    let speed_source = NoSpeedLimitData;

    // --- Initialization (t = 0) ---
    let (anchor0, init_candidates) =
        query_with_retry(store, &observations[0], options.radius_m, options.max_states)?;

    if init_candidates.is_empty() {
        error!("no starting candidates for the first observation; aborting");
        return Err(MatchError::NoStartingCandidates);
    }

    let init_emissions = emissions_for(&init_candidates, &observations[0], options, &speed_source);
    let init_log_probs: Vec<f64> = init_emissions.iter().map(|&p| safe_ln(p)).collect();
    let init_backptrs = vec![None; init_candidates.len()];

    let mut columns: Vec<Column> = vec![Column {
        candidates: init_candidates,
        log_probs: init_log_probs,
        backptrs: init_backptrs,
        anchor: anchor0,
    }];

    // --- Forward pass (t = 1..) ---
    for (t, observation) in observations.iter().enumerate().skip(1) {
        let (anchor, found) =
            query_with_retry(store, observation, options.radius_m, options.max_states)?;

        if found.is_empty() {
            warn!("observation {t}: no candidates at any radius; skipping");
            continue;
        }

        let prev = columns.last().expect("at least column 0 always present");
        let emissions = emissions_for(&found, observation, options, &speed_source);

        let matrix = transition::transition_matrix(
            prev.anchor,
            anchor,
            &prev.candidates,
            &found,
            &options.transition_weights,
            transition::DEFAULT_SIGMA_T,
        );

        let mut log_probs = vec![LOG0; found.len()];
        let mut backptrs = vec![None; found.len()];
        let mut any_reachable = false;

        for i in 0..found.len() {
            let emission_log = safe_ln(emissions[i]);
            let mut best_log = LOG0;
            let mut best_j = None;

            for j in 0..prev.candidates.len() {
                if prev.log_probs[j] == LOG0 {
                    continue;
                }
                let transition_log = safe_ln(matrix[j][i]);
                if transition_log == LOG0 {
                    continue;
                }
                let candidate_log = prev.log_probs[j] + transition_log + emission_log;
                if best_j.is_none() || candidate_log > best_log {
                    best_log = candidate_log;
                    best_j = Some(j);
                }
            }

            if best_j.is_some() {
                any_reachable = true;
            }
            log_probs[i] = best_log;
            backptrs[i] = best_j;
        }

        if !any_reachable {
            error!(
                "observation {t}: all candidates unreachable (degenerate column); returning best-effort path"
            );
            break;
        }

        columns.push(Column {
            candidates: found,
            log_probs,
            backptrs,
            anchor,
        });
    }

    // --- Termination ---
    let last = columns.last().expect("at least column 0 always present");
    let mut best_idx = None;
    let mut best_log = LOG0;
    for (i, &lp) in last.log_probs.iter().enumerate() {
        if best_idx.is_none() || lp > best_log {
            best_log = lp;
            best_idx = Some(i);
        }
    }
    let Some(mut current_idx) = best_idx else {
        return Ok(Vec::new());
    };

    // --- Backtracking ---
    let mut visited: HashSet<(usize, usize)> = HashSet::new();
    let mut path_candidates: Vec<&Candidate> = Vec::new();

    let mut column_idx = columns.len() - 1;
    loop {
        if !visited.insert((column_idx, current_idx)) {
            error!("backtrack cycle detected at column {column_idx}, candidate {current_idx}; truncating path");
            break;
        }

        path_candidates.push(&columns[column_idx].candidates[current_idx]);

        if column_idx == 0 {
            break;
        }

        match columns[column_idx].backptrs[current_idx] {
            Some(prev_idx) => {
                if prev_idx >= columns[column_idx - 1].candidates.len() {
                    error!("backtrack out-of-range index at column {column_idx}; truncating path");
                    break;
                }
                current_idx = prev_idx;
                column_idx -= 1;
            }
            None => break,
        }
    }

    path_candidates.reverse();

    // --- Output: map to segment ids, dedupe consecutive duplicates only ---
    let mut segment_ids: Vec<i64> = Vec::with_capacity(path_candidates.len());
    for candidate in path_candidates {
        if segment_ids.last() != Some(&candidate.segment_id) {
            segment_ids.push(candidate.segment_id);
        }
    }

    if let Some(sink) = output_sink.as_deref_mut() {
        for id in &segment_ids {
            writeln!(sink, "{id}").map_err(|e| MatchError::Store(e.into()))?;
        }
    }

    Ok(segment_ids)
}
