//! Structured warnings and per-segment failures collected during synthesis.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::Side;
use crate::model::SegmentId;

/// A data-quality warning or per-segment synthesis failure.
///
/// Common degeneracies (parallel lines at curve joins, duplicate corner
/// positions, zero-length sub-segments) are recovered inline and never
/// reported; these variants mark conditions the caller should know about.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SynthesisWarning {
    /// More than one street edge record exists between the same two
    /// intersections. Synthesis proceeds with the first record; intended
    /// upstream semantics (merge? pick longest?) are unspecified, so the
    /// condition is preserved rather than resolved.
    #[error("{records} street records between the endpoints of {segment:?}; using the first")]
    DuplicateStreetRecord { segment: SegmentId, records: usize },

    /// A curved street side has no anchor corner at one of its ends, so no
    /// trench can be built there. Indicates an upstream topology
    /// inconsistency rather than an expected degeneracy.
    #[error("no anchor corners on side {side:?} of {segment:?}")]
    MissingSideCorners { segment: SegmentId, side: Side },
}

/// Collected warnings and failures from one synthesis run, in deterministic
/// order (corner phase first, then trench phase in segment order).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SynthesisReport {
    pub warnings: Vec<SynthesisWarning>,
}

impl SynthesisReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Failures for one street segment.
    pub fn for_segment(&self, segment: SegmentId) -> impl Iterator<Item = &SynthesisWarning> {
        self.warnings.iter().filter(move |warning| match warning {
            SynthesisWarning::DuplicateStreetRecord { segment: s, .. }
            | SynthesisWarning::MissingSideCorners { segment: s, .. } => *s == segment,
        })
    }

    pub(crate) fn extend(&mut self, warnings: impl IntoIterator<Item = SynthesisWarning>) {
        self.warnings.extend(warnings);
    }
}
