use crate::canvas::CanvasFinding;
use crate::differ::BlockDiff;
use crate::mdfp::MdfpCandidate;
use crate::snapshot::ActionMap;

/// Action map keys gained and lost between snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStats {
    pub added: usize,
    pub dropped: usize,
}

impl KeyStats {
    pub fn compute(old: &ActionMap, new: &ActionMap) -> Self {
        Self {
            added: new.domains().filter(|d| !old.contains(d)).count(),
            dropped: old.domains().filter(|d| !new.contains(d)).count(),
        }
    }
}

#[derive(Debug)]
pub struct AnalysisResult {
    pub keys: KeyStats,
    pub blocked: BlockDiff,
    pub mdfp: Vec<MdfpCandidate>,
    /// `None` when the new snapshot has no tracking map.
    pub canvas: Option<Vec<CanvasFinding>>,
}
