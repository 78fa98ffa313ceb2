//! Conflict policy for pulls

use crate::tracked::ResolveConflict;

/// Pick the winner for a store update.
///
/// An override recorded on the tracked path wins unconditionally, then a
/// side forced by the caller, then the filesystem.
pub fn resolve(explicit: Option<ResolveConflict>, forced: Option<ResolveConflict>) -> ResolveConflict {
    explicit.or(forced).unwrap_or(ResolveConflict::FsWins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ResolveConflict::{FsWins, StoreWins};

    #[rstest]
    #[case(None, None, FsWins)]
    #[case(None, Some(StoreWins), StoreWins)]
    #[case(None, Some(FsWins), FsWins)]
    #[case(Some(StoreWins), None, StoreWins)]
    #[case(Some(StoreWins), Some(FsWins), StoreWins)]
    #[case(Some(FsWins), Some(StoreWins), FsWins)]
    fn explicit_then_forced_then_default(
        #[case] explicit: Option<ResolveConflict>,
        #[case] forced: Option<ResolveConflict>,
        #[case] expected: ResolveConflict,
    ) {
        assert_eq!(resolve(explicit, forced), expected);
    }
}
