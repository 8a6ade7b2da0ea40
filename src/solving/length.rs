//! The length encoding shared by every `solve` call.
//!
//! A branch of `k` half-moves is solved with `n = SLACK_LENGTH + k`. Results:
//! - `PREVIOUS_MOVE_IS_ILLEGAL`, `THIS_MOVE_IS_ILLEGAL`, `IMMOBILITY_ON_NEXT_MOVE`: sentinels
//! - `SLACK_LENGTH..=n`: solved, `r - SLACK_LENGTH` half-moves were needed
//! - `n + 1`: solved only in the next branch
//! - `n + 2`: no solution in this branch
//! - `n + 3`: no solution in the next branch

pub type Length = u32;

pub const PREVIOUS_MOVE_IS_ILLEGAL: Length = 0;
pub const THIS_MOVE_IS_ILLEGAL: Length = 1;
pub const IMMOBILITY_ON_NEXT_MOVE: Length = 2;
pub const SLACK_LENGTH: Length = 3;

/// Encoded length of a branch of `half_moves` half-moves.
#[inline]
pub const fn branch_length(half_moves: u32) -> Length {
    SLACK_LENGTH + half_moves
}

#[inline]
pub const fn is_sentinel(r: Length) -> bool {
    r < SLACK_LENGTH
}

/// Does `r` report a solution within `n`?
#[inline]
pub const fn is_solved(r: Length, n: Length) -> bool {
    r >= SLACK_LENGTH && r <= n
}

/// Result of a move slice given its successor's result: one half-move more,
/// sentinels unchanged.
#[inline]
pub const fn after_move(r: Length) -> Length {
    if is_sentinel(r) {
        r
    } else {
        r + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_pass_through_moves() {
        assert_eq!(after_move(PREVIOUS_MOVE_IS_ILLEGAL), PREVIOUS_MOVE_IS_ILLEGAL);
        assert_eq!(after_move(IMMOBILITY_ON_NEXT_MOVE), IMMOBILITY_ON_NEXT_MOVE);
        assert_eq!(after_move(SLACK_LENGTH), SLACK_LENGTH + 1);
        assert!(is_solved(SLACK_LENGTH, SLACK_LENGTH));
        assert!(!is_solved(IMMOBILITY_ON_NEXT_MOVE, SLACK_LENGTH + 4));
        assert!(!is_solved(branch_length(3) + 2, branch_length(3)));
    }
}
