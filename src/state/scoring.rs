//! Speed-weighted scoring for answered questions.

/// Points awarded for a correct answer submitted at the last possible moment.
pub const MIN_POINTS: u32 = 500;
/// Points awarded for a correct answer submitted instantly.
pub const MAX_POINTS: u32 = 1000;

/// Compute the points earned for one question.
///
/// A wrong answer, or no answer at all (`time_remaining` is `None`), earns
/// nothing. A correct answer earns between [`MIN_POINTS`] and [`MAX_POINTS`],
/// scaling linearly with the countdown value captured when the answer was
/// first submitted.
pub fn compute_points(is_correct: bool, time_remaining: Option<u32>, time_limit: u32) -> u32 {
    let Some(remaining) = time_remaining else {
        return 0;
    };
    if !is_correct {
        return 0;
    }

    let ratio = f64::from(remaining.min(time_limit)) / f64::from(time_limit.max(1));
    let spread = f64::from(MAX_POINTS - MIN_POINTS);

    (f64::from(MIN_POINTS) + ratio * spread).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_answer_earns_full_points() {
        assert_eq!(compute_points(true, Some(30), 30), MAX_POINTS);
    }

    #[test]
    fn last_second_answer_earns_minimum_points() {
        assert_eq!(compute_points(true, Some(0), 30), MIN_POINTS);
    }

    #[test]
    fn wrong_answer_earns_nothing() {
        assert_eq!(compute_points(false, Some(30), 30), 0);
        assert_eq!(compute_points(false, Some(0), 30), 0);
    }

    #[test]
    fn unanswered_earns_nothing() {
        assert_eq!(compute_points(true, None, 30), 0);
        assert_eq!(compute_points(false, None, 30), 0);
    }

    #[test]
    fn eight_of_ten_seconds_remaining_earns_900() {
        assert_eq!(compute_points(true, Some(8), 10), 900);
    }

    #[test]
    fn points_are_monotonic_in_time_remaining() {
        let limit = 120;
        let mut previous = 0;
        for remaining in 0..=limit {
            let points = compute_points(true, Some(remaining), limit);
            assert!(points >= previous);
            assert!((MIN_POINTS..=MAX_POINTS).contains(&points));
            previous = points;
        }
    }

    #[test]
    fn remaining_above_limit_is_clamped() {
        assert_eq!(compute_points(true, Some(45), 30), MAX_POINTS);
    }
}
