//! Progressive lockout schedule for failed primary-credential attempts.

use chrono::Duration;

/// Lock duration after `attempts` cumulative failures, counting the attempt
/// that just failed. Flat at zero for the first four attempts, then steps up
/// to a three hour cap.
#[must_use]
pub fn lock_duration(attempts: i32) -> Duration {
    let minutes = match attempts {
        i32::MIN..=4 => 0,
        5..=7 => 5,
        8..=9 => 10,
        10..=11 => 30,
        12..=14 => 60,
        _ => 180,
    };
    Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_matches_policy() {
        for attempts in 0..=4 {
            assert_eq!(lock_duration(attempts), Duration::zero());
        }
        for attempts in 5..=7 {
            assert_eq!(lock_duration(attempts), Duration::minutes(5));
        }
        for attempts in 8..=9 {
            assert_eq!(lock_duration(attempts), Duration::minutes(10));
        }
        for attempts in 10..=11 {
            assert_eq!(lock_duration(attempts), Duration::minutes(30));
        }
        for attempts in 12..=14 {
            assert_eq!(lock_duration(attempts), Duration::minutes(60));
        }
        for attempts in [15, 16, 50, i32::MAX] {
            assert_eq!(lock_duration(attempts), Duration::minutes(180));
        }
    }

    #[test]
    fn monotonic_non_decreasing() {
        let mut previous = Duration::zero();
        for attempts in 1..=40 {
            let current = lock_duration(attempts);
            assert!(current >= previous, "regressed at attempt {attempts}");
            previous = current;
        }
    }

    #[test]
    fn fifth_failure_locks_five_minutes() {
        assert_eq!(lock_duration(5), Duration::minutes(5));
    }
}
