//! Rotating-priority arbitration.

/// Round-robin arbiter over a fixed number of requesters.
///
/// [`grant`](Arbiter::grant) scans requesters starting one past the previous
/// winner, so every persistent requester is reached within `len` grants.
#[derive(Clone, Debug)]
pub struct Arbiter {
    next: usize,
    len: usize,
}

impl Arbiter {
    /// Create an arbiter over `len` requesters.
    pub fn new(len: usize) -> Self {
        Self { next: 0, len }
    }

    /// Grant to the first ready requester at or after the rotating pointer.
    pub fn grant(&mut self, ready: impl Fn(usize) -> bool) -> Option<usize> {
        for offset in 0..self.len {
            let i = (self.next + offset) % self.len;
            if ready(i) {
                self.next = (i + 1) % self.len;
                return Some(i);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_none_when_nobody_ready() {
        let mut arbiter = Arbiter::new(4);
        assert_eq!(arbiter.grant(|_| false), None);
    }

    #[test]
    fn test_grant_rotates_among_ready() {
        let mut arbiter = Arbiter::new(3);
        assert_eq!(arbiter.grant(|_| true), Some(0));
        assert_eq!(arbiter.grant(|_| true), Some(1));
        assert_eq!(arbiter.grant(|_| true), Some(2));
        assert_eq!(arbiter.grant(|_| true), Some(0));
    }

    #[test]
    fn test_grant_skips_idle_requesters() {
        let mut arbiter = Arbiter::new(4);
        assert_eq!(arbiter.grant(|i| i == 2), Some(2));
        // Pointer moved past 2; requester 2 still wins when alone.
        assert_eq!(arbiter.grant(|i| i == 2), Some(2));
        // With 1 and 2 both ready, the scan from 3 reaches 1 first.
        assert_eq!(arbiter.grant(|i| i == 1 || i == 2), Some(1));
    }

    #[test]
    fn test_every_requester_served_within_len_grants() {
        let mut arbiter = Arbiter::new(8);
        let mut served = [false; 8];
        for _ in 0..8 {
            let winner = arbiter.grant(|_| true).unwrap();
            served[winner] = true;
        }
        assert!(served.iter().all(|&s| s));
    }

    #[test]
    fn test_empty_arbiter() {
        let mut arbiter = Arbiter::new(0);
        assert_eq!(arbiter.grant(|_| true), None);
    }
}
