// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Round robin arbitration between a fixed number of requesters.
//!
//! The requester granted last has the lowest priority next time, so no
//! requester that keeps asking can be starved.

pub struct RoundRobin {
    candidate: usize,
}

impl RoundRobin {
    #[must_use]
    pub fn new() -> Self {
        Self { candidate: 0 }
    }

    /// Grant one of the requests.
    ///
    /// Each slot of `requests` that is `Some` is a request. The granted value
    /// is removed from its slot and returned with its index.
    pub fn arbitrate<T>(&mut self, requests: &mut [Option<T>]) -> Option<(usize, T)> {
        let num_inputs = requests.len();
        for i in 0..num_inputs {
            let index = (i + self.candidate) % num_inputs;
            if let Some(value) = requests[index].take() {
                self.candidate = (index + 1) % num_inputs;
                return Some((index, value));
            }
        }
        None
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut arbiter = RoundRobin::new();
        let mut requests: [Option<u32>; 3] = [None, None, None];
        assert_eq!(arbiter.arbitrate(&mut requests), None);
    }

    #[test]
    fn all_requesting_rotates() {
        let mut arbiter = RoundRobin::new();
        let mut grants = Vec::new();
        for _ in 0..6 {
            let mut requests = [Some('a'), Some('b'), Some('c')];
            grants.push(arbiter.arbitrate(&mut requests).unwrap().1);
        }
        assert_eq!(grants, vec!['a', 'b', 'c', 'a', 'b', 'c']);
    }

    #[test]
    fn no_starvation() {
        // Input 0 always requests, input 2 requests every cycle too; input 1
        // never does. Both active inputs must alternate.
        let mut arbiter = RoundRobin::new();
        let mut grants = Vec::new();
        for _ in 0..4 {
            let mut requests = [Some(0), None, Some(2)];
            grants.push(arbiter.arbitrate(&mut requests).unwrap().0);
        }
        assert_eq!(grants, vec![0, 2, 0, 2]);
    }

    #[test]
    fn granted_value_is_taken() {
        let mut arbiter = RoundRobin::new();
        let mut requests = [None, Some(5), Some(6)];
        assert_eq!(arbiter.arbitrate(&mut requests), Some((1, 5)));
        assert_eq!(requests, [None, None, Some(6)]);
    }
}
