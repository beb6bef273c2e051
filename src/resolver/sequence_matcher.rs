// ============================================================
// Layer 5 — Character Sequence Matching
// ============================================================
// Gestalt pattern matching over characters.
//
// `ratio` is `2·M / (|a| + |b|)` where `M` is the total size of the
// matching blocks found by recursively taking the longest common
// substring and matching what lies to either side of it. No element
// is ever treated as junk.

use std::cmp::Ordering;
use std::collections::HashMap;

pub struct SequenceMatcher {
    a:   Vec<char>,
    b:   Vec<char>,
    /// For every char of `b`, the ascending positions where it occurs
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges.
    /// Among equally long blocks the one starting earliest in `a`, then
    /// earliest in `b`, wins.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0usize);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j == 0 { 0 } else { j2len.get(&(j - 1)).copied().unwrap_or(0) };
                    let k = prev + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next;
        }
        (best_i, best_j, best_k)
    }

    /// Total number of matching characters.
    pub fn matches(&self) -> usize {
        let mut total = 0usize;
        let mut stack = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = stack.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                stack.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                stack.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }

    pub fn ratio(&self) -> f64 {
        Self::score(self.matches(), self.a.len() + self.b.len())
    }

    /// Upper bound on `ratio` from the character multisets alone.
    pub fn quick_ratio(&self) -> f64 {
        let mut available: HashMap<char, isize> = HashMap::new();
        for c in &self.b {
            *available.entry(*c).or_insert(0) += 1;
        }
        let mut matches = 0usize;
        for c in &self.a {
            let n = available.entry(*c).or_insert(0);
            if *n > 0 {
                matches += 1;
            }
            *n -= 1;
        }
        Self::score(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on `ratio` from the lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let (la, lb) = (self.a.len(), self.b.len());
        Self::score(la.min(lb), la + lb)
    }

    fn score(matches: usize, length: usize) -> f64 {
        if length == 0 {
            return 1.0;
        }
        2.0 * matches as f64 / length as f64
    }
}

/// Similarity of two strings in `[0, 1]`.
pub fn ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

/// The best `n` of `possibilities` scoring at least `cutoff` against
/// `word`, best first. Equal scores are ordered by the candidate string,
/// greatest first.
pub fn get_close_matches<'a, I>(word: &str, possibilities: I, n: usize, cutoff: f64) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    if n == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &'a str)> = possibilities
        .into_iter()
        .filter_map(|candidate| {
            let m = SequenceMatcher::new(candidate, word);
            if m.real_quick_ratio() >= cutoff && m.quick_ratio() >= cutoff {
                let r = m.ratio();
                if r >= cutoff {
                    return Some((r, candidate));
                }
            }
            None
        })
        .collect();

    scored.sort_by(|x, y| {
        y.0.partial_cmp(&x.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| y.1.cmp(x.1))
    });
    scored.truncate(n);
    scored.into_iter().map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_basics() {
        assert!(close(ratio("citibank", "citibank"), 1.0));
        assert!(close(ratio("", ""), 1.0));
        assert!(close(ratio("abc", ""), 0.0));
        assert!(close(ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_ratio_recurses_on_both_sides() {
        // Longest block "bcd", then "a" is left unmatched against nothing
        // on the left and "e"/"f" differ on the right: M = 3.
        assert!(close(ratio("abcde", "bcdf"), 6.0 / 9.0));
        // "ab" and "cd" both match around the differing middle: M = 4.
        assert!(close(ratio("abxcd", "abycd"), 8.0 / 10.0));
    }

    #[test]
    fn test_ratio_is_not_symmetric_in_general() {
        // Classic example: M = 1 one way, M = 2 the other.
        assert!(close(ratio("tide", "diet"), 2.0 / 8.0));
        assert!(close(ratio("diet", "tide"), 4.0 / 8.0));
    }

    #[test]
    fn test_quick_ratios_bound_ratio() {
        let m = SequenceMatcher::new("paypal login", "paypal");
        assert!(m.real_quick_ratio() >= m.quick_ratio());
        assert!(m.quick_ratio() >= m.ratio());
        assert!(close(m.ratio(), 12.0 / 18.0));
    }

    #[test]
    fn test_close_matches_order_and_limit() {
        let words = ["ape", "apple", "peach", "puppy"];
        let got = get_close_matches("appel", words.iter().copied(), 3, 0.6);
        assert_eq!(got, vec!["apple", "ape"]);
    }

    #[test]
    fn test_close_matches_ties_prefer_greater_string() {
        let got = get_close_matches("ab", ["ax", "ay", "az"].iter().copied(), 2, 0.0);
        assert_eq!(got, vec!["az", "ay"]);
    }
}
