//! Stable merge sort over a singly linked index list.
//!
//! The list lives in a caller-supplied array of forward links: `links[i]`
//! is the index of the element after `i`, and 0 terminates the list
//! (index 0 is never a list member). Sorting relinks; no data moves.
//!
//! The recursion exploits presequencing: the "sort one" base case walks the
//! longest prefix that is already in order and detaches it as a pre-sorted
//! chunk, so a fully ordered list costs only n−1 comparisons while the worst
//! case stays O(n log n). The merge keeps equal elements in their original
//! order, which is what preserves FIFO dispatch for simultaneous events.

/// Sort the list starting at `head`, returning the new head.
///
/// `n` is the number of elements if known, or 0 to have the routine count.
/// `le(a, b)` must return `true` when element `a` orders at-or-before `b`
/// (non-strict — this is what makes the sort stable).
pub fn sort_list<F>(links: &mut [u32], head: u32, n: usize, le: F) -> u32
where
    F: Fn(u32, u32) -> bool + Copy,
{
    let mut n = n;
    if n == 0 {
        let mut i = head;
        while i != 0 {
            i = links[i as usize];
            n += 1;
        }
    }
    if n == 0 || head == 0 {
        return 0;
    }
    if n == 1 {
        return head;
    }

    // One- and two-element lists are the overwhelmingly common case for
    // hashed bins; sort two by inspection.
    if n == 2 {
        let second = links[head as usize];
        if le(head, second) {
            return head;
        }
        links[second as usize] = head;
        links[head as usize] = 0;
        return second;
    }

    Sorter { links, le, cursor: head, count: 0 }.sort(n)
}

struct Sorter<'a, F> {
    links: &'a mut [u32],
    le: F,
    /// First element not yet consumed by the recursion; 0 when exhausted.
    cursor: u32,
    /// Elements actually consumed by the last `sort` call — can exceed the
    /// requested count when a monotone run continues past it.
    count: usize,
}

impl<F> Sorter<'_, F>
where
    F: Fn(u32, u32) -> bool + Copy,
{
    /// Sort at least `n` elements starting at `self.cursor`; returns the
    /// head of the sorted sublist and leaves `self.cursor` at the element
    /// following the last one consumed.
    fn sort(&mut self, n: usize) -> u32 {
        if n <= 1 {
            // Base case: break off the longest monotone run.
            if self.cursor == 0 {
                return 0;
            }
            let first = self.cursor;
            self.count = 0;
            let mut prev;
            loop {
                prev = self.cursor;
                self.count += 1;
                self.cursor = self.links[prev as usize];
                if self.cursor == 0 {
                    return first;
                }
                if !(self.le)(prev, self.cursor) {
                    break;
                }
            }
            self.links[prev as usize] = 0;
            return first;
        }

        let first = self.sort(n / 2);
        if n <= self.count {
            return first; // a run fortuitously covered the whole request
        }
        let consumed = self.count;

        let second = self.sort(n - self.count);
        self.count += consumed;
        self.merge(first, second)
    }

    /// Merge two sorted lists; on equal keys the primary list (`p`) wins.
    fn merge(&mut self, mut p: u32, mut q: u32) -> u32 {
        if p == 0 {
            return q;
        }
        if q == 0 {
            return p;
        }

        let first;
        let mut scanning_primary = if (self.le)(p, q) {
            first = p;
            true
        } else {
            first = q;
            false
        };

        loop {
            let mut prev;
            if scanning_primary {
                // Pass over primary elements ordered at-or-before q.
                loop {
                    prev = p;
                    p = self.links[prev as usize];
                    if p == 0 {
                        self.links[prev as usize] = q;
                        return first;
                    }
                    if !(self.le)(p, q) {
                        break;
                    }
                }
                self.links[prev as usize] = q;
            } else {
                // Pass over secondary elements strictly before p.
                loop {
                    prev = q;
                    q = self.links[prev as usize];
                    if q == 0 {
                        self.links[prev as usize] = p;
                        return first;
                    }
                    if (self.le)(p, q) {
                        break;
                    }
                }
                self.links[prev as usize] = p;
            }
            scanning_primary = !scanning_primary;
        }
    }
}
