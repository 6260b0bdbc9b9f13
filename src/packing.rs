//! First-fit-decreasing packing of cut segments onto bars.

/// Segments packed onto bars of one length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packing {
    pub bar_length: u32,
    pub bars: Vec<Vec<u32>>,
}

impl Packing {
    pub fn leftovers(&self) -> impl Iterator<Item = u32> + '_ {
        self.bars
            .iter()
            .map(|bar| self.bar_length - bar.iter().sum::<u32>())
    }

    pub fn waste(&self) -> u64 {
        self.leftovers().map(|l| l as u64).sum()
    }
}

/// Longest segments first: each open bar takes the longest remaining
/// segment that still fits, and a new bar is opened only when none does.
/// Returns `None` if a segment is longer than the bar.
pub fn fill_bars(segments: &[u32], bar_length: u32) -> Option<Packing> {
    if segments.iter().any(|&s| s > bar_length) {
        return None;
    }
    let mut remaining = segments.to_vec();
    remaining.sort_unstable_by(|a, b| b.cmp(a));

    let mut bars = Vec::new();
    while !remaining.is_empty() {
        let mut free = bar_length;
        let mut bar = Vec::new();
        while let Some(i) = remaining.iter().position(|&s| s <= free) {
            let segment = remaining.remove(i);
            free -= segment;
            bar.push(segment);
        }
        bars.push(bar);
    }
    Some(Packing { bar_length, bars })
}
