use serde::{Deserialize, Serialize};

/// Counters collected during a single parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMetrics {
    pub header_sets: usize,
    pub blocks_started: usize,
    pub duplicate_blocks: usize,
    pub tie_markers: usize,
    pub records_accepted: usize,
    pub rows_rejected: usize,
    pub rows_outside_block: usize,
    pub comment_lines: usize,
}

impl ParseMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_header(&mut self) {
        self.header_sets += 1;
    }

    pub fn record_block(&mut self, duplicate: bool) {
        self.blocks_started += 1;
        if duplicate {
            self.duplicate_blocks += 1;
        }
    }

    pub fn record_tie(&mut self) {
        self.tie_markers += 1;
    }

    pub fn record_accepted(&mut self) {
        self.records_accepted += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rows_rejected += 1;
    }

    pub fn record_outside_block(&mut self) {
        self.rows_outside_block += 1;
    }

    pub fn record_comment(&mut self) {
        self.comment_lines += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "blocks {} (duplicates {}), ties {}, records {}, rejected {}, outside block {}",
            self.blocks_started,
            self.duplicate_blocks,
            self.tie_markers,
            self.records_accepted,
            self.rows_rejected,
            self.rows_outside_block
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_blocks_count_as_started_blocks_too() {
        let mut metrics = ParseMetrics::new();
        metrics.record_block(false);
        metrics.record_block(true);
        assert_eq!(metrics.blocks_started, 2);
        assert_eq!(metrics.duplicate_blocks, 1);
    }
}
