pub struct BasicStats {
    pub n_percent: f64,
    pub gc_percent: f64,
    pub q20_percent: f64,
    pub q30_percent: f64,
    pub avg_read_len: f64,
}

/// `part * 100 / total`, or 0.0 when there is nothing to divide by.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / total as f64
}

pub fn mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}
