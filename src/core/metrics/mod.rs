use crate::core::model::{Base, Q20, Q30, ReadView};

mod basic;

pub use basic::BasicStats;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BaseCounts {
    pub a: u64,
    pub t: u64,
    pub g: u64,
    pub c: u64,
    pub n: u64,
}

impl BaseCounts {
    fn add(&mut self, base: Base) {
        match base {
            Base::A => self.a += 1,
            Base::T => self.t += 1,
            Base::G => self.g += 1,
            Base::C => self.c += 1,
            Base::N => self.n += 1,
        }
    }

    fn add_assign(&mut self, other: &BaseCounts) {
        self.a += other.a;
        self.t += other.t;
        self.g += other.g;
        self.c += other.c;
        self.n += other.n;
    }
}

/// Running counters for one sample. Only ever incremented; per-file parts
/// are combined with [`Agg::merge`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Agg {
    pub total_reads: u64,
    pub total_bases: u64,
    pub total_length: u64,
    pub bases: BaseCounts,
    pub q20_bases: u64,
    pub q30_bases: u64,
}

impl Agg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_read(&mut self, read: &ReadView<'_>) {
        let len = read.len() as u64;
        self.total_reads += 1;
        self.total_bases += len;
        self.total_length += len;

        for (i, &call) in read.seq.iter().enumerate() {
            self.bases.add(Base::from_call(call));
            // Q20 and Q30 are both ">= threshold"; a Q30 base counts twice.
            if let Some(q) = read.quality_at(i) {
                if q >= Q20 {
                    self.q20_bases += 1;
                }
                if q >= Q30 {
                    self.q30_bases += 1;
                }
            }
        }
    }

    pub fn merge(&mut self, other: &Agg) {
        self.total_reads += other.total_reads;
        self.total_bases += other.total_bases;
        self.total_length += other.total_length;
        self.bases.add_assign(&other.bases);
        self.q20_bases += other.q20_bases;
        self.q30_bases += other.q30_bases;
    }

    pub fn finalize(&self) -> BasicStats {
        let total = self.total_bases;
        BasicStats {
            n_percent: basic::percent(self.bases.n, total),
            gc_percent: basic::percent(self.bases.g + self.bases.c, total),
            q20_percent: basic::percent(self.q20_bases, total),
            q30_percent: basic::percent(self.q30_bases, total),
            avg_read_len: basic::mean(self.total_length, self.total_reads),
        }
    }
}
