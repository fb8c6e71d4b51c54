/// Upper bound on candidate archives collected for one run.
pub const MAX_CANDIDATES: usize = 100;

pub const Q20: u8 = 20;
pub const Q30: u8 = 30;

/// One decoded read as handed out by an archive decoder.
///
/// Borrowed from the decoder's buffers; only valid for the duration of the
/// visit it was passed to.
#[derive(Clone, Copy, Debug)]
pub struct ReadView<'a> {
    pub seq: &'a [u8],
    pub qual: &'a [u8],
}

impl ReadView<'_> {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    /// Phred score at position `i`, if the record carries qualities there.
    pub fn quality_at(&self, i: usize) -> Option<u8> {
        self.qual.get(i).copied()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Base {
    A,
    T,
    G,
    C,
    N,
}

impl Base {
    /// Classifies a base call. Anything that is not A/T/G/C counts as N.
    pub fn from_call(b: u8) -> Self {
        match b & 0xDF {
            b'A' => Base::A,
            b'T' => Base::T,
            b'G' => Base::G,
            b'C' => Base::C,
            _ => Base::N,
        }
    }
}

/// Derives the sample name from the user's original argument.
///
/// Takes the last `/`-delimited segment and drops everything from its last
/// `.` onward. A trailing `/` or a leading-dot segment yields `""`.
pub fn sample_name(arg: &str) -> String {
    let segment = match arg.rfind('/') {
        Some(pos) => &arg[pos + 1..],
        None => arg,
    };
    let stem = match segment.rfind('.') {
        Some(pos) => &segment[..pos],
        None => segment,
    };
    stem.to_string()
}
