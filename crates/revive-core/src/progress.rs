//! Progress extraction from tool output and job-wide progress bookkeeping.

use tracing::warn;

use crate::consts::PROGRESS_DONE;

/// Parse a single line of tool output into a percentage.
///
/// The number must sit immediately before the first `%` in the line and may
/// use either `,` or `.` as decimal separator. Anything else yields `None`.
pub fn parse_progress_line(line: &str) -> Option<u8> {
    let (before, _) = line.split_once('%')?;
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .last()
        .map(|(i, _)| i)?;
    let number = before[start..].replace(',', ".");
    let value: f64 = number.parse().ok()?;
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, f64::from(PROGRESS_DONE)).trunc() as u8)
}

/// Turns a stream of output lines into non-decreasing progress values.
#[derive(Debug, Default)]
pub struct ProgressParser {
    last: Option<u8>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a value only when it advances past the last one.
    pub fn feed(&mut self, line: &str) -> Option<u8> {
        self.accept(parse_progress_line(line)?)
    }

    /// Accept an already parsed value under the same non-decreasing rule.
    pub fn accept(&mut self, value: u8) -> Option<u8> {
        match self.last {
            Some(last) if value <= last => {
                if value < last {
                    warn!(value, last, "Dropping progress regression");
                }
                None
            }
            _ => {
                self.last = Some(value);
                Some(value)
            }
        }
    }

    /// Highest value emitted so far.
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

/// The share of job-wide progress covered by one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressBand {
    start: u8,
    span: u8,
}

impl ProgressBand {
    /// Band of stage `index` out of `count` equal stages.
    pub fn for_stage(index: usize, count: usize) -> Self {
        let count = count.max(1);
        let index = index.min(count - 1);
        let width = usize::from(PROGRESS_DONE) / count;
        let start = index * width;
        let span = if index == count - 1 {
            usize::from(PROGRESS_DONE) - start
        } else {
            width
        };
        Self {
            start: start as u8,
            span: span as u8,
        }
    }

    /// Map a stage-local percentage into the band.
    pub fn map(&self, stage_value: u8) -> u8 {
        let local = u32::from(stage_value.min(PROGRESS_DONE));
        let offset = local * u32::from(self.span) / u32::from(PROGRESS_DONE);
        self.start + offset as u8
    }
}

/// Job-wide progress: non-decreasing, with the final 100 held back until
/// [`JobProgress::finish`] so it is delivered exactly once.
#[derive(Debug, Default)]
pub struct JobProgress {
    last: u8,
    finished: bool,
}

impl JobProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a job-wide value. Returns it if it should be emitted.
    pub fn advance(&mut self, value: u8) -> Option<u8> {
        if self.finished {
            return None;
        }
        let capped = value.min(PROGRESS_DONE - 1);
        if capped > self.last {
            self.last = capped;
            Some(capped)
        } else {
            None
        }
    }

    /// The terminal 100. Returns `Some` on the first call only.
    pub fn finish(&mut self) -> Option<u8> {
        if self.finished {
            return None;
        }
        self.finished = true;
        self.last = PROGRESS_DONE;
        Some(PROGRESS_DONE)
    }

    pub fn current(&self) -> u8 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_single_stage_is_identity() {
        let band = ProgressBand::for_stage(0, 1);
        assert_eq!(band.map(0), 0);
        assert_eq!(band.map(37), 37);
        assert_eq!(band.map(100), 100);
    }

    #[test]
    fn test_band_two_stages_split_at_half() {
        let first = ProgressBand::for_stage(0, 2);
        let second = ProgressBand::for_stage(1, 2);
        assert_eq!(first.map(100), 50);
        assert_eq!(second.map(0), 50);
        assert_eq!(second.map(50), 75);
        assert_eq!(second.map(100), 100);
    }

    #[test]
    fn test_job_progress_holds_back_hundred() {
        let mut p = JobProgress::new();
        assert_eq!(p.advance(40), Some(40));
        assert_eq!(p.advance(30), None);
        assert_eq!(p.advance(100), Some(99));
        assert_eq!(p.finish(), Some(100));
        assert_eq!(p.finish(), None);
        assert_eq!(p.advance(100), None);
    }
}
