//! Per-file wall-clock durations and their summary statistics.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

#[derive(Debug, Default, Clone)]
pub struct TimingStats {
    samples: Vec<(String, f64)>,
}

impl TimingStats {
    pub fn record(&mut self, file: &str, seconds: f64) {
        self.samples.push((file.to_string(), seconds));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|(_, s)| s).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Fastest file; the first one wins on ties.
    pub fn min(&self) -> Option<(&str, f64)> {
        self.samples
            .iter()
            .fold(None, |best: Option<&(String, f64)>, cur| match best {
                Some(b) if b.1 <= cur.1 => Some(b),
                _ => Some(cur),
            })
            .map(|(f, s)| (f.as_str(), *s))
    }

    /// Slowest file; the first one wins on ties.
    pub fn max(&self) -> Option<(&str, f64)> {
        self.samples
            .iter()
            .fold(None, |best: Option<&(String, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            })
            .map(|(f, s)| (f.as_str(), *s))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.samples.iter().map(|(f, s)| (f.as_str(), *s))
    }
}

impl Serialize for TimingStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("TimingStats", 4)?;
        st.serialize_field("files", &self.len())?;
        st.serialize_field("mean", &self.mean())?;
        st.serialize_field("min", &self.min())?;
        st.serialize_field("max", &self.max())?;
        st.end()
    }
}
