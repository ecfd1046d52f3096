use std::collections::HashMap;

/// Uniform binning of a one-dimensional axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    /// Number of bins, excluding under- and overflow.
    pub n_bins: usize,
    /// Lower edge of the first bin (inclusive).
    pub low: f64,
    /// Upper edge of the last bin (exclusive).
    pub high: f64,
}

impl Binning {
    pub const fn new(n_bins: usize, low: f64, high: f64) -> Self {
        Self { n_bins, low, high }
    }

    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.n_bins as f64
    }

    /// Returns the `(low, high)` edges of bin `index`.
    pub fn edges(&self, index: usize) -> (f64, f64) {
        let w = self.width();
        (
            self.low + w * index as f64,
            self.low + w * (index + 1) as f64,
        )
    }

    /// Locates `value` on the axis.
    pub fn locate(&self, value: f64) -> BinLocation {
        if value.is_nan() {
            return BinLocation::Invalid;
        }
        if value < self.low {
            return BinLocation::Underflow;
        }
        if value >= self.high {
            return BinLocation::Overflow;
        }
        let index = ((value - self.low) / self.width()) as usize;
        // Guards rounding at the upper edge.
        BinLocation::Bin(index.min(self.n_bins - 1))
    }
}

/// Position of a value relative to a [`Binning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinLocation {
    Underflow,
    Bin(usize),
    Overflow,
    Invalid,
}

/// A weighted one-dimensional histogram with under- and overflow tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name, unique within a [`HistogramSet`].
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Axis binning.
    pub binning: Binning,
    /// Sum of weights per bin.
    pub contents: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sumw2: Vec<f64>,
    /// Sum of weights below the axis range.
    pub underflow: f64,
    /// Sum of weights at or above the axis range.
    pub overflow: f64,
    /// Number of fill calls, including under- and overflow.
    pub entries: u64,
}

impl Histogram {
    pub fn new(name: impl Into<String>, title: impl Into<String>, binning: Binning) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            binning,
            contents: vec![0.0; binning.n_bins],
            sumw2: vec![0.0; binning.n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Adds `weight` at `value`. `NaN` values are ignored.
    pub fn fill(&mut self, value: f64, weight: f64) {
        match self.binning.locate(value) {
            BinLocation::Bin(i) => {
                self.contents[i] += weight;
                self.sumw2[i] += weight * weight;
            }
            BinLocation::Underflow => self.underflow += weight,
            BinLocation::Overflow => self.overflow += weight,
            BinLocation::Invalid => return,
        }
        self.entries += 1;
    }

    /// Overwrites the content of bin `index`; out-of-range indices are ignored.
    pub fn set_bin_content(&mut self, index: usize, content: f64) {
        if let Some(bin) = self.contents.get_mut(index) {
            *bin = content;
        }
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }
}

/// An ordered, name-indexed collection of histograms.
#[derive(Debug, Clone, Default)]
pub struct HistogramSet {
    histograms: Vec<Histogram>,
    index: HashMap<String, usize>,
}

impl HistogramSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `histogram`, replacing any existing histogram with the same name.
    pub fn insert(&mut self, histogram: Histogram) {
        match self.index.get(&histogram.name) {
            Some(&i) => self.histograms[i] = histogram,
            None => {
                self.index
                    .insert(histogram.name.clone(), self.histograms.len());
                self.histograms.push(histogram);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.index.get(name).map(|&i| &self.histograms[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Histogram> {
        self.index.get(name).map(|&i| &mut self.histograms[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms.iter()
    }
}
