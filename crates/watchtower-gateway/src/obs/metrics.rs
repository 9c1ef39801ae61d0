//! In-process metrics registry.
//!
//! Counter/gauge/histogram families with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors so `{a,b}` and `{b,a}` land on
//! the same series. Families and series carry a registration sequence number;
//! `render` snapshots them and emits in registration order.
//!
//! Recording never fails. A sample aimed at a name registered with a
//! different kind is dropped with a warning, and unknown names are registered
//! on first use.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Label pairs as passed by callers.
pub type Labels<'a> = &'a [(&'a str, &'a str)];

type SeriesKey = Vec<(String, String)>;

/// Histogram upper bounds in seconds (same defaults as the Prometheus clients).
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn series_key(labels: Labels<'_>) -> SeriesKey {
    let mut key: SeriesKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &SeriesKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

fn fmt_value(v: f64) -> String {
    if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// f64 stored as raw bits; `add` is a CAS loop.
#[derive(Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    fn add(&self, delta: f64) {
        let mut cur = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(cur) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(cur, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => cur = actual,
            }
        }
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicF64,
    // cumulative: bucket i counts every observation <= DEFAULT_BUCKETS[i]
    buckets: [AtomicU64; DEFAULT_BUCKETS.len()],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicF64::default(),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

impl AtomicHistogram {
    fn observe(&self, seconds: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.add(seconds);
        for (i, &le) in DEFAULT_BUCKETS.iter().enumerate() {
            if seconds <= le {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

struct Series<T> {
    seq: u64,
    cell: T,
}

enum Values {
    Counter(DashMap<SeriesKey, Series<AtomicU64>>),
    Gauge(DashMap<SeriesKey, Series<AtomicF64>>),
    Histogram(DashMap<SeriesKey, Series<AtomicHistogram>>),
}

impl Values {
    fn new(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => Values::Counter(DashMap::new()),
            MetricKind::Gauge => Values::Gauge(DashMap::new()),
            MetricKind::Histogram => Values::Histogram(DashMap::new()),
        }
    }

    fn kind(&self) -> MetricKind {
        match self {
            Values::Counter(_) => MetricKind::Counter,
            Values::Gauge(_) => MetricKind::Gauge,
            Values::Histogram(_) => MetricKind::Histogram,
        }
    }
}

struct Family {
    name: String,
    help: String,
    seq: u64,
    series_seq: AtomicU64,
    values: Values,
}

impl Family {
    fn next_series(&self) -> u64 {
        self.series_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Run `f` on the series for `labels`, creating it on first use.
    /// The read path only takes a shard read lock.
    fn with_series<T: Default, R>(
        &self,
        map: &DashMap<SeriesKey, Series<T>>,
        labels: Labels<'_>,
        f: impl FnOnce(&T) -> R,
    ) -> R {
        let key = series_key(labels);
        if let Some(s) = map.get(&key) {
            return f(&s.value().cell);
        }
        let entry = map.entry(key).or_insert_with(|| Series {
            seq: self.next_series(),
            cell: T::default(),
        });
        f(&entry.value().cell)
    }

    fn render(&self, out: &mut String) {
        if !self.help.is_empty() {
            let _ = writeln!(out, "# HELP {} {}", self.name, self.help);
        }
        let _ = writeln!(out, "# TYPE {} {}", self.name, self.values.kind().as_str());
        let name = &self.name;

        match &self.values {
            Values::Counter(map) => {
                let mut rows: Vec<(u64, SeriesKey, u64)> = map
                    .iter()
                    .map(|r| (r.value().seq, r.key().clone(), r.value().cell.load(Ordering::Relaxed)))
                    .collect();
                rows.sort_by_key(|(seq, _, _)| *seq);
                for (_, key, val) in rows {
                    let _ = writeln!(out, "{}{} {}", name, braced(&label_str(&key)), val);
                }
            }
            Values::Gauge(map) => {
                let mut rows: Vec<(u64, SeriesKey, f64)> = map
                    .iter()
                    .map(|r| (r.value().seq, r.key().clone(), r.value().cell.load()))
                    .collect();
                rows.sort_by_key(|(seq, _, _)| *seq);
                for (_, key, val) in rows {
                    let _ = writeln!(out, "{}{} {}", name, braced(&label_str(&key)), fmt_value(val));
                }
            }
            Values::Histogram(map) => {
                let mut rows: Vec<(u64, SeriesKey, Vec<u64>, u64, f64)> = map
                    .iter()
                    .map(|r| {
                        let h = &r.value().cell;
                        let buckets = h.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect();
                        (
                            r.value().seq,
                            r.key().clone(),
                            buckets,
                            h.count.load(Ordering::Relaxed),
                            h.sum.load(),
                        )
                    })
                    .collect();
                rows.sort_by_key(|(seq, ..)| *seq);
                for (_, key, buckets, count, sum) in rows {
                    let labels = label_str(&key);
                    let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
                    for (le, n) in DEFAULT_BUCKETS.iter().zip(buckets) {
                        let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, fmt_value(*le), n);
                    }
                    let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
                    let _ = writeln!(out, "{}_sum{} {}", name, braced(&labels), fmt_value(sum));
                    let _ = writeln!(out, "{}_count{} {}", name, braced(&labels), count);
                }
            }
        }
    }
}

/// Process-wide store of metric families.
///
/// Construct one per process (or per test) and share it behind an `Arc`.
#[derive(Default)]
pub struct MetricsRegistry {
    families: DashMap<String, Arc<Family>>,
    seq: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_counter(&self, name: &str, help: &str) {
        self.register(name, help, MetricKind::Counter);
    }

    pub fn register_gauge(&self, name: &str, help: &str) {
        self.register(name, help, MetricKind::Gauge);
    }

    pub fn register_histogram(&self, name: &str, help: &str) {
        self.register(name, help, MetricKind::Histogram);
    }

    /// Kind of the family registered under `name`, if any.
    pub fn kind_of(&self, name: &str) -> Option<MetricKind> {
        self.families.get(name).map(|f| f.values.kind())
    }

    fn register(&self, name: &str, help: &str, kind: MetricKind) -> Option<Arc<Family>> {
        if let Some(f) = self.families.get(name) {
            return Self::checked(name, Arc::clone(f.value()), kind);
        }
        let family = self
            .families
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Family {
                    name: name.to_string(),
                    help: help.to_string(),
                    seq: self.seq.fetch_add(1, Ordering::Relaxed),
                    series_seq: AtomicU64::new(0),
                    values: Values::new(kind),
                })
            })
            .value()
            .clone();
        Self::checked(name, family, kind)
    }

    fn checked(name: &str, family: Arc<Family>, kind: MetricKind) -> Option<Arc<Family>> {
        let have = family.values.kind();
        if have == kind {
            Some(family)
        } else {
            tracing::warn!(metric = %name, registered = have.as_str(), requested = kind.as_str(), "metric kind mismatch, sample dropped");
            None
        }
    }

    /// Add 1 to a counter series.
    pub fn increment_counter(&self, name: &str, labels: Labels<'_>) {
        let Some(family) = self.register(name, "", MetricKind::Counter) else { return; };
        if let Values::Counter(map) = &family.values {
            family.with_series(map, labels, |c| c.fetch_add(1, Ordering::Relaxed));
        }
    }

    /// Record a duration in seconds. Negative or NaN inputs count as zero.
    pub fn observe_duration(&self, name: &str, labels: Labels<'_>, seconds: f64) {
        let seconds = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
        let Some(family) = self.register(name, "", MetricKind::Histogram) else { return; };
        if let Values::Histogram(map) = &family.values {
            family.with_series(map, labels, |h| h.observe(seconds));
        }
    }

    pub fn set_gauge(&self, name: &str, labels: Labels<'_>, value: f64) {
        self.with_gauge(name, labels, |g| g.store(value));
    }

    pub fn increment_gauge(&self, name: &str, labels: Labels<'_>) {
        self.with_gauge(name, labels, |g| g.add(1.0));
    }

    pub fn decrement_gauge(&self, name: &str, labels: Labels<'_>) {
        self.with_gauge(name, labels, |g| g.add(-1.0));
    }

    fn with_gauge(&self, name: &str, labels: Labels<'_>, f: impl FnOnce(&AtomicF64)) {
        let Some(family) = self.register(name, "", MetricKind::Gauge) else { return; };
        if let Values::Gauge(map) = &family.values {
            family.with_series(map, labels, f);
        }
    }

    /// Current value of a counter series (None if never touched).
    pub fn counter_value(&self, name: &str, labels: Labels<'_>) -> Option<u64> {
        let family = self.families.get(name)?;
        match &family.values {
            Values::Counter(map) => map.get(&series_key(labels)).map(|s| s.value().cell.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Current value of a gauge series (None if never touched).
    pub fn gauge_value(&self, name: &str, labels: Labels<'_>) -> Option<f64> {
        let family = self.families.get(name)?;
        match &family.values {
            Values::Gauge(map) => map.get(&series_key(labels)).map(|s| s.value().cell.load()),
            _ => None,
        }
    }

    /// Observation count of a histogram series (None if never touched).
    pub fn histogram_count(&self, name: &str, labels: Labels<'_>) -> Option<u64> {
        let family = self.families.get(name)?;
        match &family.values {
            Values::Histogram(map) => map
                .get(&series_key(labels))
                .map(|s| s.value().cell.count.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Render every family in Prometheus text exposition format.
    ///
    /// Families are cloned out of the map first, so no shard lock is held
    /// while a family renders.
    pub fn render(&self) -> String {
        let mut families: Vec<Arc<Family>> =
            self.families.iter().map(|r| Arc::clone(r.value())).collect();
        families.sort_by_key(|f| f.seq);

        let mut out = String::new();
        for f in families {
            f.render(&mut out);
        }
        out
    }
}
