use super::FeatureId;

/// An interval of geological time, in millions of years before present.
///
/// `begin` is the older bound and `end` the younger bound; both are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePeriod {
    pub begin: f64,
    pub end: f64,
}

impl TimePeriod {
    /// From the distant past to the distant future.
    pub const ALL_TIME: Self = Self {
        begin: f64::INFINITY,
        end: f64::NEG_INFINITY,
    };

    #[must_use]
    pub fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    /// Returns `true` if `time` falls within the period.
    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        self.end <= time && time <= self.begin
    }
}

impl Default for TimePeriod {
    fn default() -> Self {
        Self::ALL_TIME
    }
}

/// A line section of a topology: a reconstructed polyline (or other geometry)
/// contributing a clipped portion to the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSection {
    pub source: FeatureId,
    /// Traverse the section's geometry from its last vertex to its first.
    pub reverse: bool,
}

/// A point section of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointSection {
    pub source: FeatureId,
}

/// One element of a topological section list.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionElement {
    Line(LineSection),
    Point(PointSection),
    /// A section that only takes part while the reconstruction time is inside `window`.
    TimeWindowed {
        window: TimePeriod,
        element: Box<SectionElement>,
    },
}

/// A section element that is active at a given reconstruction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSection {
    pub source: FeatureId,
    pub reverse: bool,
}

impl SectionElement {
    #[must_use]
    pub fn line(source: FeatureId, reverse: bool) -> Self {
        Self::Line(LineSection { source, reverse })
    }

    #[must_use]
    pub fn point(source: FeatureId) -> Self {
        Self::Point(PointSection { source })
    }

    /// Restricts this element to reconstruction times inside `window`.
    #[must_use]
    pub fn within(self, window: TimePeriod) -> Self {
        Self::TimeWindowed {
            window,
            element: Box::new(self),
        }
    }

    /// The section this element contributes at `time`, or `None` if every
    /// enclosing time window excludes it.
    #[must_use]
    pub fn active_at(&self, time: f64) -> Option<ActiveSection> {
        match self {
            Self::Line(line) => Some(ActiveSection {
                source: line.source,
                reverse: line.reverse,
            }),
            Self::Point(point) => Some(ActiveSection {
                source: point.source,
                reverse: false,
            }),
            Self::TimeWindowed { window, element } => {
                if window.contains(time) {
                    element.active_at(time)
                } else {
                    None
                }
            }
        }
    }
}
