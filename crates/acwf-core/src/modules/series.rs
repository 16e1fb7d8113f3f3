use crate::common::elements::{MAX_ATOMIC_NUMBER, element_symbol};
use crate::common::mendeleev::MendeleevScale;
use crate::domain::{AcwfError, AcwfResult, AlatMap, Configuration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    AtomicNumber,
    Mendeleev,
}

impl AxisKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AtomicNumber => "Atomic number Z",
            Self::Mendeleev => "Mendeleev's number",
        }
    }

    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::AtomicNumber => "",
            Self::Mendeleev => "-vs_mendeleev",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPosition {
    pub x: i32,
    pub atomic_number: usize,
    pub symbol: &'static str,
}

/// Ordered element positions along the horizontal axis of a plot.
#[derive(Debug, Clone)]
pub struct ElementAxis {
    kind: AxisKind,
    positions: Vec<AxisPosition>,
}

impl ElementAxis {
    pub fn new(kind: AxisKind, scale: &MendeleevScale) -> AcwfResult<Self> {
        let count = match kind {
            AxisKind::AtomicNumber => MAX_ATOMIC_NUMBER,
            AxisKind::Mendeleev => scale.max_rank(),
        };

        let mut positions = Vec::with_capacity(count);
        for x in 1..=count {
            let atomic_number = match kind {
                AxisKind::AtomicNumber => x,
                AxisKind::Mendeleev => scale.atomic_number_for_rank(x).ok_or_else(|| {
                    AcwfError::internal(
                        "SYS.MENDELEEV_TABLE",
                        format!("no element has Mendeleev number {}", x),
                    )
                })?,
            };
            let symbol = element_symbol(atomic_number).ok_or_else(|| {
                AcwfError::internal(
                    "SYS.ELEMENT_TABLE",
                    format!("no element symbol for Z={}", atomic_number),
                )
            })?;
            positions.push(AxisPosition {
                x: x as i32,
                atomic_number,
                symbol,
            });
        }

        Ok(Self { kind, positions })
    }

    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    pub fn positions(&self) -> &[AxisPosition] {
        &self.positions
    }

    pub fn max_x(&self) -> i32 {
        self.positions.last().map_or(1, |position| position.x)
    }

    pub fn symbol_at(&self, x: i32) -> Option<&'static str> {
        let index = usize::try_from(x).ok()?.checked_sub(1)?;
        self.positions.get(index).map(|position| position.symbol)
    }
}

/// First-neighbor distances of one configuration along an element axis.
///
/// Points without data are kept as `None` so that renderers leave a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceSeries {
    pub configuration: Configuration,
    pub label: String,
    pub points: Vec<(i32, Option<f64>)>,
}

impl DistanceSeries {
    /// Builds the series and warns once per missing element.
    ///
    /// `method` names the dataset in the warning when several methods share a panel.
    pub fn build(
        axis: &ElementAxis,
        alats: &AlatMap,
        configuration: Configuration,
        label: impl Into<String>,
        method: Option<&str>,
    ) -> Self {
        let factor = configuration.alat_to_first_neighbor_factor();
        let points = axis
            .positions()
            .iter()
            .map(|position| {
                let distance = alats
                    .get(configuration, position.symbol)
                    .map(|alat| alat * factor);
                if distance.is_none() {
                    match method {
                        Some(method) => tracing::warn!(
                            "MISSING {} -> {} for {}",
                            position.symbol,
                            configuration,
                            method
                        ),
                        None => tracing::warn!("MISSING {} -> {}", position.symbol, configuration),
                    }
                }
                (position.x, distance)
            })
            .collect();

        Self {
            configuration,
            label: label.into(),
            points,
        }
    }

    pub fn present_points(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|(x, distance)| distance.map(|distance| (*x, distance)))
    }

    /// Maximal runs of consecutive points that carry data.
    pub fn segments(&self) -> Vec<Vec<(i32, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (x, distance) in &self.points {
            match distance {
                Some(distance) => current.push((*x, *distance)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.present_points().fold(None, |bounds, (_, distance)| match bounds {
            None => Some((distance, distance)),
            Some((low, high)) => Some((low.min(distance), high.max(distance))),
        })
    }
}

/// Vertical range covering every series, padded by 5% of the span.
pub fn padded_bounds<'a>(series: impl IntoIterator<Item = &'a DistanceSeries>) -> (f64, f64) {
    let bounds = series
        .into_iter()
        .filter_map(DistanceSeries::bounds)
        .reduce(|(low_a, high_a), (low_b, high_b)| (low_a.min(low_b), high_a.max(high_b)));
    match bounds {
        Some((low, high)) => {
            let pad = ((high - low) * 0.05).max(0.1);
            (low - pad, high + pad)
        }
        None => (0.0, 1.0),
    }
}
