//! Depth sampling grid for absorption profiles.

use std::ops::Range;

use texray_math::Interval;

use crate::stack::{StackError, StackResult};

/// The depth samples owned by one medium.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDepths {
    /// Depth interval `[start, end)` of the medium (µm)
    pub span: Interval,
    /// Indices into the global position array
    pub range: Range<usize>,
    /// Positions measured from the top of the medium (µm)
    pub local: Vec<f64>,
}

/// Evenly spaced depth positions through the whole stack.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthGrid {
    positions: Vec<f64>,
    layers: Vec<LayerDepths>,
}

impl DepthGrid {
    /// Build the grid for per-medium `widths` (µm) sampled every `spacing` µm.
    pub fn new(widths: &[f64], spacing: f64) -> StackResult<Self> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(StackError::InvalidSpacing(spacing));
        }

        let total: f64 = widths.iter().sum();
        let positions: Vec<f64> = (0u64..)
            .map(|i| i as f64 * spacing)
            .take_while(|z| *z < total)
            .collect();

        let mut layers = Vec::with_capacity(widths.len());
        let mut start = 0.0;
        let mut first = 0;
        for &width in widths {
            let span = Interval::new(start, start + width);
            let count = positions[first..]
                .iter()
                .take_while(|z| span.contains_half_open(**z))
                .count();
            let range = first..first + count;
            let local = positions[range.clone()].iter().map(|z| z - start).collect();

            layers.push(LayerDepths { span, range, local });
            first += count;
            start += width;
        }

        Ok(Self { positions, layers })
    }

    /// All depth positions (µm).
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Depth samples of medium `index`.
    pub fn layer(&self, index: usize) -> &LayerDepths {
        &self.layers[index]
    }

    pub fn layers(&self) -> &[LayerDepths] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
