//! Layout constraint propagation.
//!
//! Constraints flow down the tree, specifying min/max bounds a widget may
//! occupy; flex factors divide leftover main-axis space among expanding
//! children. The host view system performs final pixel layout — this module
//! covers the sizing semantics the runtime itself owes the DSL: declared
//! dimensions, fill/shrink modes, and proportional flex distribution.

use serde_json::Value;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self { width: 0.0, height: 0.0 };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Min/max bounds passed down during layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Constraints {
    /// Unbounded constraints (infinite max, zero min).
    pub const UNBOUNDED: Self = Self {
        min_width: 0.0,
        max_width: f64::INFINITY,
        min_height: 0.0,
        max_height: f64::INFINITY,
    };

    /// Exact size required.
    pub fn tight(size: Size) -> Self {
        Self {
            min_width: size.width,
            max_width: size.width,
            min_height: size.height,
            max_height: size.height,
        }
    }

    /// Zero min with the given maximum bounds.
    pub fn loose(max_width: f64, max_height: f64) -> Self {
        Self { min_width: 0.0, max_width, min_height: 0.0, max_height }
    }

    /// Clamp a size to these bounds. Non-finite inputs clamp to the minima.
    pub fn constrain(&self, size: Size) -> Size {
        let width = if size.width.is_nan() { self.min_width } else { size.width };
        let height = if size.height.is_nan() { self.min_height } else { size.height };
        Size {
            width: width.clamp(self.min_width, self.max_width),
            height: height.clamp(self.min_height, self.max_height),
        }
    }

    pub fn is_tight(&self) -> bool {
        self.min_width == self.max_width && self.min_height == self.max_height
    }

    pub fn has_bounded_width(&self) -> bool {
        self.max_width.is_finite()
    }

    pub fn has_bounded_height(&self) -> bool {
        self.max_height.is_finite()
    }
}

/// Sizing mode for one axis of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Length {
    /// Shrink to fit content.
    #[default]
    Shrink,
    /// Expand to fill available space (flex 1).
    Fill,
    /// Expand proportionally (flex n).
    FillPortion(u16),
    /// Fixed logical-pixel size.
    Fixed(f64),
}

impl Length {
    /// The flex factor, zero for non-flexible lengths.
    pub fn flex(&self) -> f64 {
        match self {
            Length::Fill => 1.0,
            Length::FillPortion(portion) => f64::from(*portion),
            _ => 0.0,
        }
    }

    pub fn is_flex(&self) -> bool {
        matches!(self, Length::Fill | Length::FillPortion(_))
    }

    /// The fixed size, if any.
    pub fn fixed(&self) -> Option<f64> {
        match self {
            Length::Fixed(value) => Some(*value),
            _ => None,
        }
    }
}

/// Parse a declared dimension prop: a number is fixed, `"fill"` expands,
/// `"auto"`/null shrink, `"fill:n"` expands proportionally. Anything else
/// shrinks (an evaluation gap, not an error).
pub fn resolve_length(value: &Value) -> Length {
    match value {
        Value::Number(number) => number
            .as_f64()
            .filter(|size| size.is_finite() && *size >= 0.0)
            .map(Length::Fixed)
            .unwrap_or_default(),
        Value::String(text) => match text.as_str() {
            "fill" => Length::Fill,
            "auto" => Length::Shrink,
            other => match other.strip_prefix("fill:").and_then(|n| n.parse::<u16>().ok()) {
                Some(portion) => Length::FillPortion(portion),
                None => Length::Shrink,
            },
        },
        _ => Length::Shrink,
    }
}

/// Divide main-axis space: fixed lengths take their size, leftover space is
/// split among flex lengths in proportion to their factors, shrink lengths
/// get zero (the host gives them intrinsic size).
pub fn distribute_main_axis(available: f64, lengths: &[Length]) -> Vec<f64> {
    let fixed_total: f64 = lengths.iter().filter_map(Length::fixed).sum();
    let flex_total: f64 = lengths.iter().map(Length::flex).sum();
    let leftover = (available - fixed_total).max(0.0);

    lengths
        .iter()
        .map(|length| match length {
            Length::Fixed(size) => *size,
            Length::Shrink => 0.0,
            flexible if flex_total > 0.0 => leftover * flexible.flex() / flex_total,
            _ => 0.0,
        })
        .collect()
}
