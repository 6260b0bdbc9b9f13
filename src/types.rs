use serde::{Deserialize, Deserializer, Serialize};

/// Axis-aligned rectangle in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    /// Orientation of `self` that fits inside `other`, upright first.
    pub fn oriented_in(&self, other: &Rect, allow_rotate: bool) -> Option<Rect> {
        if self.fits_in(other) {
            Some(*self)
        } else if allow_rotate && self.rotated().fits_in(other) {
            Some(self.rotated())
        } else {
            None
        }
    }

    pub fn min_side(&self) -> u32 {
        self.w.min(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Whether a material is sold as flat panels or as linear bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockKind {
    Panel,
    Linear,
}

/// Size of a stock unit, a required piece or a remnant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Panel(Rect),
    Bar {
        #[serde(deserialize_with = "deserialize_u32_from_number")]
        length: u32,
    },
}

impl Shape {
    pub fn bar(length: u32) -> Self {
        Shape::Bar { length }
    }

    pub fn panel(w: u32, h: u32) -> Self {
        Shape::Panel(Rect::new(w, h))
    }

    pub fn kind(&self) -> StockKind {
        match self {
            Shape::Panel(_) => StockKind::Panel,
            Shape::Bar { .. } => StockKind::Linear,
        }
    }

    /// Area in mm² for panels, length in mm for bars.
    pub fn measure(&self) -> u64 {
        match self {
            Shape::Panel(r) => r.area(),
            Shape::Bar { length } => *length as u64,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Shape::Panel(r) => Some(*r),
            Shape::Bar { .. } => None,
        }
    }

    pub fn length(&self) -> Option<u32> {
        match self {
            Shape::Panel(_) => None,
            Shape::Bar { length } => Some(*length),
        }
    }

    /// True when `self` can be cut out of `container` of the same kind.
    pub fn fits_in(&self, container: &Shape, allow_rotate: bool) -> bool {
        match (self, container) {
            (Shape::Panel(piece), Shape::Panel(stock)) => {
                piece.oriented_in(stock, allow_rotate).is_some()
            }
            (Shape::Bar { length }, Shape::Bar { length: stock }) => length <= stock,
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measure() == 0
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Panel(r) => write!(f, "{r}"),
            Shape::Bar { length } => write!(f, "{length}"),
        }
    }
}

/// Accepts any JSON number and rounds it to whole millimetres.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative number of millimetres, got {value}"
        )));
    }
    Ok(value.round() as u32)
}

pub fn deserialize_opt_u32_from_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_u32_from_number")] u32);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
}
