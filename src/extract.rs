//! Turns raw measurements into net required pieces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, MaterialFamily, StockCatalog};
use crate::classify::CategoryClassifier;
use crate::error::{PlanError, Result};
use crate::types::{
    Rect, Shape, StockKind, deserialize_opt_u32_from_number, deserialize_u32_from_number,
};

/// Gross measurement of a wall, ceiling or run, in millimetres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measurement {
    Area {
        #[serde(deserialize_with = "deserialize_u32_from_number")]
        width: u32,
        #[serde(deserialize_with = "deserialize_u32_from_number")]
        height: u32,
    },
    Linear {
        #[serde(deserialize_with = "deserialize_u32_from_number")]
        length: u32,
    },
    /// Rectangular room measured for a run along all four walls.
    Perimeter {
        #[serde(deserialize_with = "deserialize_u32_from_number")]
        width: u32,
        #[serde(deserialize_with = "deserialize_u32_from_number")]
        depth: u32,
    },
}

impl Measurement {
    fn name(&self) -> &'static str {
        match self {
            Measurement::Area { .. } => "an area",
            Measurement::Linear { .. } => "a length",
            Measurement::Perimeter { .. } => "a perimeter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    Door,
    Window,
    Drain,
    Register,
    Transition,
    Other,
}

/// Something cut out of a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub kind: OpeningKind,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    /// Missing means full height.
    #[serde(default, deserialize_with = "deserialize_opt_u32_from_number")]
    pub height: Option<u32>,
    #[serde(default = "default_one")]
    pub count: u32,
}

fn default_one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryHint {
    Explicit(Category),
    Description(String),
}

impl Default for CategoryHint {
    fn default() -> Self {
        CategoryHint::Description(String::new())
    }
}

/// One requirement as entered by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementInput {
    pub id: String,
    pub family: String,
    #[serde(default)]
    pub hint: CategoryHint,
    pub measurement: Measurement,
    #[serde(default)]
    pub openings: Vec<Opening>,
    #[serde(default = "default_one")]
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
    /// Pins the stock item instead of letting the planner choose.
    #[serde(default)]
    pub stock: Option<String>,
}

/// Net piece a planner has to cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredPiece {
    pub id: String,
    pub origin: String,
    pub family: String,
    pub category: Category,
    pub shape: Shape,
    pub quantity: u32,
    pub variant: Option<String>,
    pub stock: Option<String>,
}

impl RequiredPiece {
    pub fn net_measure(&self) -> u64 {
        self.shape.measure() * self.quantity as u64
    }
}

enum NetMeasure {
    Area(Rect),
    Length(u32),
}

pub struct RequirementExtractor<'a> {
    catalog: &'a StockCatalog,
    classifier: &'a dyn CategoryClassifier,
}

impl<'a> RequirementExtractor<'a> {
    pub fn new(catalog: &'a StockCatalog, classifier: &'a dyn CategoryClassifier) -> Self {
        Self {
            catalog,
            classifier,
        }
    }

    /// Validates dimensions before anything else so that `InvalidDimension`
    /// is reported ahead of per-requirement errors.
    pub fn extract(&self, input: &RequirementInput) -> Result<Vec<RequiredPiece>> {
        let net = net_measure(input)?;
        let family = self.catalog.family(&input.family)?;
        let category = self.category_for(family, &input.hint)?;

        let (shape, quantity) = match (net, family.kind) {
            (NetMeasure::Area(rect), StockKind::Panel) => (Shape::Panel(rect), input.quantity),
            (NetMeasure::Area(rect), StockKind::Linear) => {
                let Some(coverage) = family.coverage_width else {
                    return Err(unsupported(family, &input.measurement));
                };
                let strips = rect.w.div_ceil(coverage);
                (Shape::bar(rect.h), strips * input.quantity)
            }
            (NetMeasure::Length(length), StockKind::Linear) => {
                (Shape::bar(length), input.quantity)
            }
            (NetMeasure::Length(_), StockKind::Panel) => {
                return Err(unsupported(family, &input.measurement));
            }
        };

        Ok(vec![RequiredPiece {
            id: input.id.clone(),
            origin: input.id.clone(),
            family: family.name.clone(),
            category,
            shape,
            quantity,
            variant: input.variant.clone(),
            stock: input.stock.clone(),
        }])
    }

    fn category_for(&self, family: &MaterialFamily, hint: &CategoryHint) -> Result<Category> {
        let classified = match hint {
            CategoryHint::Explicit(category) => return Ok(category.clone()),
            CategoryHint::Description(text) => self
                .classifier
                .classify(text)
                .filter(|c| family.has_category(c)),
        };
        classified
            .or_else(|| family.default_category().cloned())
            .ok_or_else(|| PlanError::UnknownMaterialCategory {
                family: family.name.clone(),
                category: "<default>".to_string(),
            })
    }
}

fn unsupported(family: &MaterialFamily, measurement: &Measurement) -> PlanError {
    PlanError::UnsupportedMeasurement {
        family: family.name.clone(),
        measurement: measurement.name().to_string(),
    }
}

fn net_measure(input: &RequirementInput) -> Result<NetMeasure> {
    let id = input.id.as_str();
    if input.quantity == 0 {
        return Err(PlanError::invalid(id, "quantity must be positive"));
    }
    for opening in &input.openings {
        if opening.width == 0 || opening.height == Some(0) || opening.count == 0 {
            return Err(PlanError::invalid(
                id,
                format!("{:?} opening has a zero dimension or count", opening.kind),
            ));
        }
    }

    match input.measurement {
        Measurement::Area { width, height } => {
            if width == 0 || height == 0 {
                return Err(PlanError::invalid(id, "area must have a positive width and height"));
            }
            let deduction = equivalent_width(&input.openings, height);
            if deduction >= width as u64 {
                return Err(PlanError::invalid(
                    id,
                    format!("openings remove {deduction} of {width} mm width"),
                ));
            }
            Ok(NetMeasure::Area(Rect::new(width - deduction as u32, height)))
        }
        Measurement::Linear { length } => net_length(id, length as u64, &input.openings),
        Measurement::Perimeter { width, depth } => {
            if width == 0 || depth == 0 {
                return Err(PlanError::invalid(id, "room must have a positive width and depth"));
            }
            net_length(id, 2 * (width as u64 + depth as u64), &input.openings)
        }
    }
}

/// Width an area loses to its openings. Each opening's area is spread over
/// the full height and rounded down, so the net rectangle never undershoots.
fn equivalent_width(openings: &[Opening], height: u32) -> u64 {
    openings
        .iter()
        .map(|o| {
            let h = o.height.unwrap_or(height).min(height) as u64;
            o.count as u64 * (o.width as u64 * h / height as u64)
        })
        .sum()
}

fn net_length(id: &str, gross: u64, openings: &[Opening]) -> Result<NetMeasure> {
    let deduction: u64 = openings
        .iter()
        .map(|o| o.count as u64 * o.width as u64)
        .sum();
    if gross == 0 || deduction >= gross {
        return Err(PlanError::invalid(
            id,
            format!("net length is not positive ({gross} mm less {deduction} mm of openings)"),
        ));
    }
    let net = gross - deduction;
    u32::try_from(net)
        .map(NetMeasure::Length)
        .map_err(|_| PlanError::invalid(id, format!("net length {net} mm is out of range")))
}

/// Groups pieces so that no bucket mixes families or categories.
pub fn bucket_by_category(
    pieces: &[RequiredPiece],
) -> BTreeMap<(String, Category), Vec<&RequiredPiece>> {
    let mut buckets: BTreeMap<(String, Category), Vec<&RequiredPiece>> = BTreeMap::new();
    for piece in pieces {
        buckets
            .entry((piece.family.clone(), piece.category.clone()))
            .or_default()
            .push(piece);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::KeywordClassifier;

    fn input(family: &str, measurement: Measurement) -> RequirementInput {
        RequirementInput {
            id: "r1".to_string(),
            family: family.to_string(),
            hint: CategoryHint::default(),
            measurement,
            openings: vec![],
            quantity: 1,
            variant: None,
            stock: None,
        }
    }

    fn door(width: u32) -> Opening {
        Opening {
            kind: OpeningKind::Door,
            width,
            height: None,
            count: 1,
        }
    }

    fn extract_one(req: &RequirementInput) -> Result<RequiredPiece> {
        let catalog = StockCatalog::builtin();
        let classifier = KeywordClassifier::builtin();
        let extractor = RequirementExtractor::new(&catalog, &classifier);
        extractor.extract(req).map(|mut pieces| pieces.remove(0))
    }

    #[test]
    fn test_full_height_door_removes_its_width() {
        let mut req = input(
            "gypsum-board",
            Measurement::Area {
                width: 4000,
                height: 2700,
            },
        );
        req.openings.push(door(900));
        let piece = extract_one(&req).unwrap();
        assert_eq!(piece.shape, Shape::panel(3100, 2700));
        assert_eq!(piece.category, Category::new("standard"));
    }

    #[test]
    fn test_partial_window_becomes_equivalent_width() {
        let mut req = input(
            "gypsum-board",
            Measurement::Area {
                width: 4000,
                height: 2500,
            },
        );
        req.openings.push(Opening {
            kind: OpeningKind::Window,
            width: 1000,
            height: Some(1200),
            count: 2,
        });
        // 1000 * 1200 / 2500 = 480 per window
        let piece = extract_one(&req).unwrap();
        assert_eq!(piece.shape, Shape::panel(3040, 2500));
    }

    #[test]
    fn test_perimeter_less_doors() {
        let mut req = input(
            "baseboard",
            Measurement::Perimeter {
                width: 4000,
                depth: 3000,
            },
        );
        req.openings.push(door(800));
        req.openings.push(Opening {
            kind: OpeningKind::Transition,
            width: 100,
            height: None,
            count: 2,
        });
        let piece = extract_one(&req).unwrap();
        assert_eq!(piece.shape, Shape::bar(13_000));
        assert_eq!(piece.category, Category::new("pine"));
    }

    #[test]
    fn test_ceiling_strips_from_area() {
        let req = input(
            "ceiling-strip",
            Measurement::Area {
                width: 2600,
                height: 3800,
            },
        );
        let piece = extract_one(&req).unwrap();
        assert_eq!(piece.shape, Shape::bar(3800));
        assert_eq!(piece.quantity, 11);
    }

    #[test]
    fn test_description_selects_category() {
        let mut req = input(
            "gypsum-board",
            Measurement::Area {
                width: 2000,
                height: 2500,
            },
        );
        req.hint = CategoryHint::Description("Guest bathroom".to_string());
        assert_eq!(
            extract_one(&req).unwrap().category,
            Category::new("moisture-resistant")
        );

        // baseboards have no moisture rating: fall back to the default category
        let mut run = input("baseboard", Measurement::Linear { length: 3000 });
        run.hint = CategoryHint::Description("Guest bathroom".to_string());
        assert_eq!(extract_one(&run).unwrap().category, Category::new("pine"));
    }

    #[test]
    fn test_non_positive_net_dimension() {
        let mut req = input("baseboard", Measurement::Linear { length: 800 });
        req.openings.push(door(800));
        let err = extract_one(&req).unwrap_err();
        assert!(err.is_fatal());

        let req = input(
            "gypsum-board",
            Measurement::Area {
                width: 0,
                height: 2500,
            },
        );
        assert!(matches!(
            extract_one(&req),
            Err(PlanError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_invalid_dimension_wins_over_unknown_family() {
        let req = input("roofing", Measurement::Linear { length: 0 });
        assert!(extract_one(&req).unwrap_err().is_fatal());

        let req = input("roofing", Measurement::Linear { length: 10 });
        assert_eq!(
            extract_one(&req),
            Err(PlanError::UnknownFamily("roofing".to_string()))
        );
    }

    #[test]
    fn test_length_measurement_for_panels_is_unsupported() {
        let req = input("gypsum-board", Measurement::Linear { length: 3000 });
        assert!(matches!(
            extract_one(&req),
            Err(PlanError::UnsupportedMeasurement { .. })
        ));
    }

    #[test]
    fn test_buckets_never_mix_categories() {
        let piece = |id: &str, category: &str| RequiredPiece {
            id: id.to_string(),
            origin: id.to_string(),
            family: "gypsum-board".to_string(),
            category: Category::new(category),
            shape: Shape::panel(1000, 1000),
            quantity: 1,
            variant: None,
            stock: None,
        };
        let pieces = vec![
            piece("a", "standard"),
            piece("b", "fire-resistant"),
            piece("c", "standard"),
        ];
        let buckets = bucket_by_category(&pieces);
        assert_eq!(buckets.len(), 2);
        let standard = &buckets[&("gypsum-board".to_string(), Category::new("standard"))];
        let ids: Vec<&str> = standard.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_requirement_from_json() {
        let json = r#"{
            "id": "kitchen-north",
            "family": "gypsum-board",
            "hint": {"description": "Kitchen"},
            "measurement": {"type": "area", "width": 3800, "height": 2700},
            "openings": [{"kind": "window", "width": 1200, "height": 1350}]
        }"#;
        let req: RequirementInput = serde_json::from_str(json).unwrap();
        assert_eq!(req.quantity, 1);
        let piece = extract_one(&req).unwrap();
        assert_eq!(piece.shape, Shape::panel(3200, 2700));
        assert_eq!(piece.category, Category::new("moisture-resistant"));
    }
}
