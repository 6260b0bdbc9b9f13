//! Stock catalogs: which panel and bar sizes exist for each material
//! family and category.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::types::{Shape, StockKind, deserialize_opt_u32_from_number, deserialize_u32_from_number};

/// Isolation tag of a material (humidity or fire rating, gauge, wood type).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub category: Category,
    /// Thickness, gauge or similar choice a requirement may pin.
    #[serde(default)]
    pub variant: Option<String>,
    pub size: Shape,
}

/// Remnants of category `remnant` may serve requirements of category `serves`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub remnant: Category,
    pub serves: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFamily {
    pub name: String,
    pub kind: StockKind,
    /// Smallest offcut worth keeping. Panels need both sides at or above it.
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub min_remnant: u32,
    #[serde(default)]
    pub allow_rotation: bool,
    #[serde(default = "default_true")]
    pub allow_joints: bool,
    /// Width covered by one strip when an area is clad with linear stock.
    #[serde(default, deserialize_with = "deserialize_opt_u32_from_number")]
    pub coverage_width: Option<u32>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    pub items: Vec<StockItem>,
}

fn default_true() -> bool {
    true
}

impl MaterialFamily {
    /// Stock items of `category`, optionally narrowed to a variant or a
    /// single stock id, in declaration order.
    pub fn sizes_for(
        &self,
        category: &Category,
        variant: Option<&str>,
        stock_id: Option<&str>,
    ) -> Result<Vec<&StockItem>> {
        let items: Vec<&StockItem> = self
            .items
            .iter()
            .filter(|item| &item.category == category)
            .filter(|item| variant.is_none_or(|v| item.variant.as_deref() == Some(v)))
            .filter(|item| stock_id.is_none_or(|id| item.id == id))
            .collect();

        if items.is_empty() {
            let mut category = category.to_string();
            if let Some(v) = variant {
                category.push_str(&format!(" (variant {v})"));
            }
            if let Some(id) = stock_id {
                category.push_str(&format!(" (stock {id})"));
            }
            return Err(PlanError::UnknownMaterialCategory {
                family: self.name.clone(),
                category,
            });
        }
        Ok(items)
    }

    pub fn has_category(&self, category: &Category) -> bool {
        self.items.iter().any(|item| &item.category == category)
    }

    /// First declared category; used when a description matches nothing.
    pub fn default_category(&self) -> Option<&Category> {
        self.items.first().map(|item| &item.category)
    }

    /// Whether a remnant of `remnant` may cover a requirement of `required`.
    pub fn accepts(&self, remnant: &Category, required: &Category) -> bool {
        remnant == required
            || self
                .substitutions
                .iter()
                .any(|s| &s.remnant == remnant && &s.serves == required)
    }

    /// Whether an offcut of this size is kept rather than scrapped.
    pub fn is_usable(&self, shape: &Shape) -> bool {
        match shape {
            Shape::Panel(r) => !r.is_empty() && r.min_side() >= self.min_remnant,
            Shape::Bar { length } => *length > 0 && *length >= self.min_remnant,
        }
    }

    pub fn longest_bar(&self, category: &Category) -> Option<u32> {
        self.items
            .iter()
            .filter(|item| &item.category == category)
            .filter_map(|item| item.size.length())
            .max()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.items.is_empty() {
            return Err(format!("family '{}' has no stock items", self.name));
        }
        for item in &self.items {
            if item.size.kind() != self.kind {
                return Err(format!(
                    "stock '{}' does not match the {:?} kind of family '{}'",
                    item.id, self.kind, self.name
                ));
            }
            if item.size.is_empty() {
                return Err(format!("stock '{}' has a zero dimension", item.id));
            }
        }
        if self.coverage_width == Some(0) {
            return Err(format!("family '{}' has a zero coverage width", self.name));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCatalog {
    pub families: Vec<MaterialFamily>,
}

impl StockCatalog {
    pub fn family(&self, name: &str) -> Result<&MaterialFamily> {
        self.families
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| PlanError::UnknownFamily(name.to_string()))
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        for (i, family) in self.families.iter().enumerate() {
            if self.families[..i].iter().any(|f| f.name == family.name) {
                return Err(format!("family '{}' is declared twice", family.name));
            }
            family.validate()?;
        }
        Ok(())
    }

    /// Reference catalog used when no catalog file is given.
    pub fn builtin() -> Self {
        let board = |id: &str, category: &str, variant: &str, h: u32| StockItem {
            id: id.to_string(),
            category: Category::new(category),
            variant: Some(variant.to_string()),
            size: Shape::panel(1200, h),
        };
        let bar = |id: &str, category: &str, length: u32| StockItem {
            id: id.to_string(),
            category: Category::new(category),
            variant: None,
            size: Shape::bar(length),
        };

        let mut boards = Vec::new();
        for (prefix, category) in [
            ("GKB", "standard"),
            ("GKBI", "moisture-resistant"),
            ("GKF", "fire-resistant"),
        ] {
            for h in [2000, 2400, 2600, 3000] {
                boards.push(board(
                    &format!("{prefix}-12.5-1200x{h}"),
                    category,
                    "12.5",
                    h,
                ));
            }
        }
        boards.push(board("GKB-15-1200x2600", "standard", "15", 2600));
        boards.push(board("GKF-15-1200x2600", "fire-resistant", "15", 2600));

        StockCatalog {
            families: vec![
                MaterialFamily {
                    name: "gypsum-board".to_string(),
                    kind: StockKind::Panel,
                    min_remnant: 200,
                    allow_rotation: true,
                    allow_joints: true,
                    coverage_width: None,
                    substitutions: vec![],
                    items: boards,
                },
                MaterialFamily {
                    name: "ceiling-strip".to_string(),
                    kind: StockKind::Linear,
                    min_remnant: 500,
                    allow_rotation: false,
                    allow_joints: true,
                    coverage_width: Some(250),
                    substitutions: vec![],
                    items: vec![
                        bar("PVC-250-3000", "pvc", 3000),
                        bar("PVC-250-4000", "pvc", 4000),
                        bar("PVC-250-6000", "pvc", 6000),
                    ],
                },
                MaterialFamily {
                    name: "baseboard".to_string(),
                    kind: StockKind::Linear,
                    min_remnant: 300,
                    allow_rotation: false,
                    allow_joints: true,
                    coverage_width: None,
                    substitutions: vec![Substitution {
                        remnant: Category::new("pine"),
                        serves: Category::new("pine-painted"),
                    }],
                    items: vec![
                        bar("PINE-2400", "pine", 2400),
                        bar("PINE-3000", "pine", 3000),
                        bar("PINE-PAINTED-2400", "pine-painted", 2400),
                        bar("MDF-2400", "mdf", 2400),
                        bar("MDF-6000", "mdf", 6000),
                    ],
                },
            ],
        }
    }
}
