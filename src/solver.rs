use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{MaterialTotals, aggregate};
use crate::catalog::StockCatalog;
use crate::classify::{CategoryClassifier, KeywordClassifier};
use crate::config::{PlanOptions, RemnantSeed};
use crate::error::{ErrorKind, Result};
use crate::extract::{RequiredPiece, RequirementExtractor, RequirementInput, bucket_by_category};
use crate::layouts::NestingTable;
use crate::linear::LinearPlanner;
use crate::panel::PanelPlanner;
use crate::plan::CuttingPlan;
use crate::pool::{EXTERNAL_ORIGIN, Remnant, RemnantPool};
use crate::types::StockKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Planned { plans: Vec<CuttingPlan> },
    Failed { error: String, kind: ErrorKind },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementReport {
    pub id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl RequirementReport {
    pub fn plans(&self) -> &[CuttingPlan] {
        match &self.outcome {
            Outcome::Planned { plans } => plans,
            Outcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub requirements: Vec<RequirementReport>,
    pub totals: MaterialTotals,
    /// Remnants still available when the run finished.
    pub remnants: Vec<Remnant>,
}

impl Report {
    pub fn plans(&self) -> impl Iterator<Item = &CuttingPlan> {
        self.requirements.iter().flat_map(|r| r.plans())
    }

    pub fn failed(&self) -> usize {
        self.requirements.iter().filter(|r| r.is_failed()).count()
    }
}

pub struct Solver {
    catalog: StockCatalog,
    options: PlanOptions,
    layouts: NestingTable,
    classifier: Box<dyn CategoryClassifier>,
}

impl Solver {
    pub fn new(catalog: StockCatalog, options: PlanOptions) -> Self {
        let mut layouts = NestingTable::builtin();
        layouts.extend(options.layouts.iter().cloned());
        let classifier = match &options.keywords {
            Some(rules) => KeywordClassifier::new(rules.clone()),
            None => KeywordClassifier::builtin(),
        };
        Self {
            catalog,
            options,
            layouts,
            classifier: Box::new(classifier),
        }
    }

    /// Replaces the keyword classifier used for free-text category hints.
    pub fn with_classifier(mut self, classifier: impl CategoryClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn catalog(&self) -> &StockCatalog {
        &self.catalog
    }

    /// Registers offcuts known before the run. Seeds below their family's
    /// threshold are dropped. Returns how many were registered.
    pub fn seed_remnants(&self, pool: &mut RemnantPool, seeds: &[RemnantSeed]) -> Result<usize> {
        let mut registered = 0;
        for seed in seeds {
            let family = self.catalog.family(&seed.family)?;
            match pool.register(family, &seed.category, seed.shape, EXTERNAL_ORIGIN) {
                Some(_) => registered += 1,
                None => warn!(
                    family = %seed.family,
                    shape = %seed.shape,
                    "seeded remnant is not usable"
                ),
            }
        }
        Ok(registered)
    }

    /// Plans `inputs` in order against `pool`.
    ///
    /// Every requirement is extracted before anything is planned, and an
    /// invalid dimension anywhere fails the whole run. Other errors fail
    /// only their requirement, which then leaves the pool untouched.
    pub fn solve(&self, inputs: &[RequirementInput], pool: &mut RemnantPool) -> Result<Report> {
        pool.begin_run();
        let retired = pool.retire_unusable(&self.catalog);
        if retired > 0 {
            debug!(retired, "retired remnants the catalog no longer accepts");
        }
        let extractor = RequirementExtractor::new(&self.catalog, self.classifier.as_ref());

        let mut extracted = Vec::with_capacity(inputs.len());
        for input in inputs {
            match extractor.extract(input) {
                Err(e) if e.is_fatal() => return Err(e),
                result => extracted.push((input.id.clone(), result)),
            }
        }

        let mut requirements = Vec::with_capacity(extracted.len());
        for (id, pieces) in extracted {
            let outcome = match pieces.and_then(|pieces| self.plan_requirement(&pieces, pool)) {
                Ok(plans) => Outcome::Planned { plans },
                Err(e) => {
                    warn!(requirement = %id, error = %e, "requirement failed");
                    Outcome::Failed {
                        error: e.to_string(),
                        kind: e.kind(),
                    }
                }
            };
            requirements.push(RequirementReport { id, outcome });
        }

        let totals = aggregate(requirements.iter().flat_map(|r| r.plans()));
        let remnants: Vec<Remnant> = pool.available().cloned().collect();
        let report = Report {
            requirements,
            totals,
            remnants,
        };
        info!(
            requirements = report.requirements.len(),
            failed = report.failed(),
            remnants = report.remnants.len(),
            area_waste = ?report.totals.area_waste_percent,
            length_waste = ?report.totals.length_waste_percent,
            "planned run"
        );
        Ok(report)
    }

    fn plan_requirement(
        &self,
        pieces: &[RequiredPiece],
        pool: &mut RemnantPool,
    ) -> Result<Vec<CuttingPlan>> {
        let mut trial = pool.clone();
        let mut plans = Vec::with_capacity(pieces.len());
        for ((family, category), bucket) in bucket_by_category(pieces) {
            debug!(%family, %category, pieces = bucket.len(), "planning bucket");
            for piece in bucket {
                plans.push(self.plan_piece(piece, &mut trial)?);
            }
        }
        *pool = trial;
        Ok(plans)
    }

    pub fn plan_piece(&self, piece: &RequiredPiece, pool: &mut RemnantPool) -> Result<CuttingPlan> {
        let family = self.catalog.family(&piece.family)?;
        match family.kind {
            StockKind::Panel => PanelPlanner::new(family, &self.layouts).plan(piece, pool),
            StockKind::Linear => LinearPlanner::new(family, &self.options).plan(piece, pool),
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(StockCatalog::builtin(), PlanOptions::default())
    }
}
