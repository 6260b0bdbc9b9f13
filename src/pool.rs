//! Run-scoped registry of reusable offcuts.

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, MaterialFamily, StockCatalog};
use crate::types::Shape;

pub type RemnantId = u32;

/// Origin recorded for remnants seeded from outside any run.
pub const EXTERNAL_ORIGIN: &str = "external";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remnant {
    pub id: RemnantId,
    pub family: String,
    pub category: Category,
    pub shape: Shape,
    /// Requirement whose cutting left this offcut.
    pub origin: String,
    /// Run in which the remnant was registered.
    pub generation: u32,
    /// Cleared once the catalog no longer accepts the offcut.
    pub usable: bool,
    pub consumed: bool,
    pub consumer: Option<String>,
}

impl Remnant {
    pub fn is_available(&self) -> bool {
        self.usable && !self.consumed
    }
}

/// Offcuts available for reuse.
///
/// Ids are handed out sequentially, so a cloned pool replays identically.
/// The pool is owned by whoever drives the runs; pass the same value to
/// consecutive runs to carry remnants from room to room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemnantPool {
    remnants: Vec<Remnant>,
    next_id: RemnantId,
    generation: u32,
}

impl RemnantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new run; everything already registered counts as carried in.
    pub fn begin_run(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether the remnant was registered before the current run.
    pub fn is_carried(&self, id: RemnantId) -> bool {
        self.get(id).is_some_and(|r| r.generation < self.generation)
    }

    /// Registers an offcut. Returns `None` when it is below the family's
    /// usable threshold, in which case it is scrap and nothing is stored.
    pub fn register(
        &mut self,
        family: &MaterialFamily,
        category: &Category,
        shape: Shape,
        origin: &str,
    ) -> Option<RemnantId> {
        if shape.kind() != family.kind || !family.is_usable(&shape) {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.remnants.push(Remnant {
            id,
            family: family.name.clone(),
            category: category.clone(),
            shape,
            origin: origin.to_string(),
            generation: self.generation,
            usable: true,
            consumed: false,
            consumer: None,
        });
        tracing::trace!(id, %shape, %category, origin, "registered remnant");
        Some(id)
    }

    pub fn get(&self, id: RemnantId) -> Option<&Remnant> {
        // ids are pushed in increasing order
        self.remnants
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| &self.remnants[i])
    }

    /// Best available remnant for `required`: smallest leftover, then lowest id.
    pub fn find_usable(
        &self,
        required: &Shape,
        family: &MaterialFamily,
        category: &Category,
        allow_rotation: bool,
    ) -> Option<RemnantId> {
        self.best_of(
            self.remnants.iter(),
            required,
            family,
            category,
            allow_rotation,
        )
    }

    /// Like [`find_usable`](Self::find_usable), restricted to `candidates`.
    pub fn find_usable_in(
        &self,
        candidates: &[RemnantId],
        required: &Shape,
        family: &MaterialFamily,
        category: &Category,
        allow_rotation: bool,
    ) -> Option<RemnantId> {
        self.best_of(
            candidates.iter().filter_map(|&id| self.get(id)),
            required,
            family,
            category,
            allow_rotation,
        )
    }

    fn best_of<'a>(
        &self,
        remnants: impl Iterator<Item = &'a Remnant>,
        required: &Shape,
        family: &MaterialFamily,
        category: &Category,
        allow_rotation: bool,
    ) -> Option<RemnantId> {
        remnants
            .filter(|r| r.is_available())
            .filter(|r| r.family == family.name)
            .filter(|r| family.accepts(&r.category, category))
            .filter(|r| required.fits_in(&r.shape, allow_rotation))
            .min_by_key(|r| (r.shape.measure() - required.measure(), r.id))
            .map(|r| r.id)
    }

    /// Hands the remnant to `consumer`. A remnant is consumed at most once;
    /// whatever the consumer does not use must be registered as a new remnant.
    pub fn consume(&mut self, id: RemnantId, consumer: &str) -> Option<Remnant> {
        let idx = self.remnants.binary_search_by_key(&id, |r| r.id).ok()?;
        let remnant = &mut self.remnants[idx];
        if !remnant.is_available() {
            return None;
        }
        remnant.consumed = true;
        remnant.consumer = Some(consumer.to_string());
        tracing::trace!(id, consumer, "consumed remnant");
        Some(remnant.clone())
    }

    pub fn available(&self) -> impl Iterator<Item = &Remnant> {
        self.remnants.iter().filter(|r| r.is_available())
    }

    pub fn all(&self) -> &[Remnant] {
        &self.remnants
    }

    /// Retires available remnants that `catalog` would not register today:
    /// their family is gone or its threshold was raised since they were
    /// cut. Retired remnants stay in the pool but are never offered again.
    pub fn retire_unusable(&mut self, catalog: &StockCatalog) -> usize {
        let mut retired = 0;
        for remnant in self.remnants.iter_mut().filter(|r| r.is_available()) {
            let usable = catalog
                .family(&remnant.family)
                .is_ok_and(|f| f.is_usable(&remnant.shape));
            if !usable {
                remnant.usable = false;
                retired += 1;
                tracing::trace!(id = remnant.id, shape = %remnant.shape, "retired remnant");
            }
        }
        retired
    }

    pub fn len(&self) -> usize {
        self.available().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StockCatalog;

    fn baseboard() -> MaterialFamily {
        StockCatalog::builtin().family("baseboard").unwrap().clone()
    }

    #[test]
    fn test_register_respects_threshold() {
        let family = baseboard();
        let pine = Category::new("pine");
        let mut pool = RemnantPool::new();
        assert_eq!(pool.register(&family, &pine, Shape::bar(300), "a"), Some(0));
        assert_eq!(pool.register(&family, &pine, Shape::bar(299), "a"), None);
        assert_eq!(pool.register(&family, &pine, Shape::panel(900, 900), "a"), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_find_usable_prefers_smallest_leftover() {
        let family = baseboard();
        let pine = Category::new("pine");
        let mut pool = RemnantPool::new();
        pool.register(&family, &pine, Shape::bar(2500), "a");
        pool.register(&family, &pine, Shape::bar(2100), "b");
        pool.register(&family, &pine, Shape::bar(1900), "c");
        pool.register(&family, &pine, Shape::bar(2100), "d");

        assert_eq!(pool.find_usable(&Shape::bar(2000), &family, &pine, false), Some(1));
        assert_eq!(pool.find_usable(&Shape::bar(2600), &family, &pine, false), None);
    }

    #[test]
    fn test_category_isolation() {
        let family = baseboard();
        let mut pool = RemnantPool::new();
        pool.register(&family, &Category::new("mdf"), Shape::bar(2000), "a");
        assert_eq!(
            pool.find_usable(&Shape::bar(2000), &family, &Category::new("pine"), false),
            None
        );

        // declared substitution: plain pine may serve painted pine
        pool.register(&family, &Category::new("pine"), Shape::bar(2000), "b");
        assert_eq!(
            pool.find_usable(
                &Shape::bar(2000),
                &family,
                &Category::new("pine-painted"),
                false
            ),
            Some(1)
        );
    }

    #[test]
    fn test_consume_is_exclusive() {
        let family = baseboard();
        let pine = Category::new("pine");
        let mut pool = RemnantPool::new();
        let id = pool.register(&family, &pine, Shape::bar(2000), "a").unwrap();

        let taken = pool.consume(id, "room-1").unwrap();
        assert_eq!(taken.shape, Shape::bar(2000));
        assert!(pool.consume(id, "room-2").is_none());
        assert_eq!(pool.get(id).unwrap().consumer.as_deref(), Some("room-1"));
        assert_eq!(pool.find_usable(&Shape::bar(100), &family, &pine, false), None);
    }

    #[test]
    fn test_generations_mark_carried_remnants() {
        let family = baseboard();
        let pine = Category::new("pine");
        let mut pool = RemnantPool::new();
        let old = pool.register(&family, &pine, Shape::bar(1000), "a").unwrap();
        pool.begin_run();
        let new = pool.register(&family, &pine, Shape::bar(1000), "b").unwrap();
        assert!(pool.is_carried(old));
        assert!(!pool.is_carried(new));
    }

    #[test]
    fn test_retire_unusable() {
        let family = baseboard();
        let pine = Category::new("pine");
        let mut pool = RemnantPool::new();
        let short = pool.register(&family, &pine, Shape::bar(400), "a").unwrap();
        let long = pool.register(&family, &pine, Shape::bar(1200), "a").unwrap();

        let mut catalog = StockCatalog::builtin();
        for f in &mut catalog.families {
            if f.name == "baseboard" {
                f.min_remnant = 500;
            }
        }
        assert_eq!(pool.retire_unusable(&catalog), 1);
        let retired = pool.get(short).unwrap();
        assert!(!retired.usable);
        assert!(!retired.consumed);
        assert_eq!(pool.find_usable(&Shape::bar(300), &family, &pine, false), Some(long));
        assert!(pool.consume(short, "x").is_none());

        catalog.families.retain(|f| f.name != "baseboard");
        assert_eq!(pool.retire_unusable(&catalog), 1);
        assert!(pool.is_empty());
    }
}
