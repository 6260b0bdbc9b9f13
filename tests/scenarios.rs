use cut_planner::catalog::{Category, StockCatalog};
use cut_planner::config::{PlanOptions, RemnantSeed};
use cut_planner::extract::{CategoryHint, Measurement, RequirementInput};
use cut_planner::plan::{CutSource, CuttingPlan, Tier};
use cut_planner::pool::RemnantPool;
use cut_planner::solver::{Report, Solver};
use cut_planner::types::Shape;

fn requirement(
    id: &str,
    family: &str,
    category: &str,
    measurement: Measurement,
) -> RequirementInput {
    RequirementInput {
        id: id.to_string(),
        family: family.to_string(),
        hint: CategoryHint::Explicit(Category::new(category)),
        measurement,
        openings: vec![],
        quantity: 1,
        variant: None,
        stock: None,
    }
}

fn run(id: &str, category: &str, length: u32) -> RequirementInput {
    requirement(id, "baseboard", category, Measurement::Linear { length })
}

fn seed(family: &str, category: &str, shape: Shape) -> RemnantSeed {
    RemnantSeed {
        family: family.to_string(),
        category: Category::new(category),
        shape,
    }
}

fn only_plan(report: &Report, idx: usize) -> &CuttingPlan {
    let plans = report.requirements[idx].plans();
    assert_eq!(plans.len(), 1, "{:?}", report.requirements[idx]);
    &plans[0]
}

#[test]
fn scenario_a_band_decomposition() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();
    let mut wall = requirement(
        "living-north",
        "gypsum-board",
        "standard",
        Measurement::Area {
            width: 3800,
            height: 2700,
        },
    );
    wall.stock = Some("GKB-12.5-1200x2400".to_string());

    let report = solver.solve(&[wall], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.whole_units, 3);
    let cuts: Vec<(Shape, u32)> = plan.cuts.iter().map(|c| (c.shape, c.count)).collect();
    assert_eq!(
        cuts,
        vec![
            (Shape::panel(1200, 300), 3),
            (Shape::panel(200, 2400), 1),
            (Shape::panel(200, 300), 1),
        ]
    );
    assert!(plan.is_balanced());
    assert_eq!(report.totals.stock[0].units(), 5);
}

#[test]
fn scenario_b_exact_combination() {
    let mut catalog = StockCatalog::builtin();
    let baseboard = catalog
        .families
        .iter_mut()
        .find(|f| f.name == "baseboard")
        .unwrap();
    let template = baseboard.items[0].clone();
    baseboard.items = [3000, 4000, 5000, 6000]
        .into_iter()
        .map(|len| {
            let mut item = template.clone();
            item.id = format!("OAK-{len}");
            item.category = Category::new("oak");
            item.size = Shape::bar(len);
            item
        })
        .collect();

    let solver = Solver::new(catalog, PlanOptions::default());
    let mut pool = RemnantPool::new();
    let report = solver.solve(&[run("long-wall", "oak", 7000)], &mut pool).unwrap();
    let plan = only_plan(&report, 0);

    assert_eq!(
        plan.cuts[0].source,
        CutSource::Tiered {
            tier: Tier::ExactCombination,
            whole: vec!["OAK-3000".to_string(), "OAK-4000".to_string()],
            segment: None,
        }
    );
    assert_eq!(plan.units(), 2);
    assert_eq!(plan.scrap, 0);
    assert_eq!(report.totals.length_waste_percent, Some(0.0));
}

#[test]
fn scenario_c_remnant_reuse() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &[seed("baseboard", "pine", Shape::bar(2500))])
        .unwrap();

    let report = solver.solve(&[run("hall", "pine", 2000)], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.units(), 0);
    assert!(plan.remnants_consumed[0].carried);
    assert_eq!(plan.remnants_generated[0].shape, Shape::bar(500));
    assert_eq!(report.remnants.len(), 1);
    assert_eq!(report.remnants[0].shape, Shape::bar(500));
    assert_eq!(report.remnants[0].origin, "hall");
    let pine = &report.totals.categories[0];
    assert_eq!(pine.carried_in, 2500);
    assert!((pine.waste_percent - 20.0).abs() < 1e-9);
}

#[test]
fn scenario_c_leftover_below_threshold_is_scrap() {
    let mut catalog = StockCatalog::builtin();
    for family in &mut catalog.families {
        if family.name == "baseboard" {
            family.min_remnant = 600;
        }
    }
    let solver = Solver::new(catalog, PlanOptions::default());
    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &[seed("baseboard", "pine", Shape::bar(2500))])
        .unwrap();

    let report = solver.solve(&[run("hall", "pine", 2000)], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.scrap, 500);
    assert!(plan.remnants_generated.is_empty());
    assert!(report.remnants.is_empty());
}

#[test]
fn scenario_d_category_isolation() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(
            &mut pool,
            &[seed("gypsum-board", "fire-resistant", Shape::panel(1200, 2000))],
        )
        .unwrap();

    let mut standard = requirement(
        "bedroom",
        "gypsum-board",
        "standard",
        Measurement::Area {
            width: 1000,
            height: 2000,
        },
    );
    standard.stock = Some("GKB-12.5-1200x2000".to_string());
    let report = solver.solve(&[standard], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert!(plan.remnants_consumed.is_empty());
    assert_eq!(plan.units(), 1);
    assert!(report.remnants.iter().any(|r| {
        r.category.as_str() == "fire-resistant" && r.shape == Shape::panel(1200, 2000)
    }));

    let mut fire = requirement(
        "garage",
        "gypsum-board",
        "fire-resistant",
        Measurement::Area {
            width: 1000,
            height: 2000,
        },
    );
    fire.stock = Some("GKF-12.5-1200x2000".to_string());
    let report = solver.solve(&[fire], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.units(), 0);
    assert_eq!(plan.remnants_consumed.len(), 1);
}

#[test]
fn scenario_d_linear_category_isolation() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &[seed("baseboard", "mdf", Shape::bar(2000))])
        .unwrap();

    let report = solver.solve(&[run("hall", "pine", 2000)], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert!(plan.remnants_consumed.is_empty());
    assert_eq!(plan.units(), 1);
    assert!(report.remnants.iter().any(|r| {
        r.category.as_str() == "mdf" && r.shape == Shape::bar(2000) && r.consumer.is_none()
    }));

    let report = solver.solve(&[run("office", "mdf", 2000)], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.units(), 0);
    assert_eq!(plan.remnants_consumed[0].shape, Shape::bar(2000));
}

#[test]
fn substitution_is_one_way() {
    let solver = Solver::default();

    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &[seed("baseboard", "pine-painted", Shape::bar(2000))])
        .unwrap();
    let report = solver.solve(&[run("hall", "pine", 2000)], &mut pool).unwrap();
    assert!(only_plan(&report, 0).remnants_consumed.is_empty());

    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &[seed("baseboard", "pine", Shape::bar(2000))])
        .unwrap();
    let report = solver.solve(&[run("hall", "pine-painted", 2000)], &mut pool).unwrap();
    assert_eq!(only_plan(&report, 0).remnants_consumed.len(), 1);
}

#[test]
fn long_ceiling_is_spliced() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();
    let ceiling = requirement(
        "attic",
        "ceiling-strip",
        "pvc",
        Measurement::Area {
            width: 2500,
            height: 7000,
        },
    );

    let report = solver.solve(&[ceiling], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.cuts[0].count, 10);
    assert_eq!(
        plan.cuts[0].source,
        CutSource::Tiered {
            tier: Tier::ExactCombination,
            whole: vec!["PVC-250-3000".to_string(), "PVC-250-4000".to_string()],
            segment: None,
        }
    );
    assert_eq!(plan.whole_units, 20);
    assert_eq!(plan.joints, 10);
    assert!(plan.is_balanced());
}

#[test]
fn threshold_boundary() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();
    let registered = solver
        .seed_remnants(
            &mut pool,
            &[
                seed("baseboard", "pine", Shape::bar(299)),
                seed("baseboard", "pine", Shape::bar(300)),
            ],
        )
        .unwrap();
    assert_eq!(registered, 1);

    let report = solver.solve(&[run("niche", "pine", 300)], &mut pool).unwrap();
    let plan = only_plan(&report, 0);
    assert_eq!(plan.units(), 0);
    assert_eq!(plan.remnants_consumed[0].shape, Shape::bar(300));
    assert!(report.remnants.is_empty());
}

#[test]
fn identical_input_gives_identical_report() {
    let inputs = vec![
        requirement(
            "kitchen",
            "gypsum-board",
            "moisture-resistant",
            Measurement::Area {
                width: 4100,
                height: 2650,
            },
        ),
        run("kitchen-base", "pine", 4600),
        requirement(
            "hall",
            "gypsum-board",
            "moisture-resistant",
            Measurement::Area {
                width: 900,
                height: 2650,
            },
        ),
        run("hall-base", "pine", 1800),
    ];
    let solver = Solver::default();

    let first = solver.solve(&inputs, &mut RemnantPool::new()).unwrap();
    let second = solver.solve(&inputs, &mut RemnantPool::new()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    for plan in first.plans() {
        assert!(plan.is_balanced(), "{plan:?}");
    }
}

#[test]
fn reordering_without_reuse_keeps_new_stock() {
    let wall = requirement(
        "wall",
        "gypsum-board",
        "standard",
        Measurement::Area {
            width: 3600,
            height: 2400,
        },
    );
    let base = run("base", "mdf", 6000);
    let solver = Solver::default();

    let forward = solver
        .solve(&[wall.clone(), base.clone()], &mut RemnantPool::new())
        .unwrap();
    let backward = solver.solve(&[base, wall], &mut RemnantPool::new()).unwrap();
    assert_eq!(forward.totals.stock, backward.totals.stock);
}

#[test]
fn first_requirement_wins_a_remnant() {
    let solver = Solver::default();
    let seeds = [seed("baseboard", "pine", Shape::bar(2100))];

    let mut pool = RemnantPool::new();
    solver.seed_remnants(&mut pool, &seeds).unwrap();
    let report = solver
        .solve(&[run("a", "pine", 2000), run("b", "pine", 1800)], &mut pool)
        .unwrap();
    assert_eq!(only_plan(&report, 0).remnants_consumed.len(), 1);
    assert!(only_plan(&report, 1).remnants_consumed.is_empty());

    let mut pool = RemnantPool::new();
    solver.seed_remnants(&mut pool, &seeds).unwrap();
    let report = solver
        .solve(&[run("b", "pine", 1800), run("a", "pine", 2000)], &mut pool)
        .unwrap();
    assert_eq!(only_plan(&report, 0).remnants_consumed.len(), 1);
    assert!(only_plan(&report, 1).remnants_consumed.is_empty());
}

#[test]
fn pool_carries_between_runs() {
    let solver = Solver::default();
    let mut pool = RemnantPool::new();

    let first = solver.solve(&[run("room-1", "pine", 1000)], &mut pool).unwrap();
    assert_eq!(first.remnants.len(), 1);
    assert_eq!(first.remnants[0].shape, Shape::bar(1400));

    let second = solver.solve(&[run("room-2", "pine", 1200)], &mut pool).unwrap();
    let plan = only_plan(&second, 0);
    assert_eq!(plan.units(), 0);
    assert!(plan.remnants_consumed[0].carried);
    assert_eq!(plan.scrap, 200);
    assert_eq!(second.totals.categories[0].carried_in, 1400);
}

#[test]
fn raised_threshold_retires_carried_remnants() {
    let mut pool = RemnantPool::new();
    let first = Solver::default()
        .solve(&[run("room-1", "pine", 1000)], &mut pool)
        .unwrap();
    assert_eq!(first.remnants[0].shape, Shape::bar(1400));

    let mut catalog = StockCatalog::builtin();
    for family in &mut catalog.families {
        if family.name == "baseboard" {
            family.min_remnant = 1500;
        }
    }
    let solver = Solver::new(catalog, PlanOptions::default());
    let second = solver.solve(&[run("room-2", "pine", 1200)], &mut pool).unwrap();
    let plan = only_plan(&second, 0);
    assert!(plan.remnants_consumed.is_empty());
    assert_eq!(plan.units(), 1);
    assert!(second.remnants.is_empty());
    assert!(pool.all().iter().any(|r| r.shape == Shape::bar(1400) && !r.usable));
}
