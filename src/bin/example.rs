//! Skeletal FEA example - portal frame and Timoshenko cantilever

use anyhow::{Context, Result};
use skeletal_fea::prelude::*;

fn portal_frame() -> Result<()> {
    println!("=== Portal Frame ===\n");

    let mut model = Model::new();

    // W12x26 (approximate properties, m)
    let section = Section::new(0.00494, 8.49e-5, 7.2e-6, 1.25e-7);
    let steel = Material::steel();

    //     N3 -------- N4
    //     |          |
    //     |          |
    //     N1        N2
    //   Fixed     Fixed
    let height = 4.0;
    let span = 6.0;

    let n1 = model.add_node(Node::new(0.0, 0.0, 0.0).with_constraint(Constraint::fixed()));
    let n2 = model.add_node(Node::new(span, 0.0, 0.0).with_constraint(Constraint::fixed()));
    let n3 = model.add_node(Node::new(0.0, height, 0.0));
    let n4 = model.add_node(Node::new(span, height, 0.0));

    let mut bar = |a: usize, b: usize| -> Result<usize> {
        let element = BarElement::new(model.node(a)?, model.node(b)?)
            .with_material(steel)
            .with_section(section);
        Ok(model.add_element(element)?)
    };
    let _col1 = bar(n1, n3)?;
    let _col2 = bar(n2, n4)?;
    let beam = bar(n3, n4)?;

    let dead = LoadCase::dead();
    let live = LoadCase::live();
    let wind = LoadCase::wind();

    // 20 kN/m dead and 10 kN/m live on the beam (global -Y)
    model.add_element_load(beam, ElementLoad::Uniform(UniformLoad::downward(20_000.0, &dead)))?;
    model.add_element_load(beam, ElementLoad::Uniform(UniformLoad::downward(10_000.0, &live)))?;
    // 15 kN lateral at the beam level
    model.add_node_load(n3, NodalLoad::fx(15_000.0, &wind))?;

    model.add_load_combo(LoadCombination::lrfd_dead_live())?;
    model.add_load_combo(LoadCombination::asd_dead_live())?;
    model.add_load_combo(
        LoadCombination::new("1.2D + 1.0W + L")
            .with_case(&dead, 1.2)
            .with_case(&wind, 1.0)
            .with_case(&live, 1.0),
    )?;

    model
        .solve_with(AnalysisOptions::sparse().with_statics_check())
        .context("portal frame analysis failed")?;

    for case in model.solved_cases() {
        let d3 = model.node_displacement(n3, &case)?;
        println!(
            "{:<6} N3: dx = {:9.3} mm, dy = {:9.3} mm",
            case.name,
            d3.dx * 1000.0,
            d3.dy * 1000.0
        );
    }

    for combo in ["1.2D + 1.6L", "D + L", "1.2D + 1.0W + L"] {
        let mid = model.combination_exact_internal_force_at(beam, 0.0, combo)?;
        let r1 = model.combination_reaction(n1, combo)?;
        println!(
            "{:<16} beam midspan Mz = {:9.2} kN·m, N1 reaction Fy = {:9.2} kN",
            combo,
            mid.mz / 1000.0,
            r1.fy / 1000.0
        );
    }

    // Beam midspan deflection, reported in global axes
    let transform = model.element(beam)?.transform()?;
    let local = model.combination_internal_displacement_at(beam, 0.0, "D + L")?;
    let global = transform.displacement_to_global(&local);
    println!(
        "\nD + L beam midspan (nodal interpolation): dx = {:.3} mm, dy = {:.3} mm",
        global.dx * 1000.0,
        global.dy * 1000.0
    );

    let summary = model.summary(&dead)?;
    println!("\n{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn timoshenko_cantilever() -> Result<()> {
    println!("\n=== Deep Cantilever (Euler-Bernoulli vs Timoshenko) ===\n");

    let length = 2.0;
    let load = -50_000.0;
    let section = Section::rectangular(0.3, 0.6);
    let case = LoadCase::default();

    for (name, behavior) in [
        ("Euler-Bernoulli", BarBehavior::FULL_FRAME),
        ("Timoshenko", BarBehavior::TIMOSHENKO_FULL_FRAME),
    ] {
        let mut model = Model::new();
        let root = model.add_node(Node::new(0.0, 0.0, 0.0).with_constraint(Constraint::fixed()));
        let tip = model.add_node(Node::new(length, 0.0, 0.0));
        let element = BarElement::new(model.node(root)?, model.node(tip)?)
            .with_behavior(behavior)
            .with_material(Material::isotropic(30e9, 0.2))
            .with_section(section);
        model.add_element(element)?;
        model.add_node_load(tip, NodalLoad::fy(load, &case))?;

        model
            .solve_with(AnalysisOptions::dense())
            .with_context(|| format!("{} cantilever analysis failed", name))?;

        let d = model.node_displacement(tip, &case)?;
        println!("{:<16} tip dy = {:.4} mm", name, d.dy * 1000.0);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    portal_frame()?;
    timoshenko_cantilever()?;
    Ok(())
}
