//! Element-level properties: transformations, stiffness symmetry and
//! invariance, closed-form entries

use approx::assert_relative_eq;
use nalgebra::{DMatrix, Matrix3, Vector3};
use skeletal_fea::math::{is_symmetric, TransformManager};
use skeletal_fea::prelude::*;

fn element_between(start: [f64; 3], end: [f64; 3]) -> BarElement {
    let a = Node::new(start[0], start[1], start[2]);
    let b = Node::new(end[0], end[1], end[2]);
    BarElement::new(&a, &b)
        .with_material(Material::isotropic(210e9, 0.3))
        .with_section(Section::rectangular(0.2, 0.4))
}

/// Deterministic spread of member directions and web rotations
fn orientations() -> Vec<(Vector3<f64>, f64)> {
    let mut out = vec![
        (Vector3::new(1.0, 0.0, 0.0), 0.0),
        (Vector3::new(0.0, 1.0, 0.0), 45.0),
        (Vector3::new(0.0, 0.0, 1.0), 0.0),
        (Vector3::new(0.0, 0.0, -1.0), 90.0),
    ];
    for i in 0..24 {
        let theta = i as f64 * 0.7;
        let phi = i as f64 * 0.45 - 2.0;
        let dir = Vector3::new(phi.cos() * theta.cos(), phi.cos() * theta.sin(), phi.sin());
        out.push((dir * (1.0 + i as f64 * 0.25), i as f64 * 17.0));
    }
    out
}

fn assert_orthonormal(lambda: &Matrix3<f64>) {
    assert!(lambda.iter().all(|v| v.is_finite()));
    assert_relative_eq!(lambda * lambda.transpose(), Matrix3::identity(), epsilon = 1e-12);
    assert_relative_eq!(lambda.determinant(), 1.0, epsilon = 1e-12);
}

fn sorted_eigenvalues(k: &DMatrix<f64>) -> Vec<f64> {
    let mut values: Vec<f64> = k.clone().symmetric_eigen().eigenvalues.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

fn valid_behaviors() -> Vec<BarBehavior> {
    let flags = [
        BarBehavior::BEAM_Y_EULER_BERNOULLI,
        BarBehavior::BEAM_Y_TIMOSHENKO,
        BarBehavior::BEAM_Z_EULER_BERNOULLI,
        BarBehavior::BEAM_Z_TIMOSHENKO,
        BarBehavior::TRUSS,
        BarBehavior::SHAFT,
    ];
    (1u32..64)
        .map(|bits| {
            flags
                .iter()
                .enumerate()
                .filter(|(i, _)| bits & (1 << i) != 0)
                .fold(BarBehavior::empty(), |mask, (_, flag)| mask | *flag)
        })
        .filter(|mask| mask.validate().is_ok())
        .collect()
}

#[test]
fn test_vertical_members_use_fixed_frames() {
    let up = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 3.0), 0.0)
        .unwrap();
    let expected_up = Matrix3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0);
    assert_eq!(*up.lambda(), expected_up);

    let down = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(0.0, 0.0, -3.0), 0.0)
        .unwrap();
    let expected_down = Matrix3::new(0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
    assert_eq!(*down.lambda(), expected_down);

    // a tiny horizontal offset still counts as vertical
    let nearly = TransformManager::from_points(
        &Vector3::zeros(),
        &Vector3::new(1e-12, 0.0, 3.0),
        0.0,
    )
    .unwrap();
    assert_eq!(*nearly.lambda(), expected_up);

    for (end, web) in [([0.0, 0.0, 3.0], 30.0), ([0.0, 0.0, -2.0], -75.0)] {
        let t = TransformManager::from_points(&Vector3::zeros(), &Vector3::from(end), web).unwrap();
        assert_orthonormal(t.lambda());
        // local x follows the member
        assert_relative_eq!(t.lambda()[(0, 2)], end[2].signum(), epsilon = 1e-12);
    }
}

#[test]
fn test_direction_cosines_are_orthonormal() {
    let cases = orientations();
    assert!(cases.len() >= 20);
    for (dir, web) in cases {
        let start = Vector3::new(1.0, -2.0, 0.5);
        let t = TransformManager::from_points(&start, &(start + dir), web).unwrap();
        assert_orthonormal(t.lambda());

        let axis = dir.normalize();
        assert_relative_eq!(t.lambda().row(0).transpose(), axis, epsilon = 1e-12);
    }
}

#[test]
fn test_zero_length_member_is_rejected() {
    let p = Vector3::new(2.0, 2.0, 2.0);
    assert!(matches!(
        TransformManager::from_points(&p, &p, 0.0),
        Err(FEAError::InvalidGeometry(_))
    ));
}

#[test]
fn test_local_stiffness_symmetric_for_every_behavior() {
    let behaviors = valid_behaviors();
    // 3 x 3 x 2 x 2 minus the empty mask
    assert_eq!(behaviors.len(), 35);

    for behavior in behaviors {
        let bar = element_between([0.0, 0.0, 0.0], [3.0, 1.0, -0.5]).with_behavior(behavior);
        let k = bar.local_stiffness().unwrap();
        let scale = k.amax();
        assert!(scale > 0.0);
        assert!(is_symmetric(&k, 1e-9 * scale), "{:?} is not symmetric", behavior);

        let kg = bar.global_stiffness().unwrap();
        assert!(is_symmetric(&kg, 1e-9 * scale));
    }
}

#[test]
fn test_global_spectrum_matches_local() {
    for (i, (dir, web)) in orientations().into_iter().enumerate() {
        let mut bar = element_between([0.0, 0.0, 0.0], [dir.x, dir.y, dir.z]).with_web_rotation(web);
        if i % 3 == 0 {
            bar = bar.with_end_release(Release::pin());
        }
        if i % 4 == 0 {
            bar = bar.with_behavior(BarBehavior::TIMOSHENKO_FULL_FRAME);
        }

        let local = sorted_eigenvalues(&bar.condensed_local_stiffness().unwrap());
        let global = sorted_eigenvalues(&bar.global_stiffness().unwrap());
        let scale = local.last().copied().unwrap_or(1.0).abs();

        for (l, g) in local.iter().zip(&global) {
            assert_relative_eq!(*l, *g, epsilon = 1e-9 * scale);
        }
    }
}

#[test]
fn test_truss_stiffness_entries() {
    let bar = element_between([0.0, 0.0, 0.0], [4.0, 0.0, 0.0]).with_behavior(BarBehavior::TRUSS);
    let k = bar.local_stiffness().unwrap();
    let ea_l = 210e9 * bar.section.a / 4.0;

    assert_relative_eq!(k[(0, 0)], ea_l, max_relative = 1e-12);
    assert_relative_eq!(k[(6, 6)], ea_l, max_relative = 1e-12);
    assert_relative_eq!(k[(0, 6)], -ea_l, max_relative = 1e-12);
    assert_relative_eq!(k[(6, 0)], -ea_l, max_relative = 1e-12);
    // only the axial DOFs are addressed
    let nonzero = k.iter().filter(|v| **v != 0.0).count();
    assert_eq!(nonzero, 4);
}

#[test]
fn test_inclined_truss_global_stiffness() {
    // 3-4-5 triangle: cosines (0.6, 0.8, 0)
    let bar = element_between([0.0, 0.0, 0.0], [3.0, 4.0, 0.0]).with_behavior(BarBehavior::TRUSS);
    let k = bar.global_stiffness().unwrap();
    let ea_l = 210e9 * bar.section.a / 5.0;

    assert_relative_eq!(k[(0, 0)], ea_l * 0.36, max_relative = 1e-12);
    assert_relative_eq!(k[(0, 1)], ea_l * 0.48, max_relative = 1e-12);
    assert_relative_eq!(k[(1, 7)], -ea_l * 0.64, max_relative = 1e-12);
}

#[test]
fn test_timoshenko_requires_shear_factor() {
    let a = Node::new(0.0, 0.0, 0.0);
    let b = Node::new(2.0, 0.0, 0.0);
    let bar = BarElement::new(&a, &b)
        .with_behavior(BarBehavior::BEAM_Z_TIMOSHENKO | BarBehavior::TRUSS)
        .with_material(Material::steel())
        .with_section(Section::new(0.01, 1e-5, 1e-5, 1e-6));

    assert!(matches!(
        bar.local_stiffness(),
        Err(FEAError::UnsupportedConfiguration(_))
    ));
}

#[test]
fn test_timoshenko_stiffer_section_approaches_euler_bernoulli() {
    // very slender bar: shear deformation is negligible
    let eb = element_between([0.0, 0.0, 0.0], [200.0, 0.0, 0.0]);
    let tim = eb.clone().with_behavior(BarBehavior::TIMOSHENKO_FULL_FRAME);

    let k_eb = eb.local_stiffness().unwrap();
    let k_tim = tim.local_stiffness().unwrap();
    assert_relative_eq!(k_eb, k_tim, max_relative = 1e-4);
}

#[test]
fn test_iso_coordinates_map_onto_length() {
    let bar = element_between([1.0, 1.0, 1.0], [1.0, 5.0, 4.0]);
    assert_relative_eq!(bar.iso_to_local(-1.0).unwrap(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(bar.iso_to_local(0.0).unwrap(), 2.5, epsilon = 1e-12);
    assert_relative_eq!(bar.iso_to_local(1.0).unwrap(), 5.0, epsilon = 1e-12);
    assert_relative_eq!(bar.local_to_iso(1.25).unwrap(), -0.5, epsilon = 1e-10);
}
