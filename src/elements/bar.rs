//! Bar element - a straight member composed of independent formulations
//!
//! The element's behaviour mask selects which helpers contribute. Each helper
//! addresses a disjoint subset of the local DOFs, so the local matrices are
//! plain sums of the helper sub-matrices.

use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use std::sync::OnceLock;

use super::helpers::{BeamDirection, ElementHelper};
use super::{Dof, Material, Node, Release, Section, DOFS_PER_NODE};
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementLoad, LoadCase, LocalLoad};
use crate::math::{self, Polynomial, TransformManager};
use crate::results::{Displacement, Force};

/// Largest acceptable residual of the iso-parametric fit
const ISO_FIT_TOLERANCE: f64 = 1e-10;

/// Combinable element behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarBehavior(u8);

impl BarBehavior {
    pub const BEAM_Y_EULER_BERNOULLI: BarBehavior = BarBehavior(1);
    pub const BEAM_Y_TIMOSHENKO: BarBehavior = BarBehavior(1 << 1);
    pub const BEAM_Z_EULER_BERNOULLI: BarBehavior = BarBehavior(1 << 2);
    pub const BEAM_Z_TIMOSHENKO: BarBehavior = BarBehavior(1 << 3);
    pub const TRUSS: BarBehavior = BarBehavior(1 << 4);
    pub const SHAFT: BarBehavior = BarBehavior(1 << 5);

    /// Euler-Bernoulli bending in both planes, axial and torsion
    pub const FULL_FRAME: BarBehavior = BarBehavior(1 | 1 << 2 | 1 << 4 | 1 << 5);
    /// Timoshenko bending in both planes, axial and torsion
    pub const TIMOSHENKO_FULL_FRAME: BarBehavior = BarBehavior(1 << 1 | 1 << 3 | 1 << 4 | 1 << 5);
    /// Frame in the local x-y plane
    pub const PLANAR_FRAME_Y: BarBehavior = BarBehavior(1 | 1 << 4);

    pub const fn empty() -> Self {
        BarBehavior(0)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: BarBehavior) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Reject masks the helpers cannot combine
    pub fn validate(&self) -> FEAResult<()> {
        if self.is_empty() {
            return Err(FEAError::Configuration(
                "element behaviour mask is empty".into(),
            ));
        }
        if self.contains(Self::BEAM_Y_EULER_BERNOULLI) && self.contains(Self::BEAM_Y_TIMOSHENKO) {
            return Err(FEAError::UnsupportedConfiguration(
                "BeamY cannot be both Euler-Bernoulli and Timoshenko".into(),
            ));
        }
        if self.contains(Self::BEAM_Z_EULER_BERNOULLI) && self.contains(Self::BEAM_Z_TIMOSHENKO) {
            return Err(FEAError::UnsupportedConfiguration(
                "BeamZ cannot be both Euler-Bernoulli and Timoshenko".into(),
            ));
        }
        Ok(())
    }
}

impl BitOr for BarBehavior {
    type Output = BarBehavior;

    fn bitor(self, rhs: BarBehavior) -> BarBehavior {
        BarBehavior(self.0 | rhs.0)
    }
}

impl Default for BarBehavior {
    fn default() -> Self {
        Self::FULL_FRAME
    }
}

/// Behaviour flag to helper, in assembly order
const HELPER_TABLE: [(BarBehavior, ElementHelper); 6] = [
    (
        BarBehavior::BEAM_Y_EULER_BERNOULLI,
        ElementHelper::EulerBernoulliBeam(BeamDirection::Y),
    ),
    (
        BarBehavior::BEAM_Y_TIMOSHENKO,
        ElementHelper::TimoshenkoBeam(BeamDirection::Y),
    ),
    (
        BarBehavior::BEAM_Z_EULER_BERNOULLI,
        ElementHelper::EulerBernoulliBeam(BeamDirection::Z),
    ),
    (
        BarBehavior::BEAM_Z_TIMOSHENKO,
        ElementHelper::TimoshenkoBeam(BeamDirection::Z),
    ),
    (BarBehavior::TRUSS, ElementHelper::Truss),
    (BarBehavior::SHAFT, ElementHelper::Shaft),
];

/// Connection of a bar to one model node.
///
/// The location is a snapshot, moved only through the owning element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    id: Option<usize>,
    location: Vector3<f64>,
}

impl ElementNode {
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id(),
            location: node.location(),
        }
    }

    /// Index of the node in the model
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn location(&self) -> Vector3<f64> {
        self.location
    }
}

/// A straight bar element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarElement {
    /// Element nodes, start first
    pub(crate) nodes: Vec<ElementNode>,
    pub behavior: BarBehavior,
    pub material: Material,
    pub section: Section,
    /// Rotation of the section about the bar axis (degrees)
    pub web_rotation: f64,
    /// Release at the start node, in local coordinates
    pub start_release: Release,
    /// Release at the end node, in local coordinates
    pub end_release: Release,
    /// Loads carried by the element
    pub loads: Vec<ElementLoad>,

    #[serde(skip)]
    pub(crate) id: Option<usize>,

    #[serde(skip)]
    iso_cache: OnceLock<Polynomial>,
}

impl BarElement {
    /// Create a full-frame element between two nodes
    pub fn new(start: &Node, end: &Node) -> Self {
        Self::with_nodes(&[start, end])
    }

    /// Create an element through an ordered list of nodes
    pub fn with_nodes(nodes: &[&Node]) -> Self {
        Self {
            nodes: nodes.iter().map(|n| ElementNode::from_node(n)).collect(),
            behavior: BarBehavior::default(),
            material: Material::default(),
            section: Section::default(),
            web_rotation: 0.0,
            start_release: Release::none(),
            end_release: Release::none(),
            loads: Vec::new(),
            id: None,
            iso_cache: OnceLock::new(),
        }
    }

    pub fn with_behavior(mut self, behavior: BarBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    /// Set the web rotation in degrees
    pub fn with_web_rotation(mut self, degrees: f64) -> Self {
        self.web_rotation = degrees;
        self
    }

    pub fn with_start_release(mut self, release: Release) -> Self {
        self.start_release = release;
        self
    }

    pub fn with_end_release(mut self, release: Release) -> Self {
        self.end_release = release;
        self
    }

    pub fn with_load(mut self, load: ElementLoad) -> Self {
        self.loads.push(load);
        self
    }

    /// Index of the element in its model
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    /// Element nodes, start first
    pub fn nodes(&self) -> &[ElementNode] {
        &self.nodes
    }

    /// Model indices of the element nodes
    pub fn node_ids(&self) -> FEAResult<Vec<usize>> {
        self.nodes
            .iter()
            .map(|n| {
                n.id.ok_or_else(|| {
                    FEAError::InvalidGeometry("element references a node outside the model".into())
                })
            })
            .collect()
    }

    /// Straight-line length between the first and last node
    pub fn length(&self) -> f64 {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(a), Some(b)) => (b.location - a.location).norm(),
            _ => 0.0,
        }
    }

    /// Number of local DOFs (6 per node)
    pub fn dof_count(&self) -> usize {
        self.nodes.len() * DOFS_PER_NODE
    }

    /// Move the element node at `index` and drop everything derived from
    /// the geometry
    pub fn move_node(&mut self, index: usize, location: Vector3<f64>) -> FEAResult<()> {
        let count = self.nodes.len();
        let node = self.nodes.get_mut(index).ok_or_else(|| {
            FEAError::Configuration(format!(
                "element node index {} out of range ({} nodes)",
                index, count
            ))
        })?;
        node.location = location;
        self.iso_cache = OnceLock::new();
        Ok(())
    }

    /// Move every element node attached to model node `node_id`
    pub(crate) fn relocate_node(&mut self, node_id: usize, location: Vector3<f64>) -> bool {
        let mut moved = false;
        for node in self.nodes.iter_mut().filter(|n| n.id == Some(node_id)) {
            node.location = location;
            moved = true;
        }
        if moved {
            self.iso_cache = OnceLock::new();
        }
        moved
    }

    /// Release at an element node
    pub fn release_at(&self, node_index: usize) -> Release {
        if node_index == 0 {
            self.start_release
        } else if node_index + 1 == self.nodes.len() {
            self.end_release
        } else {
            Release::none()
        }
    }

    /// Helpers selected by the behaviour mask
    pub fn helpers(&self) -> FEAResult<Vec<ElementHelper>> {
        self.behavior.validate()?;
        Ok(HELPER_TABLE
            .iter()
            .filter(|(flag, _)| self.behavior.contains(*flag))
            .map(|(_, helper)| *helper)
            .collect())
    }

    pub fn transform(&self) -> FEAResult<TransformManager> {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(a), Some(b)) if self.nodes.len() >= 2 => {
                TransformManager::from_points(&a.location, &b.location, self.web_rotation)
            }
            _ => Err(FEAError::InvalidGeometry(format!(
                "bar element needs at least 2 nodes, has {}",
                self.nodes.len()
            ))),
        }
    }

    /// Direction cosines (rows are the local axes)
    pub fn lambda(&self) -> FEAResult<math::Mat3> {
        Ok(*self.transform()?.lambda())
    }

    /// Block-diagonal 6n x 6n transformation matrix
    pub fn transformation_matrix(&self) -> FEAResult<DMatrix<f64>> {
        Ok(self.transform()?.expand(self.nodes.len()))
    }

    // ========================
    // Iso-parametric mapping
    // ========================

    /// Iso-parametric coordinate of each node
    pub fn node_iso_coordinates(&self) -> Vec<f64> {
        let n = self.nodes.len();
        if n < 2 {
            return vec![-1.0; n];
        }
        (0..n)
            .map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64)
            .collect()
    }

    /// Polynomial mapping xi to arc length from the start node (computed once)
    pub fn iso_polynomial(&self) -> FEAResult<&Polynomial> {
        if let Some(poly) = self.iso_cache.get() {
            return Ok(poly);
        }
        let poly = self.fit_iso_polynomial()?;
        Ok(self.iso_cache.get_or_init(|| poly))
    }

    fn fit_iso_polynomial(&self) -> FEAResult<Polynomial> {
        let first = self.nodes.first().map(|n| n.location).ok_or_else(|| {
            FEAError::InvalidGeometry("bar element has no nodes".into())
        })?;
        if self.nodes.len() < 2 {
            return Err(FEAError::InvalidGeometry(
                "bar element needs at least 2 nodes".into(),
            ));
        }

        let xs = self.node_iso_coordinates();
        let ys: Vec<f64> = self
            .nodes
            .iter()
            .map(|n| (n.location - first).norm())
            .collect();

        let (poly, residual) = Polynomial::fit(&xs, &ys)?;
        if residual > ISO_FIT_TOLERANCE {
            log::warn!(
                "iso-parametric fit of element {:?} has residual {:.3e}",
                self.id,
                residual
            );
        }
        Ok(poly)
    }

    /// Distance from the start node at iso-parametric coordinate `xi`
    pub fn iso_to_local(&self, xi: f64) -> FEAResult<f64> {
        check_xi(xi)?;
        Ok(self.iso_polynomial()?.evaluate(xi))
    }

    /// Iso-parametric coordinate at distance `x` from the start node
    pub fn local_to_iso(&self, x: f64) -> FEAResult<f64> {
        let l = self.length();
        if !x.is_finite() || x < 0.0 || x > l {
            return Err(FEAError::Configuration(format!(
                "position {} lies outside the element (length {})",
                x, l
            )));
        }
        self.iso_polynomial()?
            .try_find_root(x, -1.0, 1.0)
            .ok_or_else(|| FEAError::MathError(format!("no iso coordinate for position {}", x)))
    }

    // ========================
    // Element matrices
    // ========================

    fn assemble<F>(&self, matrix: F) -> FEAResult<DMatrix<f64>>
    where
        F: Fn(&ElementHelper) -> FEAResult<DMatrix<f64>>,
    {
        let size = self.dof_count();
        let mut k = DMatrix::zeros(size, size);

        for helper in self.helpers()? {
            let sub = matrix(&helper)?;
            let order = helper.dof_order(self);
            for (i, di) in order.iter().enumerate() {
                for (j, dj) in order.iter().enumerate() {
                    k[(di.local_index(), dj.local_index())] += sub[(i, j)];
                }
            }
        }

        Ok(k)
    }

    /// Local stiffness matrix (6n x 6n), releases not applied
    pub fn local_stiffness(&self) -> FEAResult<DMatrix<f64>> {
        self.assemble(|h| h.local_stiffness(self))
    }

    pub fn local_mass(&self) -> FEAResult<DMatrix<f64>> {
        self.assemble(|h| h.local_mass(self))
    }

    pub fn local_damping(&self) -> FEAResult<DMatrix<f64>> {
        self.assemble(|h| h.local_damping(self))
    }

    /// Local DOFs disconnected by releases.
    ///
    /// Released DOFs that carry no stiffness (e.g. torsion release on an
    /// element without a shaft helper) are ignored.
    pub fn released_dofs(&self, k_local: &DMatrix<f64>) -> Vec<usize> {
        let mut released = Vec::new();
        for node_index in 0..self.nodes.len() {
            let release = self.release_at(node_index);
            for dof in Dof::ALL {
                let idx = node_index * DOFS_PER_NODE + dof.ordinal();
                if release.is_released(dof) && k_local[(idx, idx)] != 0.0 {
                    released.push(idx);
                }
            }
        }
        released
    }

    /// Local stiffness with releases statically condensed
    pub fn condensed_local_stiffness(&self) -> FEAResult<DMatrix<f64>> {
        let k = self.local_stiffness()?;
        let released = self.released_dofs(&k);
        math::condense_stiffness(&k, &released)
    }

    /// Global stiffness matrix (release-condensed)
    pub fn global_stiffness(&self) -> FEAResult<DMatrix<f64>> {
        let k = self.condensed_local_stiffness()?;
        Ok(self.transform()?.local_to_global_matrix(&k))
    }

    pub fn global_mass(&self) -> FEAResult<DMatrix<f64>> {
        let m = self.local_mass()?;
        Ok(self.transform()?.local_to_global_matrix(&m))
    }

    pub fn global_damping(&self) -> FEAResult<DMatrix<f64>> {
        let c = self.local_damping()?;
        Ok(self.transform()?.local_to_global_matrix(&c))
    }

    // ========================
    // Loads
    // ========================

    /// Add a load to the element
    pub fn add_load(&mut self, load: ElementLoad) -> FEAResult<()> {
        load.validate()?;
        self.loads.push(load);
        Ok(())
    }

    /// Loads of one case, resolved into the local frame
    fn local_loads(&self, case: &LoadCase, t: &TransformManager) -> FEAResult<Vec<LocalLoad>> {
        self.loads
            .iter()
            .filter(|l| l.case() == case)
            .map(|l| l.to_local(t.lambda()))
            .collect()
    }

    /// Sum of helper equivalent loads as a 6n local vector (no condensation)
    fn equivalent_vector(&self, loads: &[LocalLoad]) -> FEAResult<DVector<f64>> {
        let mut f = DVector::zeros(self.dof_count());
        for helper in self.helpers()? {
            let order = helper.dof_order(self);
            for load in loads {
                let sub = helper.equivalent_loads(self, load)?;
                for (value, edof) in sub.iter().zip(&order) {
                    f[edof.local_index()] += value;
                }
            }
        }
        Ok(f)
    }

    fn to_node_forces(&self, f: &DVector<f64>) -> Vec<Force> {
        (0..self.nodes.len())
            .map(|n| {
                let mut arr = [0.0; 6];
                for (i, value) in arr.iter_mut().enumerate() {
                    *value = f[n * DOFS_PER_NODE + i];
                }
                Force::from_array(arr)
            })
            .collect()
    }

    /// Equivalent nodal loads of one load, per node in local coordinates
    /// (releases not applied)
    pub fn local_equivalent_nodal_loads(&self, load: &ElementLoad) -> FEAResult<Vec<Force>> {
        let t = self.transform()?;
        let f = self.equivalent_vector(&[load.to_local(t.lambda())?])?;
        Ok(self.to_node_forces(&f))
    }

    fn condensed_global_loads(&self, loads: &[LocalLoad], t: &TransformManager) -> FEAResult<Vec<Force>> {
        let f = self.equivalent_vector(loads)?;
        let k = self.local_stiffness()?;
        let f = math::condense_loads(&k, &f, &self.released_dofs(&k))?;
        Ok(self
            .to_node_forces(&f)
            .iter()
            .map(|force| t.force_to_global(force))
            .collect())
    }

    /// Equivalent nodal loads of one load, per node in global coordinates
    /// with releases condensed
    pub fn global_equivalent_nodal_loads(&self, load: &ElementLoad) -> FEAResult<Vec<Force>> {
        let t = self.transform()?;
        self.condensed_global_loads(&[load.to_local(t.lambda())?], &t)
    }

    /// Equivalent nodal loads of every load of a case, global coordinates
    pub fn case_equivalent_nodal_loads(&self, case: &LoadCase) -> FEAResult<Vec<Force>> {
        let t = self.transform()?;
        let loads = self.local_loads(case, &t)?;
        if loads.is_empty() {
            return Ok(vec![Force::default(); self.nodes.len()]);
        }
        self.condensed_global_loads(&loads, &t)
    }

    /// Load cases with at least one load on this element
    pub fn load_cases(&self) -> Vec<LoadCase> {
        let mut cases: Vec<LoadCase> = Vec::new();
        for load in &self.loads {
            if !cases.contains(load.case()) {
                cases.push(load.case().clone());
            }
        }
        cases
    }

    // ========================
    // Results
    // ========================

    /// Full local displacement vector for a case, including the element-side
    /// values of released DOFs
    pub fn local_displacements(
        &self,
        nodal_displacements: &[Displacement],
        case: &LoadCase,
    ) -> FEAResult<DVector<f64>> {
        if nodal_displacements.len() != self.nodes.len() {
            return Err(FEAError::Configuration(format!(
                "expected {} nodal displacements, got {}",
                self.nodes.len(),
                nodal_displacements.len()
            )));
        }

        let t = self.transform()?;
        let mut d = DVector::zeros(self.dof_count());
        for (n, disp) in nodal_displacements.iter().enumerate() {
            let local = t.displacement_to_local(disp).as_array();
            for (i, value) in local.iter().enumerate() {
                d[n * DOFS_PER_NODE + i] = *value;
            }
        }

        let k = self.local_stiffness()?;
        let released = self.released_dofs(&k);
        if released.is_empty() {
            return Ok(d);
        }
        let f = self.equivalent_vector(&self.local_loads(case, &t)?)?;
        math::recover_released(&k, &d, &f, &released)
    }

    /// Forces exerted on the element by its nodes, local coordinates
    pub fn end_forces(
        &self,
        nodal_displacements: &[Displacement],
        case: &LoadCase,
    ) -> FEAResult<Vec<Force>> {
        let t = self.transform()?;
        let d = self.local_displacements(nodal_displacements, case)?;
        let k = self.local_stiffness()?;
        let f = self.equivalent_vector(&self.local_loads(case, &t)?)?;
        Ok(self.to_node_forces(&(k * d - f)))
    }

    /// Internal force at `xi` from the element displacements only.
    ///
    /// Loads between the nodes are not added; see `exact_internal_force_at`.
    pub fn internal_force_at(
        &self,
        xi: f64,
        nodal_displacements: &[Displacement],
        case: &LoadCase,
    ) -> FEAResult<Force> {
        check_xi(xi)?;
        let d = self.local_displacements(nodal_displacements, case)?;

        let mut force = Force::default();
        for helper in self.helpers()? {
            for (dof, value) in helper.internal_force_at(self, &d, xi)? {
                force.add_component(dof, value);
            }
        }
        Ok(force)
    }

    /// Local displacement at `xi` interpolated from the nodal displacements
    pub fn internal_displacement_at(
        &self,
        xi: f64,
        nodal_displacements: &[Displacement],
        case: &LoadCase,
    ) -> FEAResult<Displacement> {
        check_xi(xi)?;
        let d = self.local_displacements(nodal_displacements, case)?;

        let mut displacement = Displacement::default();
        for helper in self.helpers()? {
            for (dof, value) in helper.local_displacement_at(self, &d, xi)? {
                displacement.add_component(dof, value);
            }
        }
        Ok(displacement)
    }

    /// Points where the internal force of a case may jump
    pub fn discretization_points(&self, case: &LoadCase) -> Vec<f64> {
        let mut points = self.node_iso_coordinates();
        points.extend(
            self.loads
                .iter()
                .filter(|l| l.case() == case)
                .filter_map(|l| l.xi()),
        );
        points
    }

    /// Internal force at `xi` including the effect of the element loads
    pub fn exact_internal_force_at(
        &self,
        xi: f64,
        nodal_displacements: &[Displacement],
        case: &LoadCase,
    ) -> FEAResult<Force> {
        check_xi(xi)?;
        if self.discretization_points(case).contains(&xi) {
            return Err(FEAError::DiscontinuityQuery { xi });
        }

        let mut force = self.internal_force_at(xi, nodal_displacements, case)?;

        let t = self.transform()?;
        let loads = self.local_loads(case, &t)?;
        for helper in self.helpers()? {
            for load in &loads {
                for (dof, value) in helper.load_internal_force_at(self, load, xi)? {
                    force.add_component(dof, value);
                }
            }
        }
        Ok(force)
    }
}

fn check_xi(xi: f64) -> FEAResult<()> {
    if xi.is_finite() && (-1.0..=1.0).contains(&xi) {
        Ok(())
    } else {
        Err(FEAError::Configuration(format!(
            "iso-parametric coordinate {} is outside [-1, 1]",
            xi
        )))
    }
}
