//! Model - main structural model container

use std::collections::HashMap;

use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::analysis::{assemble_stiffness, AnalysisOptions, CaseSolution, DofMap, LinearSystem};
use crate::elements::{BarElement, Constraint, Dof, DofConstraint, Node, DOFS_PER_NODE};
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementLoad, LoadCase, LoadCombination, NodalLoad};
use crate::results::{AnalysisSummary, Displacement, Force};

/// Relative tolerance of the optional equilibrium check
const STATICS_TOLERANCE: f64 = 1e-6;

/// DOF counts of the last solve
#[derive(Debug, Clone, Default)]
struct SolutionInfo {
    cases: Vec<LoadCase>,
    free_dofs: usize,
    restrained_dofs: usize,
}

/// A skeletal structure: nodes, bar elements, loads and results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    /// Nodes in insertion order; a node's index is its id
    nodes: Vec<Node>,
    /// Bar elements in insertion order
    elements: Vec<BarElement>,
    /// Node loads by node id
    pub node_loads: HashMap<usize, Vec<NodalLoad>>,
    /// Explicitly registered load cases
    pub load_cases: Vec<LoadCase>,
    /// Load combinations by name
    pub load_combos: HashMap<String, LoadCombination>,

    #[serde(skip)]
    solution: Option<SolutionInfo>,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node and return its id
    pub fn add_node(&mut self, mut node: Node) -> usize {
        let id = self.nodes.len();
        node.id = Some(id);
        node.clear_results();
        self.nodes.push(node);
        self.invalidate();
        id
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Elements in insertion order
    pub fn elements(&self) -> &[BarElement] {
        &self.elements
    }

    pub fn node(&self, id: usize) -> FEAResult<&Node> {
        self.nodes.get(id).ok_or(FEAError::NodeNotFound(id))
    }

    pub fn element(&self, id: usize) -> FEAResult<&BarElement> {
        self.elements.get(id).ok_or(FEAError::ElementNotFound(id))
    }

    /// Move a node. Element geometry caches and results are dropped.
    pub fn set_node_location(&mut self, id: usize, x: f64, y: f64, z: f64) -> FEAResult<()> {
        let node = self.nodes.get_mut(id).ok_or(FEAError::NodeNotFound(id))?;
        node.x = x;
        node.y = y;
        node.z = z;

        let location = Vector3::new(x, y, z);
        for element in &mut self.elements {
            element.relocate_node(id, location);
        }
        self.invalidate();
        Ok(())
    }

    /// Replace the boundary conditions of a node
    pub fn set_constraint(&mut self, id: usize, constraint: Constraint) -> FEAResult<()> {
        let node = self.nodes.get_mut(id).ok_or(FEAError::NodeNotFound(id))?;
        node.constraint = constraint;
        self.invalidate();
        Ok(())
    }

    /// Prescribe a displacement at a node for one load case
    pub fn set_settlement(
        &mut self,
        id: usize,
        case: &LoadCase,
        settlement: Displacement,
    ) -> FEAResult<()> {
        let node = self.nodes.get_mut(id).ok_or(FEAError::NodeNotFound(id))?;
        node.settlements.insert(case.name.clone(), settlement);
        self.invalidate();
        Ok(())
    }

    /// Add a bar element and return its id.
    ///
    /// The element's node snapshots are refreshed from the model.
    pub fn add_element(&mut self, mut element: BarElement) -> FEAResult<usize> {
        element.behavior.validate()?;
        if element.nodes.len() < 2 {
            return Err(FEAError::InvalidGeometry(format!(
                "bar element needs at least 2 nodes, has {}",
                element.nodes.len()
            )));
        }

        let ids = element.node_ids()?;
        for (slot, node_id) in ids.iter().enumerate() {
            let location = self.node(*node_id)?.location();
            element.move_node(slot, location)?;
        }
        for load in &element.loads {
            load.validate()?;
        }
        // geometry must produce a valid frame
        element.transform()?;

        let id = self.elements.len();
        element.id = Some(id);
        self.elements.push(element);
        self.invalidate();
        Ok(id)
    }

    /// Add a load to a node
    pub fn add_node_load(&mut self, node_id: usize, load: NodalLoad) -> FEAResult<()> {
        self.node(node_id)?;
        self.node_loads.entry(node_id).or_default().push(load);
        self.invalidate();
        Ok(())
    }

    /// Add a load to an element
    pub fn add_element_load(&mut self, element_id: usize, load: ElementLoad) -> FEAResult<()> {
        let element = self
            .elements
            .get_mut(element_id)
            .ok_or(FEAError::ElementNotFound(element_id))?;
        element.add_load(load)?;
        self.invalidate();
        Ok(())
    }

    /// Register a load case (cases referenced by loads are found automatically)
    pub fn add_load_case(&mut self, case: LoadCase) -> FEAResult<()> {
        if self.load_cases.iter().any(|c| c.name == case.name) {
            return Err(FEAError::DuplicateName(case.name));
        }
        self.load_cases.push(case);
        Ok(())
    }

    /// Add a load combination
    pub fn add_load_combo(&mut self, combo: LoadCombination) -> FEAResult<()> {
        if self.load_combos.contains_key(&combo.name) {
            return Err(FEAError::DuplicateName(combo.name));
        }
        self.load_combos.insert(combo.name.clone(), combo);
        Ok(())
    }

    /// Every load case known to the model, in first-reference order
    pub fn all_load_cases(&self) -> Vec<LoadCase> {
        let mut cases: Vec<LoadCase> = Vec::new();
        let mut push = |case: &LoadCase| {
            if !cases.contains(case) {
                cases.push(case.clone());
            }
        };

        self.load_cases.iter().for_each(&mut push);

        let mut node_ids: Vec<&usize> = self.node_loads.keys().collect();
        node_ids.sort();
        for id in node_ids {
            self.node_loads[id].iter().for_each(|l| push(&l.case));
        }
        for element in &self.elements {
            element.loads.iter().for_each(|l| push(l.case()));
        }

        let mut combo_names: Vec<&String> = self.load_combos.keys().collect();
        combo_names.sort();
        for name in combo_names {
            self.load_combos[name].factors.iter().for_each(|(c, _)| push(c));
        }

        if cases.is_empty() {
            cases.push(LoadCase::default());
        }
        cases
    }

    fn invalidate(&mut self) {
        if self.solution.take().is_some() {
            for node in &mut self.nodes {
                node.clear_results();
            }
        }
    }

    // ========================
    // Analysis
    // ========================

    /// Run a linear static analysis of every load case
    pub fn solve(&mut self) -> FEAResult<()> {
        self.solve_with(AnalysisOptions::default())
    }

    /// Run a linear static analysis with custom options
    pub fn solve_with(&mut self, options: AnalysisOptions) -> FEAResult<()> {
        self.invalidate();

        let n_dofs = self.nodes.len() * DOFS_PER_NODE;
        let k = assemble_stiffness(&self.elements, n_dofs)?;
        let dofs = DofMap::classify(&self.nodes, &k);
        let system = LinearSystem::new(k, dofs, options.solver, options.singularity_tolerance)?;

        let cases = options.cases.clone().unwrap_or_else(|| self.all_load_cases());

        #[cfg(feature = "parallel")]
        let solutions: Vec<CaseSolution> = cases
            .par_iter()
            .map(|case| self.solve_case(&system, case, options.check_statics))
            .collect::<FEAResult<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let solutions: Vec<CaseSolution> = cases
            .iter()
            .map(|case| self.solve_case(&system, case, options.check_statics))
            .collect::<FEAResult<_>>()?;

        for (case, solution) in cases.iter().zip(&solutions) {
            for (n, node) in self.nodes.iter_mut().enumerate() {
                let slice = |v: &DVector<f64>| {
                    let mut arr = [0.0; 6];
                    for (i, value) in arr.iter_mut().enumerate() {
                        *value = v[n * DOFS_PER_NODE + i];
                    }
                    arr
                };
                node.displacements
                    .insert(case.clone(), Displacement::from_array(slice(&solution.displacements)));
                node.reactions
                    .insert(case.clone(), Force::from_array(slice(&solution.reactions)));
            }
        }

        self.solution = Some(SolutionInfo {
            cases,
            free_dofs: system.dofs.free.len(),
            restrained_dofs: system.dofs.restrained.len(),
        });
        Ok(())
    }

    fn solve_case(
        &self,
        system: &LinearSystem,
        case: &LoadCase,
        check_statics: bool,
    ) -> FEAResult<CaseSolution> {
        let loads = self.load_vector(case)?;
        let prescribed = self.prescribed_vector(case);
        let solution = system.solve_case(&loads, &prescribed)?;

        if check_statics {
            self.check_statics(case, &loads, &solution.reactions);
        }

        log::info!(
            "solved load case '{}': max |u| = {:.4e}",
            case.name,
            solution.displacements.amax()
        );
        Ok(solution)
    }

    /// Global load vector of a case: node loads plus element equivalent loads
    pub fn load_vector(&self, case: &LoadCase) -> FEAResult<DVector<f64>> {
        let mut f = DVector::zeros(self.nodes.len() * DOFS_PER_NODE);

        for (&node_id, loads) in &self.node_loads {
            for load in loads.iter().filter(|l| &l.case == case) {
                for (i, value) in load.force.as_array().iter().enumerate() {
                    f[node_id * DOFS_PER_NODE + i] += value;
                }
            }
        }

        for element in &self.elements {
            if !element.loads.iter().any(|l| l.case() == case) {
                continue;
            }
            let forces = element.case_equivalent_nodal_loads(case)?;
            for (node_id, force) in element.node_ids()?.iter().zip(&forces) {
                for (i, value) in force.as_array().iter().enumerate() {
                    f[node_id * DOFS_PER_NODE + i] += value;
                }
            }
        }

        Ok(f)
    }

    /// Prescribed displacements of a case (zero for fixed DOFs)
    fn prescribed_vector(&self, case: &LoadCase) -> DVector<f64> {
        let mut u = DVector::zeros(self.nodes.len() * DOFS_PER_NODE);
        for (n, node) in self.nodes.iter().enumerate() {
            for dof in Dof::ALL {
                u[dof.global_index(n)] = node.prescribed_value(dof, case);
            }

            if let Some(settlement) = node.settlements.get(&case.name) {
                for dof in Dof::ALL {
                    if node.constraint.get(dof) == DofConstraint::Free && settlement.get(dof) != 0.0 {
                        log::warn!(
                            "settlement {:?} = {} at free node {} ignored in case '{}'",
                            dof,
                            settlement.get(dof),
                            n,
                            case.name
                        );
                    }
                }
            }
        }
        u
    }

    /// Check that loads and reactions balance (forces and moments about the origin)
    fn check_statics(&self, case: &LoadCase, loads: &DVector<f64>, reactions: &DVector<f64>) {
        let mut sum_force = Vector3::zeros();
        let mut sum_moment = Vector3::zeros();
        let mut lever = 1.0_f64;

        for (n, node) in self.nodes.iter().enumerate() {
            let base = n * DOFS_PER_NODE;
            let total = |i: usize| loads[base + i] + reactions[base + i];
            let f = Vector3::new(total(0), total(1), total(2));
            let m = Vector3::new(total(3), total(4), total(5));
            let p = node.location();

            sum_force += f;
            sum_moment += p.cross(&f) + m;
            lever = lever.max(p.norm());
        }

        let scale = loads.amax().max(reactions.amax()).max(1.0);
        if sum_force.norm() > STATICS_TOLERANCE * scale
            || sum_moment.norm() > STATICS_TOLERANCE * scale * lever
        {
            log::warn!(
                "statics check failed for case '{}': residual force {:.3e}, moment {:.3e}",
                case.name,
                sum_force.norm(),
                sum_moment.norm()
            );
        }
    }

    // ========================
    // Result Access Methods
    // ========================

    /// Check if the model has been analyzed
    pub fn is_analyzed(&self) -> bool {
        self.solution.is_some()
    }

    /// Load cases solved by the last analysis
    pub fn solved_cases(&self) -> Vec<LoadCase> {
        self.solution
            .as_ref()
            .map(|s| s.cases.clone())
            .unwrap_or_default()
    }

    /// Node displacement for a load case
    pub fn node_displacement(&self, id: usize, case: &LoadCase) -> FEAResult<Displacement> {
        self.node(id)?.displacement(case).ok_or(FEAError::NotAnalyzed)
    }

    /// Support reaction for a load case (zero at free DOFs)
    pub fn node_reaction(&self, id: usize, case: &LoadCase) -> FEAResult<Force> {
        self.node(id)?.reaction(case).ok_or(FEAError::NotAnalyzed)
    }

    fn element_displacements(&self, element: &BarElement, case: &LoadCase) -> FEAResult<Vec<Displacement>> {
        element
            .node_ids()?
            .into_iter()
            .map(|id| self.node_displacement(id, case))
            .collect()
    }

    /// Local end forces of an element (forces the nodes exert on it)
    pub fn element_end_forces(&self, element_id: usize, case: &LoadCase) -> FEAResult<Vec<Force>> {
        let element = self.element(element_id)?;
        let disps = self.element_displacements(element, case)?;
        element.end_forces(&disps, case)
    }

    /// Internal force at `xi` from the nodal displacements only
    pub fn internal_force_at(&self, element_id: usize, xi: f64, case: &LoadCase) -> FEAResult<Force> {
        let element = self.element(element_id)?;
        let disps = self.element_displacements(element, case)?;
        element.internal_force_at(xi, &disps, case)
    }

    /// Internal force at `xi` including loads between the nodes
    pub fn exact_internal_force_at(
        &self,
        element_id: usize,
        xi: f64,
        case: &LoadCase,
    ) -> FEAResult<Force> {
        let element = self.element(element_id)?;
        let disps = self.element_displacements(element, case)?;
        element.exact_internal_force_at(xi, &disps, case)
    }

    /// Local displacement at `xi` interpolated from the nodal results
    pub fn internal_displacement_at(
        &self,
        element_id: usize,
        xi: f64,
        case: &LoadCase,
    ) -> FEAResult<Displacement> {
        let element = self.element(element_id)?;
        let disps = self.element_displacements(element, case)?;
        element.internal_displacement_at(xi, &disps, case)
    }

    fn combination(&self, name: &str) -> FEAResult<&LoadCombination> {
        self.load_combos
            .get(name)
            .ok_or_else(|| FEAError::LoadCombinationNotFound(name.to_string()))
    }

    /// Sum `factor * result` over the cases of a combination
    fn superpose<T, F>(&self, combo: &str, result: F) -> FEAResult<T>
    where
        T: Default + std::ops::Add<Output = T> + std::ops::Mul<f64, Output = T>,
        F: Fn(&LoadCase) -> FEAResult<T>,
    {
        let combo = self.combination(combo)?;
        let mut total = T::default();
        for (case, factor) in &combo.factors {
            total = total + result(case)? * *factor;
        }
        Ok(total)
    }

    pub fn combination_displacement(&self, id: usize, combo: &str) -> FEAResult<Displacement> {
        self.superpose(combo, |case| self.node_displacement(id, case))
    }

    pub fn combination_reaction(&self, id: usize, combo: &str) -> FEAResult<Force> {
        self.superpose(combo, |case| self.node_reaction(id, case))
    }

    pub fn combination_internal_force_at(
        &self,
        element_id: usize,
        xi: f64,
        combo: &str,
    ) -> FEAResult<Force> {
        self.superpose(combo, |case| self.internal_force_at(element_id, xi, case))
    }

    pub fn combination_exact_internal_force_at(
        &self,
        element_id: usize,
        xi: f64,
        combo: &str,
    ) -> FEAResult<Force> {
        self.superpose(combo, |case| self.exact_internal_force_at(element_id, xi, case))
    }

    pub fn combination_internal_displacement_at(
        &self,
        element_id: usize,
        xi: f64,
        combo: &str,
    ) -> FEAResult<Displacement> {
        self.superpose(combo, |case| self.internal_displacement_at(element_id, xi, case))
    }

    /// Get analysis summary for a load case
    pub fn summary(&self, case: &LoadCase) -> FEAResult<AnalysisSummary> {
        let info = self.solution.as_ref().ok_or(FEAError::NotAnalyzed)?;
        if !info.cases.contains(case) {
            return Err(FEAError::LoadCaseNotFound(case.name.clone()));
        }

        let mut summary = AnalysisSummary {
            load_case: case.name.clone(),
            num_nodes: self.nodes.len(),
            num_elements: self.elements.len(),
            total_dofs: self.nodes.len() * DOFS_PER_NODE,
            free_dofs: info.free_dofs,
            restrained_dofs: info.restrained_dofs,
            ..Default::default()
        };

        for (id, node) in self.nodes.iter().enumerate() {
            if let Some(disp) = node.displacement(case) {
                let mag = disp.translation_magnitude();
                if mag > summary.max_displacement {
                    summary.max_displacement = mag;
                    summary.max_disp_node = Some(id);
                }
            }

            if let Some(rxn) = node.reaction(case) {
                let mag = rxn.force_magnitude();
                if mag > summary.max_reaction {
                    summary.max_reaction = mag;
                    summary.max_reaction_node = Some(id);
                }
                summary.total_reaction[0] += rxn.fx;
                summary.total_reaction[1] += rxn.fy;
                summary.total_reaction[2] += rxn.fz;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Material, Section};
    use crate::loads::LoadDirection;
    use approx::assert_relative_eq;

    fn cantilever(length: f64) -> (Model, usize) {
        let mut model = Model::new();
        let n1 = model.add_node(Node::new(0.0, 0.0, 0.0).with_constraint(Constraint::fixed()));
        let n2 = model.add_node(Node::new(length, 0.0, 0.0));
        let element = BarElement::new(model.node(n1).unwrap(), model.node(n2).unwrap())
            .with_material(Material::steel())
            .with_section(Section::rectangular(0.3, 0.5));
        model.add_element(element).unwrap();
        (model, n2)
    }

    #[test]
    fn test_simple_cantilever() {
        let (mut model, tip) = cantilever(10.0);
        let case = LoadCase::new("Case 1");
        model.add_node_load(tip, NodalLoad::fy(-10000.0, &case)).unwrap();

        model.solve().unwrap();

        let disp = model.node_displacement(tip, &case).unwrap();
        assert!(disp.dy < 0.0, "Expected negative Y displacement");

        let rxn = model.node_reaction(0, &case).unwrap();
        assert_relative_eq!(rxn.fy, 10000.0, epsilon = 1e-4);
        assert_relative_eq!(rxn.mz, 100000.0, epsilon = 1e-3);
    }

    #[test]
    fn test_results_cleared_on_edit() {
        let (mut model, tip) = cantilever(4.0);
        let case = LoadCase::default();
        model.add_node_load(tip, NodalLoad::fz(-1.0, &case)).unwrap();
        model.solve().unwrap();
        assert!(model.is_analyzed());

        model.set_node_location(tip, 5.0, 0.0, 0.0).unwrap();
        assert!(!model.is_analyzed());
        assert!(matches!(
            model.node_displacement(tip, &case),
            Err(FEAError::NotAnalyzed)
        ));
    }

    #[test]
    fn test_geometry_only_changes_through_the_model() {
        let (mut model, tip) = cantilever(2.0);
        let case = LoadCase::default();
        model.add_node_load(tip, NodalLoad::fy(-1_000.0, &case)).unwrap();
        model.solve().unwrap();
        let short = model.node_displacement(tip, &case).unwrap().dy;

        model.set_node_location(tip, 4.0, 0.0, 0.0).unwrap();
        assert_eq!(model.nodes()[tip].x, 4.0);
        assert_relative_eq!(model.elements()[0].nodes()[1].location().x, 4.0);
        assert_relative_eq!(model.elements()[0].iso_to_local(1.0).unwrap(), 4.0, epsilon = 1e-12);

        model.solve().unwrap();
        let long = model.node_displacement(tip, &case).unwrap().dy;
        assert_relative_eq!(long / short, 8.0, max_relative = 1e-9);
    }

    #[test]
    fn test_stale_element_snapshot_is_refreshed_on_insert() {
        let mut model = Model::new();
        let n1 = model.add_node(Node::new(0.0, 0.0, 0.0));
        let n2 = model.add_node(Node::new(3.0, 0.0, 0.0));
        let mut element = BarElement::new(model.node(n1).unwrap(), model.node(n2).unwrap());
        element.move_node(1, Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(element.iso_to_local(1.0).unwrap(), 1.0, epsilon = 1e-12);

        let id = model.add_element(element).unwrap();
        assert_relative_eq!(model.element(id).unwrap().length(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(model.element(id).unwrap().iso_to_local(1.0).unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_ids() {
        let (mut model, _) = cantilever(1.0);
        assert!(matches!(model.node(9), Err(FEAError::NodeNotFound(9))));
        assert!(matches!(
            model.add_element_load(
                3,
                ElementLoad::uniform(1.0, LoadDirection::Fy, &LoadCase::default())
            ),
            Err(FEAError::ElementNotFound(3))
        ));
        assert!(matches!(
            model.combination_displacement(1, "missing"),
            Err(FEAError::LoadCombinationNotFound(_))
        ));
    }
}
