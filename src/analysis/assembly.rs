//! Global stiffness assembly and DOF classification

use nalgebra_sparse::CsrMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::elements::{BarElement, Dof, Node, DOFS_PER_NODE};
use crate::error::FEAResult;
use crate::math::SparseMatrixBuilder;

/// Relative size of a diagonal entry below which a free DOF carries no stiffness
const INACTIVE_DIAGONAL_RATIO: f64 = 1e-14;

/// Global DOFs of an element, in local matrix order
fn element_dofs(element: &BarElement) -> FEAResult<Vec<usize>> {
    Ok(element
        .node_ids()?
        .into_iter()
        .flat_map(|node| (0..DOFS_PER_NODE).map(move |i| node * DOFS_PER_NODE + i))
        .collect())
}

/// Global stiffness triplets of one element
pub fn element_triplets(element: &BarElement) -> FEAResult<Vec<(usize, usize, f64)>> {
    let k = element.global_stiffness()?;
    let dofs = element_dofs(element)?;

    let mut triplets = Vec::with_capacity(dofs.len() * dofs.len());
    for (i, &di) in dofs.iter().enumerate() {
        for (j, &dj) in dofs.iter().enumerate() {
            let value = k[(i, j)];
            if value != 0.0 {
                triplets.push((di, dj, value));
            }
        }
    }
    Ok(triplets)
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
fn all_element_triplets_sequential(
    elements: &[BarElement],
) -> FEAResult<Vec<Vec<(usize, usize, f64)>>> {
    elements.iter().map(element_triplets).collect()
}

/// Element matrices are independent, so they are computed on the rayon pool
#[cfg(feature = "parallel")]
fn all_element_triplets_parallel(
    elements: &[BarElement],
) -> FEAResult<Vec<Vec<(usize, usize, f64)>>> {
    elements.par_iter().map(element_triplets).collect()
}

/// Assemble the global stiffness matrix (CSR, duplicates summed)
pub fn assemble_stiffness(elements: &[BarElement], n_dofs: usize) -> FEAResult<CsrMatrix<f64>> {
    #[cfg(feature = "parallel")]
    let per_element = all_element_triplets_parallel(elements)?;
    #[cfg(not(feature = "parallel"))]
    let per_element = all_element_triplets_sequential(elements)?;

    let mut builder = SparseMatrixBuilder::new(n_dofs);
    for triplets in per_element {
        builder.extend(triplets);
    }

    log::debug!(
        "assembled {} elements into {} DOFs ({} triplets)",
        elements.len(),
        n_dofs,
        builder.nnz()
    );

    Ok(builder.to_csr())
}

/// Partition of the global DOFs
#[derive(Debug, Clone, Default)]
pub struct DofMap {
    pub n_dofs: usize,
    /// Free DOFs that carry stiffness, in global order
    pub free: Vec<usize>,
    /// Fixed or prescribed DOFs
    pub restrained: Vec<usize>,
    /// Free DOFs no element addresses (reported as zero displacement)
    pub inactive: Vec<usize>,
    /// Position of each global DOF in `free`
    pub free_index: Vec<Option<usize>>,
}

impl DofMap {
    /// Classify every DOF from the node constraints and the stiffness diagonal
    pub fn classify(nodes: &[Node], k: &CsrMatrix<f64>) -> Self {
        let n_dofs = nodes.len() * DOFS_PER_NODE;
        let mut diagonal = vec![0.0; n_dofs];
        for (row, col, &val) in k.triplet_iter() {
            if row == col {
                diagonal[row] += val;
            }
        }
        let max_diag = diagonal.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        let threshold = INACTIVE_DIAGONAL_RATIO * max_diag;

        let mut map = DofMap {
            n_dofs,
            free_index: vec![None; n_dofs],
            ..Default::default()
        };

        for (n, node) in nodes.iter().enumerate() {
            for dof in Dof::ALL {
                let index = dof.global_index(n);
                if node.constraint.get(dof).is_restrained() {
                    map.restrained.push(index);
                } else if diagonal[index].abs() <= threshold {
                    map.inactive.push(index);
                } else {
                    map.free_index[index] = Some(map.free.len());
                    map.free.push(index);
                }
            }
        }

        log::debug!(
            "DOF partition: {} free, {} restrained, {} inactive",
            map.free.len(),
            map.restrained.len(),
            map.inactive.len()
        );

        map
    }

    /// Node index and DOF of a global DOF index
    pub fn locate(index: usize) -> (usize, Dof) {
        let node = index / DOFS_PER_NODE;
        let dof = Dof::from_ordinal(index % DOFS_PER_NODE).unwrap_or(Dof::Dx);
        (node, dof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{BarBehavior, Constraint, Material, Section};

    fn truss_bar() -> (Vec<Node>, BarElement) {
        let mut nodes = vec![
            Node::new(0.0, 0.0, 0.0).with_constraint(Constraint::pinned()),
            Node::new(2.0, 0.0, 0.0),
        ];
        for (i, n) in nodes.iter_mut().enumerate() {
            n.id = Some(i);
        }
        let element = BarElement::new(&nodes[0], &nodes[1])
            .with_behavior(BarBehavior::TRUSS)
            .with_material(Material::new(100.0, 40.0))
            .with_section(Section::new(0.5, 1.0, 1.0, 1.0));
        (nodes, element)
    }

    #[test]
    fn test_truss_rotations_are_inactive() {
        let (nodes, element) = truss_bar();
        let k = assemble_stiffness(&[element], 12).unwrap();
        let map = DofMap::classify(&nodes, &k);

        assert_eq!(map.free, vec![6]);
        assert_eq!(map.restrained, vec![0, 1, 2]);
        assert_eq!(map.inactive.len(), 8);
        assert_eq!(map.free_index[6], Some(0));
    }

    #[test]
    fn test_shared_dofs_are_summed() {
        let (_, element) = truss_bar();
        let k = assemble_stiffness(&[element.clone(), element], 12).unwrap();
        let dense = nalgebra::DMatrix::from(&k);
        // two coincident bars: 2 * EA / L
        assert!((dense[(6, 6)] - 50.0).abs() < 1e-12);
        assert!((dense[(0, 6)] + 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_locate() {
        assert_eq!(DofMap::locate(17), (2, Dof::Rz));
    }
}
