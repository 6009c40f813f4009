use crate::error::{Error, Result};
use crate::input::LoadCase;
use crate::mesh::Mesh;
use crate::packed::PackedSymmetric;
use nalgebra::{DMatrix, DVector};

/// Accumulates packed element blocks into the global stiffness matrix
///
/// Equation numbers are 1-based; row/column `eq - 1` of the matrix holds
/// equation `eq`. Local DOFs with equation 0 are skipped.
pub struct GlobalStiffness {
    kk: DMatrix<f64>,
}

impl GlobalStiffness {
    /// Allocates a zeroed `n_equation x n_equation` matrix
    pub fn new(n_equation: usize) -> Self {
        GlobalStiffness {
            kk: DMatrix::zeros(n_equation, n_equation),
        }
    }

    /// Scatter-adds one element block
    ///
    /// # Arguments
    /// * `location` - The element location matrix (local DOF → equation, 0 = constrained)
    /// * `block` - The packed element stiffness, of dimension `location.len()`
    pub fn assemble(&mut self, location: &[usize], block: &PackedSymmetric) -> Result<()> {
        if block.dim() != location.len() {
            return Err(Error::Solver(format!(
                "stiffness block of dimension {} does not match {} location entries",
                block.dim(),
                location.len()
            )));
        }
        let neq = self.kk.nrows();
        if let Some(eq) = location.iter().find(|&&eq| eq > neq) {
            return Err(Error::Solver(format!(
                "equation {eq} is beyond the {neq} global equations"
            )));
        }

        for (j, &col) in location.iter().enumerate() {
            if col == 0 {
                continue;
            }
            for (i, &row) in location.iter().enumerate() {
                if row == 0 {
                    continue;
                }
                self.kk[(row - 1, col - 1)] += block.get(i, j);
            }
        }
        Ok(())
    }

    pub fn n_equation(&self) -> usize {
        self.kk.nrows()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.kk
    }
}

/// Builds the global load vector of one load case
///
/// Loads on constrained DOFs have no equation and are dropped.
pub fn load_vector(mesh: &Mesh, case: &LoadCase) -> Result<DVector<f64>> {
    let mut ff = DVector::zeros(mesh.n_equation());
    for load in &case.loads {
        let node = mesh
            .nodes
            .get(load.node.wrapping_sub(1))
            .ok_or_else(|| Error::Input(format!("load on missing node {}", load.node)))?;
        let eq = *node
            .bcode
            .get(load.dof.wrapping_sub(1))
            .ok_or_else(|| Error::Input(format!("load direction {} is invalid", load.dof)))?;
        if eq == 0 {
            tracing::debug!(node = load.node, dof = load.dof, "load on a constrained DOF ignored");
            continue;
        }
        ff[eq - 1] += load.value;
    }
    Ok(ff)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
