use crate::assembly::{load_vector, GlobalStiffness};
use crate::config::AnalysisConfig;
use crate::element::{Element, ElementKind, ElementTrait};
use crate::error::Result;
use crate::input::{LoadCase, ModelInput};
use crate::material::MaterialCatalog;
use crate::mesh::{Mesh, NDF};
use crate::observer::Observer;
use crate::solver;
use indicatif::ProgressBar;
use nalgebra::DVector;

/// An element group after binding
#[derive(Clone, Debug)]
pub struct BoundGroup {
    pub kind: ElementKind,
    pub catalog: MaterialCatalog,
    pub elements: Vec<Element>,
}

/// Stress of one element, `(σxx, σyy, τxy)` for triangles
#[derive(Clone, Debug, PartialEq)]
pub struct ElementStress {
    pub group: usize,
    pub element: usize,
    pub stress: Vec<f64>,
}

/// Results of one load case
#[derive(Clone, Debug)]
pub struct LoadCaseResult {
    pub number: usize,

    /// Displacement of each equation; entry `eq - 1` belongs to equation `eq`
    pub displacement: DVector<f64>,

    pub stresses: Vec<ElementStress>,
}

/// A model with numbered equations and bound elements
#[derive(Clone, Debug)]
pub struct Model {
    pub heading: String,
    pub modex: usize,
    pub mesh: Mesh,
    pub load_cases: Vec<LoadCase>,
    pub groups: Vec<BoundGroup>,
}

fn progress_bar(len: usize, config: &AnalysisConfig) -> ProgressBar {
    if config.show_progress {
        ProgressBar::new(len as u64)
    } else {
        ProgressBar::hidden()
    }
}

impl Model {
    /// Numbers the equations and binds every element to its nodes and material
    pub fn new(input: ModelInput, config: &AnalysisConfig) -> Result<Self> {
        let ModelInput {
            heading,
            modex,
            mut mesh,
            load_cases,
            groups,
        } = input;

        let neq = mesh.number_equations();
        tracing::info!(nodes = mesh.nodes.len(), equations = neq, "numbered equations");

        let mut bound = Vec::with_capacity(groups.len());
        for group in groups {
            let mut elements = Vec::with_capacity(group.records.len());
            for record in &group.records {
                let element = Element::bind_kind(group.kind, record, &mesh, &group.catalog)?
                    .with_tolerance(config.geometry_tolerance());
                elements.push(element);
            }
            bound.push(BoundGroup {
                kind: group.kind,
                catalog: group.catalog,
                elements,
            });
        }
        tracing::info!(
            groups = bound.len(),
            elements = bound.iter().map(|g| g.elements.len()).sum::<usize>(),
            "bound elements"
        );

        Ok(Model {
            heading,
            modex,
            mesh,
            load_cases,
            groups: bound,
        })
    }

    pub fn n_element(&self) -> usize {
        self.groups.iter().map(|g| g.elements.len()).sum()
    }

    /// Computes every element stiffness and accumulates the global matrix
    pub fn assemble(
        &mut self,
        config: &AnalysisConfig,
        observer: &dyn Observer,
    ) -> Result<GlobalStiffness> {
        let mut global = GlobalStiffness::new(self.mesh.n_equation());
        let bar = progress_bar(self.n_element(), config);
        for group in self.groups.iter_mut() {
            for element in group.elements.iter_mut() {
                let block = element.calc_stiffness(&self.mesh, observer)?;
                global.assemble(element.location_matrix(), &block)?;
                bar.inc(1);
            }
        }
        bar.finish_and_clear();
        tracing::info!(equations = global.n_equation(), "assembled global stiffness");
        Ok(global)
    }

    /// Recovers the stress of every element from a solved displacement vector
    pub fn recover_stresses(
        &mut self,
        displacement: &[f64],
        config: &AnalysisConfig,
        observer: &dyn Observer,
    ) -> Result<Vec<ElementStress>> {
        let mut stresses = Vec::with_capacity(self.n_element());
        let bar = progress_bar(self.n_element(), config);
        for (g, group) in self.groups.iter_mut().enumerate() {
            for element in group.elements.iter_mut() {
                let stress = element.calc_stress(&self.mesh, displacement, observer)?;
                stresses.push(ElementStress {
                    group: g + 1,
                    element: element.number(),
                    stress,
                });
                bar.inc(1);
            }
        }
        bar.finish_and_clear();
        Ok(stresses)
    }

    /// Expands the equation vector into `(ux, uy, uz)` per node; constrained DOFs are 0
    pub fn node_displacements(&self, displacement: &[f64]) -> Vec<[f64; NDF]> {
        self.mesh
            .nodes
            .iter()
            .map(|node| {
                node.bcode.map(|eq| match eq {
                    0 => 0.0,
                    _ => displacement.get(eq - 1).copied().unwrap_or(0.0),
                })
            })
            .collect()
    }

    /// Runs the linear static analysis for every load case
    ///
    /// With `modex == 0` the element geometry is checked and assembled but
    /// nothing is solved.
    pub fn run(
        &mut self,
        config: &AnalysisConfig,
        observer: &dyn Observer,
    ) -> Result<Vec<LoadCaseResult>> {
        let global = self.assemble(config, observer)?;
        if self.modex == 0 {
            tracing::info!("data check only, skipping solution");
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(self.load_cases.len());
        for case in self.load_cases.clone() {
            let ff = load_vector(&self.mesh, &case)?;

            let start = std::time::Instant::now();
            let displacement = solver::solve(global.matrix(), &ff, config)?;
            let elapsed = start.elapsed().as_secs_f32();
            tracing::info!(load_case = case.number, seconds = elapsed, "solved system");

            let stresses = self.recover_stresses(displacement.as_slice(), config, observer)?;
            results.push(LoadCaseResult {
                number: case.number,
                displacement,
                stresses,
            });
        }
        Ok(results)
    }
}
