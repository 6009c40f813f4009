//! Element contract and the closed set of element variants

use crate::error::{Error, Result};
use crate::input::parse_field;
use crate::material::MaterialCatalog;
use crate::mesh::Mesh;
use crate::observer::Observer;
use crate::packed::{packed_len, PackedSymmetric};

mod tri3;
pub use tri3::*;

/// Element type codes as they appear in the input file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Bar,
    Tri3,
}

impl ElementKind {
    /// Converts an input type code
    pub fn from_code(code: usize) -> Result<Self> {
        match code {
            1 => Ok(ElementKind::Bar),
            3 => Ok(ElementKind::Tri3),
            _ => Err(Error::Input(format!("unknown element type code {code}"))),
        }
    }

    pub fn code(&self) -> usize {
        match self {
            ElementKind::Bar => 1,
            ElementKind::Tri3 => 3,
        }
    }

    pub fn n_node(&self) -> usize {
        match self {
            ElementKind::Bar => 2,
            ElementKind::Tri3 => 3,
        }
    }

    /// Finds the element kind with `n_node` nodes
    pub fn from_node_count(n_node: usize) -> Option<Self> {
        [ElementKind::Bar, ElementKind::Tri3]
            .into_iter()
            .find(|kind| kind.n_node() == n_node)
    }
}

/// An element line as read from the input: `N n1 ... nk mset`
///
/// Node numbers and the material set are kept signed and unchecked;
/// validating them is the job of [ElementTrait::bind].
#[derive(Clone, Debug, PartialEq)]
pub struct ElementRecord {
    pub number: usize,
    pub nodes: Vec<i64>,
    pub material_set: i64,
}

impl ElementRecord {
    /// Reads an element line with `n_node` node numbers
    pub fn read(line: &str, n_node: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let number: usize = match fields.first() {
            Some(field) => parse_field(field, "element number")?,
            None => return Err(Error::Input("empty element line".to_owned())),
        };
        if fields.len() < n_node + 2 {
            return Err(Error::InvalidTopology(format!(
                "element {number}: expected {n_node} node numbers and a material set"
            )));
        }
        let mut nodes = Vec::with_capacity(n_node);
        for field in &fields[1..=n_node] {
            let node: i64 = field.parse().map_err(|_| {
                Error::InvalidTopology(format!("element {number}: bad node number '{field}'"))
            })?;
            nodes.push(node);
        }
        let mset = fields[n_node + 1];
        let material_set: i64 = mset.parse().map_err(|_| {
            Error::InvalidMaterial(format!("element {number}: bad material set '{mset}'"))
        })?;
        Ok(ElementRecord {
            number,
            nodes,
            material_set,
        })
    }
}

/// Defines the contract shared by all element variants
///
/// The assembler and the driver only talk to elements through this trait.
pub trait ElementTrait {
    /// Binds an input record to the mesh and the material catalog
    fn bind(record: &ElementRecord, mesh: &Mesh, catalog: &MaterialCatalog) -> Result<Self>
    where
        Self: Sized;

    /// Returns the element number from the input
    fn number(&self) -> usize;

    fn n_node(&self) -> usize;

    fn n_local_dof(&self) -> usize;

    /// Returns the length of the packed stiffness block, `n(n+1)/2`
    fn stiffness_block_size(&self) -> usize {
        packed_len(self.n_local_dof())
    }

    /// Returns the local DOF → global equation map (0 = constrained)
    fn location_matrix(&self) -> &[usize];

    /// Regenerates the location matrix from the current node order
    fn build_location_matrix(&mut self, mesh: &Mesh) -> Result<()>;

    /// Calculates the packed local stiffness block
    fn calc_stiffness(&mut self, mesh: &Mesh, observer: &dyn Observer) -> Result<PackedSymmetric>;

    /// Recovers the element stresses from the global displacement vector
    ///
    /// `displacement[eq - 1]` holds the value of equation `eq`.
    fn calc_stress(
        &mut self,
        mesh: &Mesh,
        displacement: &[f64],
        observer: &dyn Observer,
    ) -> Result<Vec<f64>>;

    /// Formats the element as a fixed-width report row
    fn describe(&self) -> String;
}

/// All element variants known to the program
#[derive(Clone, Debug)]
pub enum Element {
    Tri3(Tri3PlaneStress),
}

impl Element {
    /// Binds a record for the given element kind
    pub fn bind_kind(
        kind: ElementKind,
        record: &ElementRecord,
        mesh: &Mesh,
        catalog: &MaterialCatalog,
    ) -> Result<Self> {
        match kind {
            ElementKind::Tri3 => Ok(Element::Tri3(Tri3PlaneStress::bind(record, mesh, catalog)?)),
            ElementKind::Bar => Err(Error::Input(format!(
                "element {}: bar elements are not supported",
                record.number
            ))),
        }
    }

    /// Replaces the geometry thresholds of the element
    pub fn with_tolerance(self, tolerance: GeometryTolerance) -> Self {
        match self {
            Element::Tri3(e) => Element::Tri3(e.with_tolerance(tolerance)),
        }
    }
}

impl ElementTrait for Element {
    /// Picks the variant from the number of nodes in the record
    fn bind(record: &ElementRecord, mesh: &Mesh, catalog: &MaterialCatalog) -> Result<Self> {
        let kind = ElementKind::from_node_count(record.nodes.len()).ok_or_else(|| {
            Error::InvalidTopology(format!(
                "element {}: no element type has {} nodes",
                record.number,
                record.nodes.len()
            ))
        })?;
        Element::bind_kind(kind, record, mesh, catalog)
    }

    fn number(&self) -> usize {
        match self {
            Element::Tri3(e) => e.number(),
        }
    }

    fn n_node(&self) -> usize {
        match self {
            Element::Tri3(e) => e.n_node(),
        }
    }

    fn n_local_dof(&self) -> usize {
        match self {
            Element::Tri3(e) => e.n_local_dof(),
        }
    }

    fn location_matrix(&self) -> &[usize] {
        match self {
            Element::Tri3(e) => e.location_matrix(),
        }
    }

    fn build_location_matrix(&mut self, mesh: &Mesh) -> Result<()> {
        match self {
            Element::Tri3(e) => e.build_location_matrix(mesh),
        }
    }

    fn calc_stiffness(&mut self, mesh: &Mesh, observer: &dyn Observer) -> Result<PackedSymmetric> {
        match self {
            Element::Tri3(e) => e.calc_stiffness(mesh, observer),
        }
    }

    fn calc_stress(
        &mut self,
        mesh: &Mesh,
        displacement: &[f64],
        observer: &dyn Observer,
    ) -> Result<Vec<f64>> {
        match self {
            Element::Tri3(e) => e.calc_stress(mesh, displacement, observer),
        }
    }

    fn describe(&self) -> String {
        match self {
            Element::Tri3(e) => e.describe(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
