use crate::error::{Error, Result};
use crate::input::{parse_field, split_fields};
use std::fmt;

/// Number of nominal degrees of freedom per node (x, y, z)
pub const NDF: usize = 3;

/// A mesh node
///
/// `bcode` holds one global equation number per nominal DOF after
/// [Mesh::number_equations] has run; 0 means the DOF is constrained.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// 1-based node number
    pub number: usize,

    /// Coordinates; this element family uses only x and y
    pub xyz: [f64; 3],

    /// Restraint flags from the input, true = fixed
    pub fixed: [bool; NDF],

    /// Global equation numbers (0 = constrained)
    pub bcode: [usize; NDF],
}

impl Node {
    pub fn new(number: usize, xyz: [f64; 3], fixed: [bool; NDF]) -> Self {
        Node {
            number,
            xyz,
            fixed,
            bcode: [0; NDF],
        }
    }

    /// Reads a node record: `N bx by bz x y z` with `b = 0` (free) or `1` (fixed)
    pub fn read(line: &str) -> Result<Self> {
        let fields = split_fields(line, 4 + NDF, "node")?;
        let number: usize = parse_field(fields[0], "node number")?;
        let mut fixed = [false; NDF];
        for (d, flag) in fixed.iter_mut().enumerate() {
            *flag = match parse_field::<u8>(fields[1 + d], "boundary code")? {
                0 => false,
                1 => true,
                other => {
                    return Err(Error::Input(format!(
                        "node {number}: boundary code must be 0 or 1, got {other}"
                    )))
                }
            };
        }
        let xyz = [
            parse_field(fields[4], "x coordinate")?,
            parse_field(fields[5], "y coordinate")?,
            parse_field(fields[6], "z coordinate")?,
        ];
        Ok(Node::new(number, xyz, fixed))
    }

    /// Formats the node as a fixed-width report row
    pub fn write(&self) -> String {
        let code = |d: usize| if self.fixed[d] { 1 } else { 0 };
        format!(
            "{:9}{:5}{:5}{:5}{:18}{:15}{:15}",
            self.number,
            code(0),
            code(1),
            code(2),
            self.xyz[0],
            self.xyz[1],
            self.xyz[2]
        )
    }
}

/// Holds the nodes of the model and their equation numbers
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    n_equation: usize,
}

impl Mesh {
    /// Allocates a new mesh
    ///
    /// Nodes must be numbered 1, 2, ..., n in the given order.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        for (i, node) in nodes.iter().enumerate() {
            if node.number != i + 1 {
                return Err(Error::Input(format!(
                    "nodes must be numbered in sequence: expected {}, got {}",
                    i + 1,
                    node.number
                )));
            }
        }
        Ok(Mesh {
            nodes,
            n_equation: 0,
        })
    }

    /// Converts a 1-based node number from the input into a node index
    ///
    /// # Returns
    /// The 0-based index into `nodes`, or `InvalidTopology` when the number
    /// is non-positive or beyond the last node
    pub fn index_of(&self, number: i64) -> Result<usize> {
        if number <= 0 || number as usize > self.nodes.len() {
            return Err(Error::InvalidTopology(format!(
                "node number {number} is outside 1..={}",
                self.nodes.len()
            )));
        }
        Ok(number as usize - 1)
    }

    /// Assigns equation numbers to the free DOFs
    ///
    /// Nodes are traversed in order and, within a node, DOFs in x, y, z
    /// order. Free DOFs receive ascending numbers starting at 1 and
    /// fixed DOFs receive 0.
    ///
    /// # Returns
    /// The total number of equations
    pub fn number_equations(&mut self) -> usize {
        let mut neq = 0;
        for node in self.nodes.iter_mut() {
            for d in 0..NDF {
                if node.fixed[d] {
                    node.bcode[d] = 0;
                } else {
                    neq += 1;
                    node.bcode[d] = neq;
                }
            }
        }
        self.n_equation = neq;
        neq
    }

    /// Returns the number of equations found by the last call to [Mesh::number_equations]
    pub fn n_equation(&self) -> usize {
        self.n_equation
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes: boundary codes and equation numbers")?;
        writeln!(f, "==========================================")?;
        for node in &self.nodes {
            writeln!(f, "{}: {:?}", node.number, node.bcode)?;
        }
        writeln!(f, "\nnumber of equations = {}", self.n_equation)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
