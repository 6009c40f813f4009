use crate::error::{Error, Result};
use crate::input::{parse_field, split_fields};
use nalgebra::{matrix, SMatrix};
use std::collections::BTreeMap;

/// Holds parameters for a bar (truss) property set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamBar {
    /// Young's modulus
    pub young: f64,

    /// Cross-section area
    pub area: f64,
}

/// Holds parameters for a plane-stress property set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamPlaneStress {
    /// Young's modulus
    pub young: f64,

    /// Poisson's coefficient
    pub poisson: f64,

    /// Out-of-plane thickness
    pub thickness: f64,
}

impl ParamPlaneStress {
    /// Returns `E / (1 - ν²)`, the common factor of the plane-stress law
    pub fn factor(&self) -> f64 {
        self.young / (1.0 - f64::powi(self.poisson, 2))
    }

    /// Calculates the stress-strain (constitutive) matrix
    ///
    /// # Returns
    /// The symmetric 3x3 matrix relating `(εxx, εyy, γxy)` to `(σxx, σyy, τxy)`
    pub fn constitutive_matrix(&self) -> SMatrix<f64, 3, 3> {
        let nu = self.poisson;
        let mut dd: SMatrix<f64, 3, 3> = matrix![
            1.0, nu, 0.0;
            nu, 1.0, 0.0;
            0.0, 0.0, (1.0 - nu) / 2.0;
        ];
        dd *= self.factor();
        dd
    }
}

/// Material property set variants
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamMaterial {
    Bar(ParamBar),
    PlaneStress(ParamPlaneStress),
}

impl ParamMaterial {
    /// Returns a short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ParamMaterial::Bar(_) => "bar",
            ParamMaterial::PlaneStress(_) => "plane-stress",
        }
    }
}

/// A material property set identified by its 1-based set number
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialRecord {
    pub set: usize,
    pub param: ParamMaterial,
}

impl MaterialRecord {
    /// Reads a bar record: `set E A`
    pub fn read_bar(line: &str) -> Result<Self> {
        let fields = split_fields(line, 3, "bar material")?;
        Ok(MaterialRecord {
            set: parse_set_number(fields[0])?,
            param: ParamMaterial::Bar(ParamBar {
                young: parse_field(fields[1], "Young's modulus")?,
                area: parse_field(fields[2], "cross-section area")?,
            }),
        })
    }

    /// Reads a plane-stress record: `set E nu t`
    pub fn read_plane_stress(line: &str) -> Result<Self> {
        let fields = split_fields(line, 4, "plane-stress material")?;
        Ok(MaterialRecord {
            set: parse_set_number(fields[0])?,
            param: ParamMaterial::PlaneStress(ParamPlaneStress {
                young: parse_field(fields[1], "Young's modulus")?,
                poisson: parse_field(fields[2], "Poisson's ratio")?,
                thickness: parse_field(fields[3], "thickness")?,
            }),
        })
    }

    /// Formats the record as a fixed-width report row (no trailing newline)
    pub fn write(&self) -> String {
        match &self.param {
            ParamMaterial::Bar(p) => format!("{:5}{:16}{:16}", self.set, p.young, p.area),
            ParamMaterial::PlaneStress(p) => format!(
                "{:5}{:16}{:16}{:16}",
                self.set, p.young, p.poisson, p.thickness
            ),
        }
    }
}

fn parse_set_number(field: &str) -> Result<usize> {
    let set: usize = parse_field(field, "material set number")?;
    if set == 0 {
        return Err(Error::Input("material set numbers start at 1".to_owned()));
    }
    Ok(set)
}

/// Holds the material property sets of one element group
///
/// Records are immutable once inserted; inserting a set number twice
/// replaces the earlier record.
#[derive(Clone, Debug, Default)]
pub struct MaterialCatalog {
    records: BTreeMap<usize, MaterialRecord>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        MaterialCatalog::default()
    }

    pub fn insert(&mut self, record: MaterialRecord) {
        self.records.insert(record.set, record);
    }

    /// Looks up a property set by its 1-based number
    pub fn get(&self, set: usize) -> Result<&MaterialRecord> {
        self.records
            .get(&set)
            .ok_or_else(|| Error::InvalidMaterial(format!("material set {set} is not defined")))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in ascending set order
    pub fn iter(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.records.values()
    }
}

impl FromIterator<MaterialRecord> for MaterialCatalog {
    fn from_iter<I: IntoIterator<Item = MaterialRecord>>(iter: I) -> Self {
        let mut catalog = MaterialCatalog::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
