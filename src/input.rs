use crate::element::{ElementKind, ElementRecord};
use crate::error::{Error, Result};
use crate::material::{MaterialCatalog, MaterialRecord};
use crate::mesh::{Mesh, Node, NDF};
use std::path::Path;
use std::str::FromStr;

/// Splits a free-format line into at least `expected` whitespace-separated fields
pub(crate) fn split_fields<'a>(line: &'a str, expected: usize, what: &str) -> Result<Vec<&'a str>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < expected {
        return Err(Error::Input(format!(
            "{what} record needs {expected} fields, found {}: '{}'",
            fields.len(),
            line.trim()
        )));
    }
    Ok(fields)
}

/// Parses one field, naming it in the error message
pub(crate) fn parse_field<T: FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| Error::Input(format!("bad {what}: '{field}'")))
}

/// A concentrated load: `node dof value`, with `dof` in 1..=3
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodalLoad {
    pub node: usize,
    pub dof: usize,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadCase {
    pub number: usize,
    pub loads: Vec<NodalLoad>,
}

/// One element group: its type, its material sets and its element lines
#[derive(Clone, Debug)]
pub struct ElementGroup {
    pub kind: ElementKind,
    pub catalog: MaterialCatalog,
    pub records: Vec<ElementRecord>,
}

/// Everything read from a STAP-style input file
#[derive(Clone, Debug)]
pub struct ModelInput {
    pub heading: String,

    /// Solution mode; 0 only checks the data
    pub modex: usize,

    pub mesh: Mesh,
    pub load_cases: Vec<LoadCase>,
    pub groups: Vec<ElementGroup>,
}

/// Walks the significant lines of the input, skipping blanks and `#` comments
struct Lines<'a> {
    inner: std::str::Lines<'a>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines {
            inner: text.lines(),
        }
    }

    fn next(&mut self, what: &str) -> Result<&'a str> {
        for line in self.inner.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(line);
        }
        Err(Error::Input(format!("unexpected end of input while reading {what}")))
    }
}

impl ModelInput {
    /// Reads an input file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        ModelInput::parse(&text)
    }

    /// Parses the text of an input file
    ///
    /// ```text
    /// heading
    /// NUMNP NUMEG NLCASE MODEX
    /// N bx by bz x y z                  (NUMNP lines)
    /// LL NLOAD                          (per load case)
    /// node dof value                    (NLOAD lines)
    /// ElementType NUME NUMMAT           (per element group)
    /// material lines                    (NUMMAT lines)
    /// N n1 .. nk mset                   (NUME lines)
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Lines::new(text);
        let heading = lines.next("heading")?.trim().to_string();

        let control = split_fields(lines.next("control line")?, 4, "control")?;
        let numnp: usize = parse_field(control[0], "number of nodes")?;
        let numeg: usize = parse_field(control[1], "number of element groups")?;
        let nlcase: usize = parse_field(control[2], "number of load cases")?;
        let modex: usize = parse_field(control[3], "solution mode")?;

        let mut nodes = Vec::with_capacity(numnp);
        for _ in 0..numnp {
            nodes.push(Node::read(lines.next("nodes")?)?);
        }
        let mesh = Mesh::new(nodes)?;

        let mut load_cases = Vec::with_capacity(nlcase);
        for _ in 0..nlcase {
            let header = split_fields(lines.next("load case")?, 2, "load case")?;
            let number: usize = parse_field(header[0], "load case number")?;
            let nload: usize = parse_field(header[1], "number of loads")?;
            let mut loads = Vec::with_capacity(nload);
            for _ in 0..nload {
                let fields = split_fields(lines.next("loads")?, 3, "load")?;
                let load = NodalLoad {
                    node: parse_field(fields[0], "load node")?,
                    dof: parse_field(fields[1], "load direction")?,
                    value: parse_field(fields[2], "load value")?,
                };
                if load.node == 0 || load.node > numnp {
                    return Err(Error::Input(format!(
                        "load case {number}: node {} does not exist",
                        load.node
                    )));
                }
                if load.dof == 0 || load.dof > NDF {
                    return Err(Error::Input(format!(
                        "load case {number}: direction must be 1..={NDF}, got {}",
                        load.dof
                    )));
                }
                loads.push(load);
            }
            load_cases.push(LoadCase { number, loads });
        }

        let mut groups = Vec::with_capacity(numeg);
        for _ in 0..numeg {
            let header = split_fields(lines.next("element group")?, 3, "element group")?;
            let kind = ElementKind::from_code(parse_field(header[0], "element type")?)?;
            let nume: usize = parse_field(header[1], "number of elements")?;
            let nummat: usize = parse_field(header[2], "number of material sets")?;

            let mut catalog = MaterialCatalog::new();
            for _ in 0..nummat {
                let line = lines.next("material sets")?;
                let record = match kind {
                    ElementKind::Bar => MaterialRecord::read_bar(line)?,
                    ElementKind::Tri3 => MaterialRecord::read_plane_stress(line)?,
                };
                catalog.insert(record);
            }

            let mut records = Vec::with_capacity(nume);
            for _ in 0..nume {
                records.push(ElementRecord::read(lines.next("elements")?, kind.n_node())?);
            }
            groups.push(ElementGroup {
                kind,
                catalog,
                records,
            });
        }

        Ok(ModelInput {
            heading,
            modex,
            mesh,
            load_cases,
            groups,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::ParamMaterial;

    const TWO_TRIANGLES: &str = "\
square plate made of two triangles
4 1 1 1
1  1 1 1  0.0 0.0 0.0
2  0 1 1  1.0 0.0 0.0
3  0 0 1  1.0 1.0 0.0
4  1 0 1  0.0 1.0 0.0
# load case
1 2
2 1 0.5
3 1 0.5
3 2 1
1 1000.0 0.3 1.0
1  1 2 3  1
2  1 4 3  1
";

    #[test]
    fn parse_works() {
        let input = ModelInput::parse(TWO_TRIANGLES).unwrap();
        assert_eq!(input.heading, "square plate made of two triangles");
        assert_eq!(input.modex, 1);
        assert_eq!(input.mesh.nodes.len(), 4);
        assert_eq!(input.mesh.nodes[2].xyz, [1.0, 1.0, 0.0]);
        assert_eq!(
            input.load_cases,
            &[LoadCase {
                number: 1,
                loads: vec![
                    NodalLoad {
                        node: 2,
                        dof: 1,
                        value: 0.5
                    },
                    NodalLoad {
                        node: 3,
                        dof: 1,
                        value: 0.5
                    },
                ]
            }]
        );
        assert_eq!(input.groups.len(), 1);
        let group = &input.groups[0];
        assert_eq!(group.kind, ElementKind::Tri3);
        assert!(matches!(
            group.catalog.get(1).unwrap().param,
            ParamMaterial::PlaneStress(_)
        ));
        assert_eq!(group.records.len(), 2);
        assert_eq!(group.records[1].nodes, &[1, 4, 3]);
    }

    #[test]
    fn parse_reads_bar_materials() {
        let text = "bars\n2 1 0 1\n1 1 1 1 0 0 0\n2 0 1 1 1 0 0\n1 1 1\n1 200.0 0.5\n1 1 2 1\n";
        let input = ModelInput::parse(text).unwrap();
        assert_eq!(input.groups[0].kind, ElementKind::Bar);
        assert_eq!(input.groups[0].records[0].nodes, &[1, 2]);
        assert_eq!(input.groups[0].catalog.get(1).unwrap().param.kind(), "bar");
    }

    #[test]
    fn parse_captures_errors() {
        let (truncated, _) = TWO_TRIANGLES.trim_end().rsplit_once('\n').unwrap();
        assert!(matches!(ModelInput::parse(truncated), Err(Error::Input(_))));

        let bad_load = TWO_TRIANGLES.replace("3 1 0.5", "3 4 0.5");
        assert!(matches!(ModelInput::parse(&bad_load), Err(Error::Input(_))));

        let bad_node = TWO_TRIANGLES.replace("2 1 0.5", "9 1 0.5");
        assert!(matches!(ModelInput::parse(&bad_node), Err(Error::Input(_))));

        let bad_type = TWO_TRIANGLES.replace("3 2 1\n", "5 2 1\n");
        assert!(matches!(ModelInput::parse(&bad_type), Err(Error::Input(_))));

        let garbled = TWO_TRIANGLES.replace("2  1 4 3  1", "2  1 four 3  1");
        assert!(matches!(ModelInput::parse(&garbled), Err(Error::InvalidTopology(_))));

        assert!(matches!(ModelInput::parse(""), Err(Error::Input(_))));
    }

    #[test]
    fn helpers_work() {
        assert_eq!(split_fields(" a  b c ", 2, "x").unwrap(), &["a", "b", "c"]);
        assert!(matches!(split_fields("a", 2, "x"), Err(Error::Input(_))));
        assert_eq!(parse_field::<f64>("1.5e3", "x").unwrap(), 1500.0);
        assert!(matches!(parse_field::<usize>("-1", "x"), Err(Error::Input(_))));
    }
}
