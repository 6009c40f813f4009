use crate::analysis::{LoadCaseResult, Model};
use crate::element::{ElementKind, ElementTrait};
use crate::error::Result;
use json::JsonValue;
use std::fmt::Write;

/// Formats the model data and the results as a STAP-style text report
pub fn text_report(model: &Model, results: &[LoadCaseResult]) -> Result<String> {
    let mut out = String::new();
    write_report(&mut out, model, results)?;
    Ok(out)
}

fn write_report(out: &mut String, model: &Model, results: &[LoadCaseResult]) -> std::fmt::Result {
    writeln!(out, "{}", model.heading)?;
    writeln!(out)?;
    writeln!(out, " C O N T R O L   I N F O R M A T I O N")?;
    writeln!(out)?;
    let control = [
        ("NUMBER OF NODAL POINTS . . . . . . (NUMNP) ", model.mesh.nodes.len()),
        ("NUMBER OF ELEMENT GROUPS . . . . . (NUMEG) ", model.groups.len()),
        ("NUMBER OF LOAD CASES . . . . . . . (NLCASE)", model.load_cases.len()),
        ("SOLUTION MODE  . . . . . . . . . . (MODEX) ", model.modex),
        ("NUMBER OF EQUATIONS  . . . . . . . (NEQ)   ", model.mesh.n_equation()),
    ];
    for (label, value) in control {
        writeln!(out, "     {label} = {value:10}")?;
    }
    writeln!(out)?;

    writeln!(out, " N O D A L   P O I N T   D A T A")?;
    writeln!(out)?;
    writeln!(out, "    NODE       BOUNDARY                         NODAL POINT")?;
    writeln!(out, "   NUMBER  CONDITION  CODES                     COORDINATES")?;
    for node in &model.mesh.nodes {
        writeln!(out, "{}", node.write())?;
    }
    writeln!(out)?;

    writeln!(out, " E Q U A T I O N   N U M B E R S")?;
    writeln!(out)?;
    writeln!(out, "   NODE NUMBER   DEGREES OF FREEDOM")?;
    writeln!(out, "        N           X    Y    Z")?;
    for node in &model.mesh.nodes {
        writeln!(
            out,
            "{:9}       {:5}{:5}{:5}",
            node.number, node.bcode[0], node.bcode[1], node.bcode[2]
        )?;
    }
    writeln!(out)?;

    writeln!(out, " E L E M E N T   G R O U P   D A T A")?;
    for (g, group) in model.groups.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            " GROUP {:5}   ELEMENT TYPE {:5}   NUMBER OF ELEMENTS {:5}",
            g + 1,
            group.kind.code(),
            group.elements.len()
        )?;
        writeln!(out)?;
        writeln!(out, " M A T E R I A L   D E F I N I T I O N")?;
        writeln!(out)?;
        let (title, units) = match group.kind {
            ElementKind::Tri3 => (
                "  SET       YOUNG'S        POISSON'S       THICKNESS",
                " NUMBER     MODULUS          RATIO",
            ),
            ElementKind::Bar => (
                "  SET       YOUNG'S     CROSS-SECTIONAL",
                " NUMBER     MODULUS          AREA",
            ),
        };
        writeln!(out, "{title}")?;
        writeln!(out, "{units}")?;
        for record in group.catalog.iter() {
            writeln!(out, "{}", record.write())?;
        }
        writeln!(out)?;
        writeln!(out, " E L E M E N T   I N F O R M A T I O N")?;
        writeln!(out)?;
        writeln!(out, " ELEMENT     NODE     NODE     NODE       MATERIAL")?;
        writeln!(out, " NUMBER-N      I        J        K       SET NUMBER")?;
        for element in &group.elements {
            writeln!(out, "{:5}{}", element.number(), element.describe())?;
        }
    }

    for result in results {
        writeln!(out)?;
        writeln!(out, " L O A D   C A S E {:5}", result.number)?;
        writeln!(out)?;
        writeln!(out, " D I S P L A C E M E N T S")?;
        writeln!(out)?;
        writeln!(out, "  NODE           X-DISPLACEMENT    Y-DISPLACEMENT    Z-DISPLACEMENT")?;
        let disp = model.node_displacements(result.displacement.as_slice());
        for (node, u) in model.mesh.nodes.iter().zip(&disp) {
            writeln!(out, "{:5}        {:18.6e}{:18.6e}{:18.6e}", node.number, u[0], u[1], u[2])?;
        }
        writeln!(out)?;
        writeln!(out, " S T R E S S  C A L C U L A T I O N S")?;
        writeln!(out)?;
        writeln!(out, "  ELEMENT             SXX               SYY               SXY")?;
        for s in &result.stresses {
            write!(out, "{:5}    ", s.element)?;
            for value in &s.stress {
                write!(out, "{:18.6e}", value)?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Collects displacements and stresses as json
pub fn json_results(model: &Model, results: &[LoadCaseResult]) -> JsonValue {
    let mut cases = Vec::with_capacity(results.len());
    for result in results {
        let disp = model.node_displacements(result.displacement.as_slice());
        let nodes: Vec<JsonValue> = model
            .mesh
            .nodes
            .iter()
            .zip(&disp)
            .map(|(node, u)| {
                let mut entry = JsonValue::new_object();
                entry["node"] = node.number.into();
                entry["ux"] = u[0].into();
                entry["uy"] = u[1].into();
                entry["uz"] = u[2].into();
                entry
            })
            .collect();

        let elements: Vec<JsonValue> = result
            .stresses
            .iter()
            .map(|s| {
                let mut entry = JsonValue::new_object();
                entry["group"] = s.group.into();
                entry["element"] = s.element.into();
                entry["stress"] = s.stress.clone().into();
                entry
            })
            .collect();

        let mut case = JsonValue::new_object();
        case["load_case"] = result.number.into();
        case["displacements"] = JsonValue::Array(nodes);
        case["stresses"] = JsonValue::Array(elements);
        cases.push(case);
    }

    let mut root = JsonValue::new_object();
    root["heading"] = model.heading.as_str().into();
    root["equations"] = model.mesh.n_equation().into();
    root["load_cases"] = JsonValue::Array(cases);
    root
}
