use super::{ElementRecord, ElementTrait};
use crate::error::{Error, Result};
use crate::material::{MaterialCatalog, ParamMaterial, ParamPlaneStress};
use crate::mesh::Mesh;
use crate::observer::{ElementEvent, Observer};
use crate::packed::PackedSymmetric;
use nalgebra::{matrix, SMatrix, SVector};

const N_NODE: usize = 3;
const N_DOF: usize = 6;

/// Default area at or below which a triangle is rejected
pub const DEFAULT_AREA_TOLERANCE: f64 = 1e-12;

/// Default area below which a (valid) triangle is reported as suspicious
pub const DEFAULT_SMALL_AREA_WARNING: f64 = 1e-8;

/// Area thresholds used while deriving the element geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryTolerance {
    /// Hard limit: `area <= area` is `DegenerateGeometry`
    pub area: f64,

    /// Soft limit: `area < small_area_warning` emits a warning event
    pub small_area_warning: f64,
}

impl Default for GeometryTolerance {
    fn default() -> Self {
        GeometryTolerance {
            area: DEFAULT_AREA_TOLERANCE,
            small_area_warning: DEFAULT_SMALL_AREA_WARNING,
        }
    }
}

/// Linear shape-function coefficients and area of a CCW triangle
///
/// `N_i(x, y) = (a_i + b_i x + c_i y) / (2A)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tri3Geometry {
    pub a: [f64; 3],
    pub b: [f64; 3],
    pub c: [f64; 3],
    pub area: f64,
}

/// Lifecycle of a triangle element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tri3State {
    /// Nodes and material are bound; geometry not derived yet
    Bound,

    /// Orientation fixed, coefficients derived, location matrix built
    Ready,
}

/// Calculates twice the signed area of the triangle
///
/// Positive for counterclockwise node order.
pub fn signed_double_area(xy: &[[f64; 2]; 3]) -> f64 {
    let [x1, y1] = xy[0];
    let [x2, y2] = xy[1];
    let [x3, y3] = xy[2];
    (x2 - x1) * (y3 - y1) - (x3 - x1) * (y2 - y1)
}

/// Calculates the shape-function coefficients of a triangle
///
/// The nodes are taken in the given order, which should be counterclockwise;
/// the returned area is `det / 2` and is negative otherwise.
pub fn shape_coefficients(xy: &[[f64; 2]; 3]) -> Tri3Geometry {
    let [x1, y1] = xy[0];
    let [x2, y2] = xy[1];
    let [x3, y3] = xy[2];
    Tri3Geometry {
        a: [x2 * y3 - x3 * y2, x3 * y1 - x1 * y3, x1 * y2 - x2 * y1],
        b: [y2 - y3, y3 - y1, y1 - y2],
        c: [x3 - x2, x1 - x3, x2 - x1],
        area: signed_double_area(xy) / 2.0,
    }
}

/// Calculates the strain-displacement matrix
///
/// # Arguments
/// * `geo` - The geometry of a CCW triangle
///
/// # Returns
/// A 3x6 matrix mapping `(u1, v1, u2, v2, u3, v3)` to `(εxx, εyy, γxy)`
pub fn strain_displacement_matrix(geo: &Tri3Geometry) -> SMatrix<f64, 3, 6> {
    let [b0, b1, b2] = geo.b;
    let [c0, c1, c2] = geo.c;

    let mut bb: SMatrix<f64, 3, 6> = matrix![
        b0, 0., b1, 0., b2, 0.;
        0., c0, 0., c1, 0., c2;
        c0, b0, c1, b1, c2, b2;
    ];

    bb /= 2.0 * geo.area;

    bb
}

/// Calculates the packed stiffness `t A Bᵗ D B` of a CCW triangle
///
/// Only the upper triangle is computed.
///
/// # Arguments
/// * `geo` - The geometry of a CCW triangle
/// * `param` - The plane-stress parameters (thickness included)
pub fn packed_stiffness(geo: &Tri3Geometry, param: &ParamPlaneStress) -> PackedSymmetric {
    let bb = strain_displacement_matrix(geo);
    let db = param.constitutive_matrix() * bb;
    let volume = param.thickness * geo.area;

    let mut kk = PackedSymmetric::new(N_DOF);
    for j in 0..N_DOF {
        for i in 0..=j {
            kk.set(i, j, volume * bb.column(i).dot(&db.column(j)));
        }
    }
    kk
}

/// Implements the 3-node plane-stress triangle (constant strain triangle)
#[derive(Clone, Debug)]
pub struct Tri3PlaneStress {
    number: usize,

    /// Mesh indices of the nodes in the element's local order (may differ from input)
    nodes: [usize; N_NODE],

    material_set: usize,
    param: ParamPlaneStress,
    tolerance: GeometryTolerance,
    location: [usize; N_DOF],
    geometry: Option<Tri3Geometry>,
}

impl Tri3PlaneStress {
    /// Replaces the default area thresholds
    pub fn with_tolerance(mut self, tolerance: GeometryTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn state(&self) -> Tri3State {
        match self.geometry {
            Some(_) => Tri3State::Ready,
            None => Tri3State::Bound,
        }
    }

    /// Returns the mesh indices of the nodes in local order
    pub fn nodes(&self) -> [usize; N_NODE] {
        self.nodes
    }

    pub fn material_set(&self) -> usize {
        self.material_set
    }

    pub fn param(&self) -> &ParamPlaneStress {
        &self.param
    }

    /// Returns the thickness cached from the material set
    pub fn thickness(&self) -> f64 {
        self.param.thickness
    }

    /// Returns the geometry derived by the last [Tri3PlaneStress::prepare], if any
    pub fn geometry(&self) -> Option<&Tri3Geometry> {
        self.geometry.as_ref()
    }

    fn coordinates(&self, mesh: &Mesh) -> Result<[[f64; 2]; 3]> {
        let mut xy = [[0.0; 2]; 3];
        for (m, &index) in self.nodes.iter().enumerate() {
            let node = mesh.nodes.get(index).ok_or_else(|| {
                Error::InvalidTopology(format!(
                    "element {}: node index {index} is not in the mesh",
                    self.number
                ))
            })?;
            xy[m] = [node.xyz[0], node.xyz[1]];
        }
        Ok(xy)
    }

    fn node_numbers(&self) -> [usize; N_NODE] {
        self.nodes.map(|index| index + 1)
    }

    /// Derives the geometry from the current node coordinates
    ///
    /// Clockwise input is corrected by swapping the 2nd and 3rd nodes, at most
    /// once. The location matrix is rebuilt before the area is checked, so it
    /// follows the node order even when the element is rejected. Calling this again with
    /// unchanged coordinates gives the same result and does not swap.
    pub fn prepare(&mut self, mesh: &Mesh, observer: &dyn Observer) -> Result<Tri3Geometry> {
        self.geometry = None;

        let mut xy = self.coordinates(mesh)?;
        if signed_double_area(&xy) < 0.0 {
            let before = self.node_numbers();
            self.nodes.swap(1, 2);
            xy.swap(1, 2);
            observer.notify(&ElementEvent::OrientationSwapped {
                element: self.number,
                before,
                after: self.node_numbers(),
            });
        }
        self.build_location_matrix(mesh)?;
        observer.notify(&ElementEvent::LocationMatrixRebuilt {
            element: self.number,
            location: self.location.to_vec(),
        });

        let geo = shape_coefficients(&xy);
        if !(geo.area > self.tolerance.area) {
            return Err(Error::DegenerateGeometry {
                element: self.number,
                area: geo.area,
            });
        }
        if geo.area < self.tolerance.small_area_warning {
            observer.notify(&ElementEvent::SmallArea {
                element: self.number,
                area: geo.area,
            });
        }

        let sum_a: f64 = geo.a.iter().sum();
        let two_area = 2.0 * geo.area;
        if (sum_a - two_area).abs() > 1e-9 * f64::max(1.0, two_area.abs()) {
            observer.notify(&ElementEvent::ShapeCoefficientMismatch {
                element: self.number,
                sum_a,
                two_area,
            });
        }

        self.geometry = Some(geo);
        Ok(geo)
    }

    /// Gathers the element displacements `d` from the global vector
    fn local_displacement(&self, displacement: &[f64]) -> Result<SVector<f64, N_DOF>> {
        let mut d = SVector::<f64, N_DOF>::zeros();
        for (i, &eq) in self.location.iter().enumerate() {
            if eq == 0 {
                continue;
            }
            d[i] = *displacement.get(eq - 1).ok_or_else(|| {
                Error::MissingInput(format!(
                    "element {}: equation {eq} is beyond the {} displacements",
                    self.number,
                    displacement.len()
                ))
            })?;
        }
        Ok(d)
    }

    /// Calculates `(σxx, σyy, τxy)` from the global displacement vector
    pub fn calc_stress_vector(
        &mut self,
        mesh: &Mesh,
        displacement: &[f64],
        observer: &dyn Observer,
    ) -> Result<[f64; 3]> {
        let geo = self.prepare(mesh, observer)?;
        let d = self.local_displacement(displacement)?;
        let strain = strain_displacement_matrix(&geo) * d;
        let stress = self.param.constitutive_matrix() * strain;
        Ok([stress[0], stress[1], stress[2]])
    }
}

impl ElementTrait for Tri3PlaneStress {
    fn bind(record: &ElementRecord, mesh: &Mesh, catalog: &MaterialCatalog) -> Result<Self> {
        if mesh.nodes.is_empty() {
            return Err(Error::MissingInput(format!(
                "element {}: no nodes are available",
                record.number
            )));
        }
        if catalog.is_empty() {
            return Err(Error::MissingInput(format!(
                "element {}: no material sets are available",
                record.number
            )));
        }
        if record.nodes.len() != N_NODE {
            return Err(Error::InvalidTopology(format!(
                "element {}: expected {N_NODE} nodes, got {}",
                record.number,
                record.nodes.len()
            )));
        }
        let mut nodes = [0; N_NODE];
        for (m, &number) in record.nodes.iter().enumerate() {
            nodes[m] = mesh.index_of(number).map_err(|err| match err {
                Error::InvalidTopology(msg) => {
                    Error::InvalidTopology(format!("element {}: {msg}", record.number))
                }
                other => other,
            })?;
        }

        if record.material_set <= 0 {
            return Err(Error::InvalidMaterial(format!(
                "element {}: material set {} is not positive",
                record.number, record.material_set
            )));
        }
        let material = catalog.get(record.material_set as usize)?;
        let param = match material.param {
            ParamMaterial::PlaneStress(p) => p,
            other => {
                return Err(Error::InvalidMaterial(format!(
                    "element {}: triangle requires a plane-stress material, set {} is {}",
                    record.number,
                    material.set,
                    other.kind()
                )))
            }
        };

        Ok(Tri3PlaneStress {
            number: record.number,
            nodes,
            material_set: material.set,
            param,
            tolerance: GeometryTolerance::default(),
            location: [0; N_DOF],
            geometry: None,
        })
    }

    fn number(&self) -> usize {
        self.number
    }

    fn n_node(&self) -> usize {
        N_NODE
    }

    fn n_local_dof(&self) -> usize {
        N_DOF
    }

    fn location_matrix(&self) -> &[usize] {
        &self.location
    }

    /// Copies the x and y equation numbers of each node, in local node order
    fn build_location_matrix(&mut self, mesh: &Mesh) -> Result<()> {
        for (m, &index) in self.nodes.iter().enumerate() {
            let node = mesh.nodes.get(index).ok_or_else(|| {
                Error::InvalidTopology(format!(
                    "element {}: node index {index} is not in the mesh",
                    self.number
                ))
            })?;
            self.location[2 * m] = node.bcode[0];
            self.location[2 * m + 1] = node.bcode[1];
        }
        Ok(())
    }

    fn calc_stiffness(&mut self, mesh: &Mesh, observer: &dyn Observer) -> Result<PackedSymmetric> {
        let geo = self.prepare(mesh, observer)?;
        Ok(packed_stiffness(&geo, &self.param))
    }

    fn calc_stress(
        &mut self,
        mesh: &Mesh,
        displacement: &[f64],
        observer: &dyn Observer,
    ) -> Result<Vec<f64>> {
        Ok(self.calc_stress_vector(mesh, displacement, observer)?.to_vec())
    }

    fn describe(&self) -> String {
        let [n1, n2, n3] = self.node_numbers();
        format!("{:5}{:9}{:9}{:12}", n1, n2, n3, self.material_set)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialRecord;
    use crate::mesh::Node;
    use crate::observer::{NoopObserver, RecordingObserver};
    use nalgebra::DMatrix;

    fn mesh_from(coords: &[[f64; 2]]) -> Mesh {
        let nodes = coords
            .iter()
            .enumerate()
            .map(|(i, p)| Node::new(i + 1, [p[0], p[1], 0.0], [false, false, true]))
            .collect();
        let mut mesh = Mesh::new(nodes).unwrap();
        mesh.number_equations();
        mesh
    }

    fn catalog() -> MaterialCatalog {
        [
            MaterialRecord::read_plane_stress("1 1000 0.3 1").unwrap(),
            MaterialRecord::read_bar("2 1000 0.1").unwrap(),
        ]
        .into_iter()
        .collect()
    }

    fn record(nodes: [i64; 3], material_set: i64) -> ElementRecord {
        ElementRecord {
            number: 1,
            nodes: nodes.to_vec(),
            material_set,
        }
    }

    fn bind(mesh: &Mesh, nodes: [i64; 3]) -> Tri3PlaneStress {
        Tri3PlaneStress::bind(&record(nodes, 1), mesh, &catalog()).unwrap()
    }

    fn dense_bt_d_b(geo: &Tri3Geometry, param: &ParamPlaneStress) -> DMatrix<f64> {
        let bb = strain_displacement_matrix(geo);
        let kk = bb.transpose() * param.constitutive_matrix() * bb * (param.thickness * geo.area);
        DMatrix::from_fn(6, 6, |i, j| kk[(i, j)])
    }

    fn assert_packed_close(a: &PackedSymmetric, b: &PackedSymmetric, tol: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < tol, "{x} != {y}");
        }
    }

    #[test]
    fn shape_coefficients_sum_to_twice_the_area() {
        let triangles = [
            [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            [[2.0, 1.0], [5.0, 2.0], [3.0, 4.0]],
            [[-10.0, 3.5], [-7.25, -1.0], [40.0, 12.0]],
            [[1e3, 1e3], [1e3 + 0.1, 1e3], [1e3, 1e3 + 0.2]],
        ];
        for xy in &triangles {
            let geo = shape_coefficients(xy);
            assert!(geo.area > 0.0);
            let sum_a: f64 = geo.a.iter().sum();
            assert!(((sum_a - 2.0 * geo.area) / (2.0 * geo.area)).abs() < 1e-9);
            // each shape function is 1 at its own node and 0 at the others
            for i in 0..3 {
                for (m, p) in xy.iter().enumerate() {
                    let n = (geo.a[i] + geo.b[i] * p[0] + geo.c[i] * p[1]) / (2.0 * geo.area);
                    let expected = if i == m { 1.0 } else { 0.0 };
                    assert!((n - expected).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn bind_captures_errors() {
        let mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let catalog = catalog();
        for nodes in [[0, 2, 3], [1, -2, 3], [1, 2, 4]] {
            assert!(matches!(
                Tri3PlaneStress::bind(&record(nodes, 1), &mesh, &catalog),
                Err(Error::InvalidTopology(_))
            ));
        }
        for mset in [0, 3, -1, 2] {
            assert!(matches!(
                Tri3PlaneStress::bind(&record([1, 2, 3], mset), &mesh, &catalog),
                Err(Error::InvalidMaterial(_))
            ));
        }
        let short = ElementRecord {
            number: 9,
            nodes: vec![1, 2],
            material_set: 1,
        };
        assert!(matches!(
            Tri3PlaneStress::bind(&short, &mesh, &catalog),
            Err(Error::InvalidTopology(_))
        ));
        let empty = Mesh::default();
        assert!(matches!(
            Tri3PlaneStress::bind(&record([1, 2, 3], 1), &empty, &catalog),
            Err(Error::MissingInput(_))
        ));
        assert!(matches!(
            Tri3PlaneStress::bind(&record([1, 2, 3], 1), &mesh, &MaterialCatalog::new()),
            Err(Error::MissingInput(_))
        ));
    }

    #[test]
    fn bind_caches_the_material() {
        let mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let tri = bind(&mesh, [1, 2, 3]);
        assert_eq!(tri.state(), Tri3State::Bound);
        assert_eq!(tri.thickness(), 1.0);
        assert_eq!(tri.material_set(), 1);
        assert_eq!(tri.param().young, 1000.0);
        assert_eq!(tri.location_matrix(), &[0; 6]);
    }

    #[test]
    fn prepare_works() {
        let mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let obs = RecordingObserver::new();
        let geo = tri.prepare(&mesh, &obs).unwrap();
        assert_eq!(tri.state(), Tri3State::Ready);
        assert_eq!(geo.area, 0.5);
        assert_eq!(geo.a, [1.0, 0.0, 0.0]);
        assert_eq!(geo.b, [-1.0, 1.0, 0.0]);
        assert_eq!(geo.c, [-1.0, 0.0, 1.0]);
        assert_eq!(tri.location_matrix(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(
            obs.events(),
            &[ElementEvent::LocationMatrixRebuilt {
                element: 1,
                location: vec![1, 2, 3, 4, 5, 6]
            }]
        );
    }

    #[test]
    fn clockwise_input_is_swapped_once() {
        let mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let obs = RecordingObserver::new();

        let mut cw = bind(&mesh, [1, 3, 2]);
        let geo = cw.prepare(&mesh, &obs).unwrap();
        assert!(geo.area > 0.0);
        assert_eq!(cw.nodes(), [0, 1, 2]);
        assert_eq!(cw.describe(), "    1        2        3           1");
        let events = obs.events();
        assert_eq!(
            events[0],
            ElementEvent::OrientationSwapped {
                element: 1,
                before: [1, 3, 2],
                after: [1, 2, 3]
            }
        );

        // same location matrix as swapping by hand
        let mut ccw = bind(&mesh, [1, 2, 3]);
        ccw.prepare(&mesh, &NoopObserver).unwrap();
        assert_eq!(cw.location_matrix(), ccw.location_matrix());

        // a second pass does not swap back
        obs.clear();
        cw.prepare(&mesh, &obs).unwrap();
        assert_eq!(cw.nodes(), [0, 1, 2]);
        assert!(!obs
            .events()
            .iter()
            .any(|e| matches!(e, ElementEvent::OrientationSwapped { .. })));
    }

    #[test]
    fn swapped_input_gives_identical_stiffness() {
        let mesh = mesh_from(&[[0.3, -0.2], [2.1, 0.4], [0.9, 1.7]]);
        let mut ccw = bind(&mesh, [1, 2, 3]);
        let mut cw = bind(&mesh, [1, 3, 2]);
        let k_ccw = ccw.calc_stiffness(&mesh, &NoopObserver).unwrap();
        let k_cw = cw.calc_stiffness(&mesh, &NoopObserver).unwrap();
        assert_eq!(k_ccw, k_cw);
        assert_eq!(ccw.location_matrix(), cw.location_matrix());
    }

    #[test]
    fn degenerate_triangles_are_rejected() {
        let collinear = mesh_from(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        let mut tri = bind(&collinear, [1, 2, 3]);
        assert!(matches!(
            tri.calc_stiffness(&collinear, &NoopObserver),
            Err(Error::DegenerateGeometry { element: 1, .. })
        ));
        assert_eq!(tri.state(), Tri3State::Bound);

        let coincident = mesh_from(&[[1.0, 1.0], [1.0, 1.0], [0.0, 3.0]]);
        let mut tri = bind(&coincident, [1, 2, 3]);
        assert!(matches!(
            tri.calc_stress(&coincident, &[0.0; 6], &NoopObserver),
            Err(Error::DegenerateGeometry { .. })
        ));

        // nearly collinear and clockwise: one swap, then still rejected
        let sliver = mesh_from(&[[0.0, 0.0], [1.0, -1e-14], [2.0, 0.0]]);
        let mut tri = bind(&sliver, [1, 3, 2]);
        assert!(matches!(
            tri.prepare(&sliver, &NoopObserver),
            Err(Error::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn location_matrix_follows_nodes_when_rejected() {
        let mut mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        tri.prepare(&mesh, &NoopObserver).unwrap();
        assert_eq!(tri.location_matrix(), &[1, 2, 3, 4, 5, 6]);

        // node 3 moves below the 1-2 edge: clockwise and nearly collinear
        mesh.nodes[2].xyz = [2.0, -1e-13, 0.0];
        assert!(matches!(
            tri.prepare(&mesh, &NoopObserver),
            Err(Error::DegenerateGeometry { element: 1, .. })
        ));
        assert_eq!(tri.nodes(), [0, 2, 1]);
        assert_eq!(tri.location_matrix(), &[1, 2, 5, 6, 3, 4]);
        assert_eq!(tri.describe(), "    1        3        2           1");
        assert_eq!(tri.state(), Tri3State::Bound);
    }

    #[test]
    fn small_area_is_reported() {
        let mesh = mesh_from(&[[0.0, 0.0], [1e-4, 0.0], [0.0, 1e-4]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let obs = RecordingObserver::new();
        tri.prepare(&mesh, &obs).unwrap();
        assert!(obs
            .events()
            .iter()
            .any(|e| matches!(e, ElementEvent::SmallArea { element: 1, .. })));

        let strict = GeometryTolerance {
            area: 1e-6,
            small_area_warning: 1e-5,
        };
        let mut tri = bind(&mesh, [1, 2, 3]).with_tolerance(strict);
        assert!(matches!(
            tri.prepare(&mesh, &obs),
            Err(Error::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn stiffness_matches_hand_calculation() {
        let mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let kk = tri.calc_stiffness(&mesh, &NoopObserver).unwrap();
        let factor = 1000.0 / 0.91;
        assert_eq!(kk.as_slice().len(), tri.stiffness_block_size());
        assert!((kk.as_slice()[0] - 0.675 * factor).abs() < 1e-10); // (0,0)
        assert!((kk.as_slice()[1] - 0.325 * factor).abs() < 1e-10); // (0,1)
        assert!((kk.as_slice()[2] - 0.675 * factor).abs() < 1e-10); // (1,1)
        assert!((kk.as_slice()[3] - (-0.5 * factor)).abs() < 1e-10); // (0,2)
        assert!((kk.as_slice()[5] - 0.5 * factor).abs() < 1e-10); // (2,2)
        assert!((kk.get(5, 5) - 0.5 * factor).abs() < 1e-10);
        assert!((kk.get(4, 4) - 0.175 * factor).abs() < 1e-10);
    }

    #[test]
    fn stiffness_is_symmetric_and_matches_dense_product() {
        let mesh = mesh_from(&[[0.3, -0.2], [2.1, 0.4], [0.9, 1.7]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let kk = tri.calc_stiffness(&mesh, &NoopObserver).unwrap();
        let geo = *tri.geometry().unwrap();
        let dense = dense_bt_d_b(&geo, tri.param());
        for i in 0..6 {
            for j in 0..6 {
                assert!((dense[(i, j)] - dense[(j, i)]).abs() < 1e-9);
                assert!((kk.get(i, j) - dense[(i, j)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn stiffness_has_rigid_body_modes() {
        let mesh = mesh_from(&[[0.3, -0.2], [2.1, 0.4], [0.9, 1.7]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let kk = tri.calc_stiffness(&mesh, &NoopObserver).unwrap().to_dense();
        let translation_x = DMatrix::from_column_slice(6, 1, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let translation_y = DMatrix::from_column_slice(6, 1, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let rotation = DMatrix::from_column_slice(6, 1, &[0.2, 0.3, -0.4, 2.1, -1.7, 0.9]);
        for mode in [translation_x, translation_y, rotation] {
            let force = &kk * mode;
            assert!(force.norm() < 1e-9, "{}", force);
        }
    }

    #[test]
    fn stiffness_is_invariant_under_translation() {
        let base = [[0.3, -0.2], [2.1, 0.4], [0.9, 1.7]];
        let mesh = mesh_from(&base);
        let moved = mesh_from(&base.map(|[x, y]| [x + 125.5, y - 42.25]));
        let k0 = bind(&mesh, [1, 2, 3]).calc_stiffness(&mesh, &NoopObserver).unwrap();
        let k1 = bind(&moved, [1, 2, 3]).calc_stiffness(&moved, &NoopObserver).unwrap();
        assert_packed_close(&k0, &k1, 1e-8);
    }

    #[test]
    fn stress_matches_hand_calculation() {
        let mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let displacement = [0.0, 0.0, 1e-3, 0.0, 0.0, 2e-3];
        let stress = tri.calc_stress(&mesh, &displacement, &NoopObserver).unwrap();
        let factor = 1000.0 / 0.91;
        assert_eq!(stress.len(), 3);
        assert!((stress[0] - factor * 1.6e-3).abs() < 1e-12);
        assert!((stress[1] - factor * 2.3e-3).abs() < 1e-12);
        assert!(stress[2].abs() < 1e-12);
        assert!((stress[0] - 1.7582417582417582).abs() < 1e-12);
        assert!((stress[1] - 2.5274725274725274).abs() < 1e-12);
    }

    #[test]
    fn constrained_dofs_contribute_zero_displacement() {
        let mut mesh = Mesh::new(vec![
            Node::new(1, [0.0, 0.0, 0.0], [true, true, true]),
            Node::new(2, [1.0, 0.0, 0.0], [false, true, true]),
            Node::new(3, [0.0, 1.0, 0.0], [true, false, true]),
        ])
        .unwrap();
        assert_eq!(mesh.number_equations(), 2);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let stress = tri.calc_stress_vector(&mesh, &[1e-3, 2e-3], &NoopObserver).unwrap();
        assert_eq!(tri.location_matrix(), &[0, 0, 1, 0, 0, 2]);
        let factor = 1000.0 / 0.91;
        assert!((stress[0] - factor * 1.6e-3).abs() < 1e-12);
        assert!((stress[1] - factor * 2.3e-3).abs() < 1e-12);

        assert!(matches!(
            tri.calc_stress(&mesh, &[1e-3], &NoopObserver),
            Err(Error::MissingInput(_))
        ));
    }

    #[test]
    fn moved_nodes_are_picked_up_on_the_next_query() {
        let mut mesh = mesh_from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = bind(&mesh, [1, 2, 3]);
        let k0 = tri.calc_stiffness(&mesh, &NoopObserver).unwrap();

        // move node 3 across edge 1-2: the element becomes clockwise
        mesh.nodes[2].xyz = [0.0, -2.0, 0.0];
        let obs = RecordingObserver::new();
        let k1 = tri.calc_stiffness(&mesh, &obs).unwrap();
        assert_eq!(tri.geometry().unwrap().area, 1.0);
        assert_eq!(tri.nodes(), [0, 2, 1]);
        assert_eq!(tri.location_matrix(), &[1, 2, 5, 6, 3, 4]);
        assert_ne!(k0, k1);
        assert!(matches!(
            obs.events()[0],
            ElementEvent::OrientationSwapped { .. }
        ));
    }
}
