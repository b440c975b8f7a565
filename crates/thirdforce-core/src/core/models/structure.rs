use super::element::Element;
use nalgebra::{Matrix3, Vector3};

/// A single atomic site of a periodic structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// The chemical species occupying the site.
    pub species: Element,
    /// Position in fractional (direct) coordinates of the lattice.
    pub frac: Vector3<f64>,
}

/// A periodic crystal structure: a lattice plus an ordered list of sites.
///
/// The lattice is stored with one lattice vector per row, in Angstroms, the same
/// layout used by POSCAR files. Site order is significant: force sets and reports
/// are indexed by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    /// Free-form title line carried over from the source file.
    pub comment: String,
    /// Lattice vectors as rows, in Angstroms.
    pub lattice: Matrix3<f64>,
    /// Sites in file order.
    pub sites: Vec<Site>,
}

impl Structure {
    pub fn new(comment: impl Into<String>, lattice: Matrix3<f64>, sites: Vec<Site>) -> Self {
        Self {
            comment: comment.into(),
            lattice,
            sites,
        }
    }

    pub fn num_atoms(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Returns the lattice vector `a`, `b` or `c` for `axis` 0, 1 or 2.
    pub fn lattice_vector(&self, axis: usize) -> Vector3<f64> {
        self.lattice.row(axis).transpose()
    }

    /// Signed cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.lattice.determinant()
    }

    pub fn frac_to_cart(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.lattice.transpose() * frac
    }

    /// Converts a Cartesian position into fractional coordinates.
    ///
    /// Returns `None` when the lattice is singular.
    pub fn cart_to_frac(&self, cart: &Vector3<f64>) -> Option<Vector3<f64>> {
        self.lattice
            .transpose()
            .try_inverse()
            .map(|inverse| inverse * cart)
    }

    pub fn cartesian(&self, index: usize) -> Option<Vector3<f64>> {
        self.sites.get(index).map(|site| self.frac_to_cart(&site.frac))
    }

    pub fn cartesian_positions(&self) -> Vec<Vector3<f64>> {
        let to_cart = self.lattice.transpose();
        self.sites.iter().map(|site| to_cart * site.frac).collect()
    }

    pub fn fractional_positions(&self) -> impl Iterator<Item = &Vector3<f64>> + '_ {
        self.sites.iter().map(|site| &site.frac)
    }

    /// Groups consecutive sites of the same species into `(species, count)` runs.
    ///
    /// This is the grouping POSCAR species/count lines express. A species that
    /// reappears after a different one starts a new run.
    pub fn species_runs(&self) -> Vec<(Element, usize)> {
        let mut runs: Vec<(Element, usize)> = Vec::new();
        for site in &self.sites {
            match runs.last_mut() {
                Some((species, count)) if *species == site.species => *count += 1,
                _ => runs.push((site.species, 1)),
            }
        }
        runs
    }

    /// Distance between two lattice planes perpendicular to reciprocal axis `axis`.
    pub fn interplanar_spacing(&self, axis: usize) -> f64 {
        let b = self.lattice_vector((axis + 1) % 3);
        let c = self.lattice_vector((axis + 2) % 3);
        let cross = b.cross(&c);
        let norm = cross.norm();
        if norm == 0.0 {
            return 0.0;
        }
        self.volume().abs() / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn element(symbol: &str) -> Element {
        Element::from_symbol(symbol).unwrap()
    }

    fn rocksalt_like() -> Structure {
        let lattice = Matrix3::new(4.0, 0.0, 0.0, 0.0, 5.0, 0.0, 1.0, 0.0, 6.0);
        Structure::new(
            "test",
            lattice,
            vec![
                Site {
                    species: element("Na"),
                    frac: Vector3::new(0.0, 0.0, 0.0),
                },
                Site {
                    species: element("Cl"),
                    frac: Vector3::new(0.5, 0.5, 0.5),
                },
                Site {
                    species: element("Cl"),
                    frac: Vector3::new(0.25, 0.0, 0.0),
                },
                Site {
                    species: element("Na"),
                    frac: Vector3::new(0.0, 0.25, 0.0),
                },
            ],
        )
    }

    #[test]
    fn frac_to_cart_uses_lattice_rows_as_vectors() {
        let s = rocksalt_like();
        let cart = s.frac_to_cart(&Vector3::new(0.0, 0.0, 1.0));
        assert!((cart - Vector3::new(1.0, 0.0, 6.0)).norm() < TOLERANCE);
        let cart = s.cartesian(1).unwrap();
        assert!((cart - Vector3::new(2.5, 2.5, 3.0)).norm() < TOLERANCE);
    }

    #[test]
    fn cart_to_frac_inverts_frac_to_cart() {
        let s = rocksalt_like();
        let frac = Vector3::new(0.1, 0.7, 0.3);
        let back = s.cart_to_frac(&s.frac_to_cart(&frac)).unwrap();
        assert!((back - frac).norm() < 1e-10);
    }

    #[test]
    fn cart_to_frac_returns_none_for_singular_lattice() {
        let mut s = rocksalt_like();
        s.lattice = Matrix3::zeros();
        assert!(s.cart_to_frac(&Vector3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn volume_is_determinant_of_lattice() {
        let s = rocksalt_like();
        assert!((s.volume() - 120.0).abs() < TOLERANCE);
    }

    #[test]
    fn species_runs_split_on_species_change() {
        let s = rocksalt_like();
        let runs: Vec<(&str, usize)> = s
            .species_runs()
            .into_iter()
            .map(|(e, n)| (e.symbol(), n))
            .collect();
        assert_eq!(runs, vec![("Na", 1), ("Cl", 2), ("Na", 1)]);
    }

    #[test]
    fn interplanar_spacing_of_orthorhombic_cell_equals_axis_length() {
        let lattice = Matrix3::from_diagonal(&Vector3::new(3.0, 4.0, 5.0));
        let s = Structure::new("", lattice, vec![]);
        assert!((s.interplanar_spacing(0) - 3.0).abs() < TOLERANCE);
        assert!((s.interplanar_spacing(1) - 4.0).abs() < TOLERANCE);
        assert!((s.interplanar_spacing(2) - 5.0).abs() < TOLERANCE);
    }
}
