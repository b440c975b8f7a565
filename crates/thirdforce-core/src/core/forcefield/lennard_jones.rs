use super::params::{LennardJonesParams, SpeciesParam};
use super::potentials::{lennard_jones_12_6, lennard_jones_12_6_derivative, lorentz_berthelot};
use super::traits::{ForceEvaluator, ForceFieldError};
use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use std::path::Path;
use tracing::trace;

/// Periodic 12-6 Lennard-Jones evaluator.
///
/// All periodic images within the cutoff contribute, including an atom's own
/// images, so small supercells are handled correctly.
#[derive(Debug, Clone)]
pub struct LennardJonesEvaluator {
    params: LennardJonesParams,
}

struct PairVisit {
    i: usize,
    separation: Vector3<f64>,
    sigma: f64,
    epsilon: f64,
}

impl LennardJonesEvaluator {
    pub fn new(params: LennardJonesParams) -> Self {
        Self { params }
    }

    pub fn from_path(path: &Path) -> Result<Self, ForceFieldError> {
        Ok(Self::new(LennardJonesParams::load(path)?))
    }

    pub fn params(&self) -> &LennardJonesParams {
        &self.params
    }

    /// Total potential energy in eV.
    pub fn energy(&self, structure: &Structure) -> Result<f64, ForceFieldError> {
        let mut energy = 0.0;
        self.visit_pairs(structure, |pair| {
            energy += 0.5 * lennard_jones_12_6(pair.separation.norm(), pair.sigma, pair.epsilon);
        })?;
        Ok(energy)
    }

    fn site_params(&self, structure: &Structure) -> Result<Vec<SpeciesParam>, ForceFieldError> {
        structure
            .sites
            .iter()
            .map(|site| {
                let symbol = site.species.symbol();
                self.params
                    .get(symbol)
                    .copied()
                    .ok_or_else(|| ForceFieldError::MissingParameters {
                        species: symbol.to_string(),
                    })
            })
            .collect()
    }

    /// Number of lattice translations to try along each axis so that every image
    /// within the cutoff is reached, even for sites outside the home cell.
    fn image_range(structure: &Structure, cutoff: f64) -> [i64; 3] {
        let mut range = [0i64; 3];
        for (axis, slot) in range.iter_mut().enumerate() {
            let spacing = structure.interplanar_spacing(axis);
            if spacing <= 0.0 {
                continue;
            }
            let (min, max) = structure
                .fractional_positions()
                .map(|f| f[axis])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
            let span = if structure.is_empty() { 0.0 } else { max - min };
            *slot = (cutoff / spacing + span).ceil() as i64;
        }
        range
    }

    fn visit_pairs(
        &self,
        structure: &Structure,
        mut visit: impl FnMut(PairVisit),
    ) -> Result<(), ForceFieldError> {
        let site_params = self.site_params(structure)?;
        let cutoff = self.params.globals.cutoff;
        let positions = structure.cartesian_positions();
        let [ra, rb, rc] = Self::image_range(structure, cutoff);
        let (a, b, c) = (
            structure.lattice_vector(0),
            structure.lattice_vector(1),
            structure.lattice_vector(2),
        );
        trace!(ra, rb, rc, "Lennard-Jones image range");

        for na in -ra..=ra {
            for nb in -rb..=rb {
                for nc in -rc..=rc {
                    let home = na == 0 && nb == 0 && nc == 0;
                    let shift = a * na as f64 + b * nb as f64 + c * nc as f64;
                    for (i, pi) in positions.iter().enumerate() {
                        for (j, pj) in positions.iter().enumerate() {
                            if home && i == j {
                                continue;
                            }
                            let separation = pj + shift - pi;
                            if separation.norm() >= cutoff {
                                continue;
                            }
                            let (sigma, epsilon) = lorentz_berthelot(
                                site_params[i].sigma,
                                site_params[i].epsilon,
                                site_params[j].sigma,
                                site_params[j].epsilon,
                            );
                            visit(PairVisit {
                                i,
                                separation,
                                sigma,
                                epsilon,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl ForceEvaluator for LennardJonesEvaluator {
    fn name(&self) -> &str {
        "lennard-jones"
    }

    fn compute_forces(&mut self, structure: &Structure) -> Result<Vec<Vector3<f64>>, ForceFieldError> {
        let mut forces = vec![Vector3::zeros(); structure.num_atoms()];
        self.visit_pairs(structure, |pair| {
            let dist = pair.separation.norm();
            let dvdr = lennard_jones_12_6_derivative(dist, pair.sigma, pair.epsilon);
            forces[pair.i] += pair.separation * (dvdr / dist);
        })?;
        Ok(forces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::GlobalParams;
    use crate::core::models::element::Element;
    use crate::core::models::structure::Site;
    use nalgebra::Matrix3;
    use std::collections::HashMap;

    const SIGMA: f64 = 2.0;
    const EPSILON: f64 = 0.5;

    fn argon_params(cutoff: f64) -> LennardJonesParams {
        let mut species = HashMap::new();
        species.insert(
            "Ar".to_string(),
            SpeciesParam {
                epsilon: EPSILON,
                sigma: SIGMA,
            },
        );
        LennardJonesParams {
            globals: GlobalParams { cutoff },
            species,
        }
    }

    fn argon_cell(edge: f64, fracs: &[[f64; 3]]) -> Structure {
        let ar = Element::from_symbol("Ar").unwrap();
        Structure::new(
            "Ar",
            Matrix3::from_diagonal_element(edge),
            fracs
                .iter()
                .map(|f| Site {
                    species: ar,
                    frac: Vector3::new(f[0], f[1], f[2]),
                })
                .collect(),
        )
    }

    #[test]
    fn isolated_dimer_forces_are_equal_and_opposite() {
        let structure = argon_cell(30.0, &[[0.5, 0.5, 0.5], [0.56, 0.5, 0.5]]);
        let mut evaluator = LennardJonesEvaluator::new(argon_params(6.0));
        let forces = evaluator.compute_forces(&structure).unwrap();

        assert_eq!(forces.len(), 2);
        assert!((forces[0] + forces[1]).norm() < 1e-12);
        // 1.8 A separation is inside the minimum: atom 0 is pushed towards -x.
        assert!(forces[0].x < 0.0);
        assert!(forces[0].y.abs() < 1e-12 && forces[0].z.abs() < 1e-12);
    }

    #[test]
    fn dimer_at_pair_minimum_feels_no_force() {
        let r_min = 2f64.powf(1.0 / 6.0) * SIGMA;
        let edge = 30.0;
        let structure = argon_cell(edge, &[[0.5, 0.5, 0.5], [0.5 + r_min / edge, 0.5, 0.5]]);
        let mut evaluator = LennardJonesEvaluator::new(argon_params(6.0));
        let forces = evaluator.compute_forces(&structure).unwrap();
        assert!(forces.iter().all(|f| f.norm() < 1e-10));
    }

    #[test]
    fn symmetric_lattice_site_has_zero_force() {
        let structure = argon_cell(3.0, &[[0.0, 0.0, 0.0]]);
        let mut evaluator = LennardJonesEvaluator::new(argon_params(7.0));
        let forces = evaluator.compute_forces(&structure).unwrap();
        assert!(forces[0].norm() < 1e-10);
        assert!(evaluator.energy(&structure).unwrap() < 0.0);
    }

    #[test]
    fn periodic_images_contribute_in_small_cells() {
        // With a 4 A cell the neighbour at 1.2 A and its image at 2.8 A both lie
        // within the cutoff and push in opposite directions.
        let structure = argon_cell(4.0, &[[0.0, 0.0, 0.0], [0.3, 0.0, 0.0]]);
        let mut periodic = LennardJonesEvaluator::new(argon_params(3.0));
        let forces = periodic.compute_forces(&structure).unwrap();

        let d_near = 1.2;
        let d_far = 2.8;
        let expected_x = lennard_jones_12_6_derivative(d_near, SIGMA, EPSILON)
            - lennard_jones_12_6_derivative(d_far, SIGMA, EPSILON);
        assert!((forces[0].x - expected_x).abs() < 1e-9);
    }

    #[test]
    fn forces_are_negative_energy_gradient() {
        let structure = argon_cell(
            6.0,
            &[[0.0, 0.0, 0.0], [0.41, 0.05, 0.0], [0.1, 0.52, 0.47]],
        );
        let mut evaluator = LennardJonesEvaluator::new(argon_params(5.0));
        let forces = evaluator.compute_forces(&structure).unwrap();

        let h = 1e-5;
        for atom in 0..structure.num_atoms() {
            for axis in 0..3 {
                let mut plus = structure.clone();
                let mut minus = structure.clone();
                plus.sites[atom].frac[axis] += h / 6.0;
                minus.sites[atom].frac[axis] -= h / 6.0;
                let numeric = -(evaluator.energy(&plus).unwrap()
                    - evaluator.energy(&minus).unwrap())
                    / (2.0 * h);
                assert!(
                    (numeric - forces[atom][axis]).abs() < 1e-5,
                    "atom {} axis {}: numeric {} analytic {}",
                    atom,
                    axis,
                    numeric,
                    forces[atom][axis]
                );
            }
        }
    }

    #[test]
    fn missing_species_parameters_is_an_error() {
        let si = Element::from_symbol("Si").unwrap();
        let structure = Structure::new(
            "Si",
            Matrix3::from_diagonal_element(5.0),
            vec![Site {
                species: si,
                frac: Vector3::zeros(),
            }],
        );
        let mut evaluator = LennardJonesEvaluator::new(argon_params(4.0));
        match evaluator.compute_forces(&structure) {
            Err(ForceFieldError::MissingParameters { species }) => assert_eq!(species, "Si"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
