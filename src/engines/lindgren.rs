//! Lindgren/SPDE simulation backend contract.
//!
//! The Lindgren process samples a Gaussian field whose precision matrix comes
//! from the SPDE discretization `(kappa^2 M - L)` on a simplicial mesh, with
//! `kappa` derived from the process range, `M` the mesh measure matrix, and
//! `L` the mesh Laplace matrix. Those mesh collaborators (`vertices`,
//! `laplace_matrix`, `measure_matrix`) are not provided by this crate's
//! domain kinds, so preprocessing guards the mesh requirement; a mesh-capable
//! implementation plugs in through [`crate::engines::FieldBackend`].

use crate::core::{LindgrenProcess, Result, SimulationError};
use crate::engines::Artifact;
use crate::geometry::Domain;

pub fn preprocess(process: &LindgrenProcess, domain: &Domain) -> Result<Artifact> {
    let kind = match domain {
        Domain::Grid(_) => "grid",
        Domain::View(_) => "grid view",
        Domain::Points(_) => "point set",
    };
    Err(SimulationError::UnsupportedMethod(format!(
        "Lindgren process (range {}, sill {}) requires a mesh domain, got a {kind}",
        process.range, process.sill
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CartesianGrid;

    #[test]
    fn non_mesh_domains_are_rejected() {
        let process = LindgrenProcess {
            range: 10.0,
            sill: 1.0,
        };
        let domain = Domain::Grid(CartesianGrid::new(vec![8, 8]));
        assert!(matches!(
            preprocess(&process, &domain),
            Err(SimulationError::UnsupportedMethod(_))
        ));
    }
}
