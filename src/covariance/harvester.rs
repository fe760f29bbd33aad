/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::shift::keplerian_stm;
use super::{
    CovarianceAstroSnafu, CovarianceError, IncompatibleRepresentationSnafu, StmUnavailableSnafu,
};
use crate::cosmic::{AstroError, Orbit, OrbitType, PositionAngle, State};
use crate::linalg::Matrix6;
use snafu::{ensure, ResultExt};

/// Provides the state transition matrix, from the initial state to the provided state, of a propagation.
///
/// The STM is expressed in the working representation of the propagation: the frame of the propagated
/// states, with the orbit type and position angle returned by this harvester.
pub trait StmHarvester {
    /// Returns the state transition matrix from the initial state to this state
    fn state_transition_matrix(&self, state: &Orbit) -> Result<Matrix6<f64>, CovarianceError>;

    /// Orbit type of the propagation parameters
    fn orbit_type(&self) -> OrbitType;

    /// Position angle of the propagation parameters
    fn position_angle(&self) -> PositionAngle;
}

/// Harvests the Cartesian STM integrated alongside the state by a numerical propagator.
///
/// The STM is read from the state itself, so that states stored in a trajectory provide the same matrix
/// as the states returned by the propagator.
#[derive(Copy, Clone, Debug, Default)]
pub struct CartesianStmHarvester;

impl StmHarvester for CartesianStmHarvester {
    fn state_transition_matrix(&self, state: &Orbit) -> Result<Matrix6<f64>, CovarianceError> {
        state
            .stm()
            .map_err(|_| CovarianceError::StmUnavailable { epoch: state.epoch })
    }

    fn orbit_type(&self) -> OrbitType {
        OrbitType::Cartesian
    }

    fn position_angle(&self) -> PositionAngle {
        PositionAngle::True
    }
}

/// Analytical two body STM in Keplerian mean elements, from the initial orbit to any later (or earlier) state.
#[derive(Copy, Clone, Debug)]
pub struct KeplerianStmHarvester {
    initial: Orbit,
    sma_km: f64,
}

impl KeplerianStmHarvester {
    /// Initializes this harvester from the initial orbit of the propagation, which must be elliptical.
    pub fn new(initial: Orbit) -> Result<Self, CovarianceError> {
        ensure!(
            initial.frame.is_inertial(),
            IncompatibleRepresentationSnafu {
                orbit_type: OrbitType::Keplerian,
                frame: initial.frame.name
            }
        );
        let ecc = initial.ecc();
        if ecc >= 1.0 {
            return Err(AstroError::NotElliptical {
                ecc,
                action: "Keplerian STM",
            })
            .context(CovarianceAstroSnafu);
        }
        Ok(Self {
            initial,
            sma_km: initial.sma_km(),
        })
    }
}

impl StmHarvester for KeplerianStmHarvester {
    fn state_transition_matrix(&self, state: &Orbit) -> Result<Matrix6<f64>, CovarianceError> {
        ensure!(
            state.frame == self.initial.frame,
            StmUnavailableSnafu { epoch: state.epoch }
        );
        Ok(keplerian_stm(
            self.initial.frame.mu_km3_s2(),
            self.sma_km,
            state.epoch - self.initial.epoch,
        ))
    }

    fn orbit_type(&self) -> OrbitType {
        OrbitType::Keplerian
    }

    fn position_angle(&self) -> PositionAngle {
        PositionAngle::Mean
    }
}
