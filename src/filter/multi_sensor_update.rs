use nalgebra::{DMatrix, DVector, RealField};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, Result};
use crate::filter::sigma_points;
use crate::models::factorized::FactorizedIidObservationModel;
use crate::models::measurement::{LocalObservationModel, ObservationModel};
use crate::models::NoiseKind;
use crate::quadrature::{weighted_product, PointSet, Quadrature};
use crate::utils::linalg::spd_inverse;
use crate::utils::state::GaussianState;

/// How the per-sensor information contributions are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accumulation {
    /// One sensor after the other on the calling thread
    #[default]
    Sequential,
    /// Sensors are processed on the rayon thread pool and reduced with a sum
    #[cfg(feature = "rayon")]
    Parallel,
}

/// Measurement update for `N` IID sensors in information form.
///
/// One set of sigma points over `[state; local noise]` is shared by every
/// sensor. Each sensor adds `A_i^T S_i^-1 A_i` to the information matrix and
/// `A_i^T S_i^-1 (y_i - mean_y_i)` to the information vector, where
/// `A_i = C_yx C_xx^-1` regresses its observation on the state and
/// `S_i = C_yy - C_yx C_xx^-1 C_xy` is its covariance given the state. The cost
/// is one `dy x dy` inverse per sensor plus one `dx x dx` inverse, instead of
/// one `N dy x N dy` inverse for the joint innovation.
#[derive(Debug, Clone)]
pub struct MultiSensorSigmaPointUpdate<T: RealField> {
    noise: GaussianState<T>,
    noise_kind: NoiseKind,
    accumulation: Accumulation,
}

/// Everything a sensor contribution needs, read-only for the whole update.
struct SensorFusion<'a, T: RealField, M: LocalObservationModel<T>, Q> {
    model: &'a FactorizedIidObservationModel<T, M>,
    quadrature: &'a Q,
    p_x: &'a PointSet<T>,
    p_q: &'a PointSet<T>,
    x_centered: &'a DMatrix<T>,
    c_xx_inv: &'a DMatrix<T>,
    noise: &'a GaussianState<T>,
    noise_kind: NoiseKind,
    y: &'a DVector<T>,
}

impl<'a, T, M, Q> SensorFusion<'a, T, M, Q>
where
    T: RealField + Copy,
    M: LocalObservationModel<T>,
    Q: Quadrature<T>,
{
    /// `(T_i A_i, T_i (y_i - mean_y))` with `T_i = A_i^T S_i^-1`
    fn contribution(&self, sensor: usize) -> Result<(DMatrix<T>, DVector<T>)> {
        let model = self.model;
        let p_y = self.quadrature.propagate_points(
            |x, w| model.local_observation(sensor, x, w),
            self.p_x,
            self.p_q,
        )?;
        let dy = model.local_model().observation_dimension();
        check_dimension("local observation", dy, p_y.dimension())?;

        let mean_y = p_y.mean();
        let c_yy = p_y.covariance();
        let c_xy = weighted_product(
            self.x_centered,
            self.p_x.covariance_weights(),
            &p_y.centered_points(),
        );
        let c_yx = c_xy.transpose();

        let a_i = &c_yx * self.c_xx_inv;
        let mut c_yy_given_x = c_yy - &a_i * &c_xy;
        if self.noise_kind.is_additive() {
            c_yy_given_x += &self.noise.cov;
        }
        let c_yy_given_x_inv = spd_inverse(&c_yy_given_x, "innovation covariance")?;
        let t_i = a_i.transpose() * c_yy_given_x_inv;

        let y_i = model.local_measurement(self.y, sensor);
        log::trace!("sensor {} fused", sensor);
        Ok((&t_i * &a_i, t_i * (y_i - mean_y)))
    }
}

impl<T: RealField + Copy> MultiSensorSigmaPointUpdate<T> {
    pub const NAME: &'static str = "MultiSensorSigmaPointUpdate";
    pub const DESCRIPTION: &'static str = "Multi-sensor sigma point update for a joint model of \
        IID local observation models, fused in information form";

    /// `noise` is the noise of one sensor, shared by all of them.
    pub fn new(noise: GaussianState<T>, noise_kind: NoiseKind) -> MultiSensorSigmaPointUpdate<T> {
        MultiSensorSigmaPointUpdate {
            noise,
            noise_kind,
            accumulation: Accumulation::default(),
        }
    }

    /// Takes the noise kind from the local model and checks the noise against it.
    pub fn for_model<M: LocalObservationModel<T>>(
        model: &FactorizedIidObservationModel<T, M>,
        noise: GaussianState<T>,
    ) -> Result<MultiSensorSigmaPointUpdate<T>> {
        noise.check_dimension("local observation noise", model.local_model().noise_dimension())?;
        Ok(MultiSensorSigmaPointUpdate::new(
            noise,
            model.local_model().noise_kind(),
        ))
    }

    pub fn with_accumulation(mut self, accumulation: Accumulation) -> MultiSensorSigmaPointUpdate<T> {
        self.accumulation = accumulation;
        self
    }

    pub fn noise(&self) -> &GaussianState<T> {
        &self.noise
    }

    pub fn accumulation(&self) -> Accumulation {
        self.accumulation
    }

    /// Posterior belief given the joint measurement `y` of all sensors.
    pub fn update<M: LocalObservationModel<T>, Q: Quadrature<T>>(
        &self,
        model: &FactorizedIidObservationModel<T, M>,
        quadrature: &Q,
        prior: &GaussianState<T>,
        y: &DVector<T>,
    ) -> Result<GaussianState<T>> {
        let dx = model.state_dimension();
        let local = model.local_model();
        prior.check_dimension("prior", dx)?;
        self.noise.check_dimension("local observation noise", local.noise_dimension())?;
        check_dimension("joint measurement", model.observation_dimension(), y.len())?;
        if self.noise_kind.is_additive() {
            check_dimension(
                "additive local observation noise",
                local.observation_dimension(),
                self.noise.dimension(),
            )?;
        }

        // the noise is IID so one transform serves every sensor
        let (p_x, p_q) = sigma_points(quadrature, prior, &self.noise, self.noise_kind)?;
        let mean_x = p_x.mean();
        let x_centered = p_x.centered_points();
        let c_xx = p_x.covariance();
        let c_xx_inv = spd_inverse(&c_xx, "state covariance")?;

        let fusion = SensorFusion {
            model,
            quadrature,
            p_x: &p_x,
            p_q: &p_q,
            x_centered: &x_centered,
            c_xx_inv: &c_xx_inv,
            noise: &self.noise,
            noise_kind: self.noise_kind,
            y,
        };
        let (c, d) = self.accumulate(&fusion, model.count_local_models())?;

        let cov = spd_inverse(&c, "posterior information matrix")?;
        let x = mean_x + &cov * d;
        log::debug!(
            "multi-sensor update: {} sensors, state dimension {}, {} points",
            model.count_local_models(),
            dx,
            p_x.count()
        );
        GaussianState::new(x, cov)
    }

    /// Same as [`MultiSensorSigmaPointUpdate::update`], writing into `belief`.
    /// On error `belief` is left untouched.
    pub fn update_in_place<M: LocalObservationModel<T>, Q: Quadrature<T>>(
        &self,
        model: &FactorizedIidObservationModel<T, M>,
        quadrature: &Q,
        belief: &mut GaussianState<T>,
        y: &DVector<T>,
    ) -> Result<()> {
        let posterior = self.update(model, quadrature, belief, y)?;
        *belief = posterior;
        Ok(())
    }

    /// Information matrix `C` and information vector `D` after all sensors.
    fn accumulate<M: LocalObservationModel<T>, Q: Quadrature<T>>(
        &self,
        fusion: &SensorFusion<T, M, Q>,
        sensors: usize,
    ) -> Result<(DMatrix<T>, DVector<T>)> {
        let dx = fusion.c_xx_inv.nrows();
        match self.accumulation {
            Accumulation::Sequential => {
                let mut c = fusion.c_xx_inv.clone();
                let mut d = DVector::zeros(dx);
                for i in 0..sensors {
                    let (c_i, d_i) = fusion.contribution(i)?;
                    c += c_i;
                    d += d_i;
                }
                Ok((c, d))
            }
            #[cfg(feature = "rayon")]
            Accumulation::Parallel => {
                let (c_sum, d_sum) = (0..sensors)
                    .into_par_iter()
                    .map(|i| fusion.contribution(i))
                    .try_reduce(
                        || (DMatrix::zeros(dx, dx), DVector::zeros(dx)),
                        |(c_a, d_a), (c_b, d_b)| Ok((c_a + c_b, d_a + d_b)),
                    )?;
                Ok((c_sum + fusion.c_xx_inv, d_sum))
            }
        }
    }
}
