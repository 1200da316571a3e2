//! # Synthetic Data Simulation
//!
//! [`DataSimulator`] evaluates a single-variable [`FunctionalModel`] over a
//! sample grid and adds noise drawn from a configurable distribution. Every
//! setter recomputes the noise and the simulated data immediately, so
//! [`DataSimulator::data`] always reflects the current configuration.
//!
//! ## Example Usage
//!
//! ```rust
//! use symfit_rs::simulator::{DataSimulator, GridSpec};
//! use symfit_rs::FunctionalModel;
//!
//! let line = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
//! let mut simulator = DataSimulator::new(line).unwrap();
//! simulator.set_parameters([("m", 2.0), ("b", 1.0)]).unwrap();
//! simulator.set_x(GridSpec::linear(0.0, 1.0, 3)).unwrap();
//!
//! // The grid runs from max down to min
//! assert_eq!(simulator.x().to_vec(), vec![1.0, 0.5, 0.0]);
//! assert_eq!(simulator.data().to_vec(), vec![3.0, 2.0, 1.0]);
//! ```

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Triangular, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SymFitError};
use crate::model::FunctionalModel;

/// Number of points of a linear grid when neither a count nor a step is given.
pub const DEFAULT_GRID_POINTS: usize = 1000;

/// Largest grid a step size may produce.
pub const MAX_STEPPED_POINTS: usize = 10_000_000;

/// Distribution of additive noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseKind {
    /// Normal distribution with mean `center` and standard deviation `width`
    Normal,

    /// Uniform distribution on `[center - width, center + width]`
    Uniform,

    /// Triangular distribution on `[center - width, center + width]` peaking at `center`
    Triangular,
}

impl NoiseKind {
    const NAMES: [(&'static str, NoiseKind); 5] = [
        ("gaussian", NoiseKind::Normal),
        ("normal", NoiseKind::Normal),
        ("uniform", NoiseKind::Uniform),
        ("rectangular", NoiseKind::Uniform),
        ("triangular", NoiseKind::Triangular),
    ];

    /// Look up a noise kind by name.
    ///
    /// Matching is case-insensitive and accepts any substring of a known
    /// name (`"Gauss"`, `"rect"`) as well as text containing one
    /// (`"gaussian noise"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }
        Self::NAMES
            .iter()
            .find(|(known, _)| known.contains(name.as_str()) || name.contains(known))
            .map(|(_, kind)| *kind)
    }
}

/// Parameters of the additive noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSpec {
    /// Distribution, `None` for no noise
    pub kind: Option<NoiseKind>,

    /// Center of the distribution
    pub center: f64,

    /// Spread of the distribution
    pub width: f64,

    /// Factor applied to every sample
    pub amplitude: f64,

    /// Seed for reproducible noise, `None` draws from system entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            kind: None,
            center: 0.0,
            width: 1.0,
            amplitude: 1.0,
            seed: None,
        }
    }
}

impl NoiseSpec {
    /// Noise of the given kind.
    pub fn new(kind: NoiseKind, center: f64, width: f64, amplitude: f64) -> Self {
        Self {
            kind: Some(kind),
            center,
            width,
            amplitude,
            seed: None,
        }
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Draw `n` noise values; empty when no kind is set.
    ///
    /// Seeded specs return the same values on every call.
    pub fn sample(&self, n: usize) -> Result<Array1<f64>> {
        let Some(kind) = self.kind else {
            return Ok(Array1::zeros(0));
        };
        let (low, high) = (self.center - self.width, self.center + self.width);
        if !(self.width >= 0.0) || !self.center.is_finite() || !(high - low).is_finite() {
            return Err(SymFitError::InvalidInput(format!(
                "noise needs a finite center and a finite, non-negative width, got center {} and width {}",
                self.center, self.width
            )));
        }

        let mut rng = self.rng();
        let samples: Vec<f64> = match kind {
            NoiseKind::Normal => {
                let normal = Normal::new(self.center, self.width)
                    .map_err(|err| SymFitError::InvalidInput(err.to_string()))?;
                normal.sample_iter(&mut rng).take(n).collect()
            }
            NoiseKind::Uniform => Uniform::new_inclusive(low, high)
                .sample_iter(&mut rng)
                .take(n)
                .collect(),
            NoiseKind::Triangular if self.width == 0.0 => vec![self.center; n],
            NoiseKind::Triangular => {
                let triangular = Triangular::new(low, high, self.center)
                    .map_err(|err| SymFitError::InvalidInput(err.to_string()))?;
                triangular.sample_iter(&mut rng).take(n).collect()
            }
        };
        Ok(Array1::from(samples) * self.amplitude)
    }
}

/// How to build the sample grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridSpec {
    /// No points
    Empty,

    /// Points used as given
    Points(Vec<f64>),

    /// Evenly spaced points running from `max` down to `min`.
    ///
    /// `n_points` takes precedence over `step`; with neither,
    /// [`DEFAULT_GRID_POINTS`] points are used.
    Linear {
        min: f64,
        max: f64,
        n_points: Option<usize>,
        step: Option<f64>,
    },
}

impl GridSpec {
    /// `n_points` evenly spaced points from `max` down to `min`.
    pub fn linear(min: f64, max: f64, n_points: usize) -> Self {
        GridSpec::Linear {
            min,
            max,
            n_points: Some(n_points),
            step: None,
        }
    }

    /// Points `step` apart from `max` towards `min`, ending at or before `min`.
    pub fn stepped(min: f64, max: f64, step: f64) -> Self {
        GridSpec::Linear {
            min,
            max,
            n_points: None,
            step: Some(step),
        }
    }

    /// The grid points.
    pub fn points(&self) -> Result<Array1<f64>> {
        match self {
            GridSpec::Empty => Ok(Array1::zeros(0)),
            GridSpec::Points(points) => Ok(Array1::from(points.clone())),
            GridSpec::Linear {
                min,
                max,
                n_points,
                step,
            } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(SymFitError::InvalidInput(format!(
                        "grid bounds must be finite, got {} and {}",
                        min, max
                    )));
                }
                match (n_points, step) {
                    (Some(n), _) => Ok(Array1::linspace(*max, *min, *n)),
                    (None, Some(step)) => {
                        if !(*step > 0.0) {
                            return Err(SymFitError::InvalidInput(format!(
                                "grid step must be positive, got {}",
                                step
                            )));
                        }
                        let direction = if min <= max { -1.0 } else { 1.0 };
                        let intervals = ((max - min).abs() / step).floor();
                        if !intervals.is_finite() || intervals >= MAX_STEPPED_POINTS as f64 {
                            return Err(SymFitError::InvalidInput(format!(
                                "grid step {} over [{}, {}] gives more than {} points",
                                step, min, max, MAX_STEPPED_POINTS
                            )));
                        }
                        let count = intervals as usize + 1;
                        Ok(Array1::from_shape_fn(count, |i| {
                            max + direction * i as f64 * step
                        }))
                    }
                    (None, None) => Ok(Array1::linspace(*max, *min, DEFAULT_GRID_POINTS)),
                }
            }
        }
    }
}

/// Synthetic `(x, y)` data from a model plus noise.
#[derive(Debug, Clone)]
pub struct DataSimulator {
    model: FunctionalModel,
    x: Array1<f64>,
    noise_spec: NoiseSpec,
    noise: Array1<f64>,
    data: Array1<f64>,
}

impl DataSimulator {
    /// Create a simulator with an empty grid and no noise.
    ///
    /// # Errors
    ///
    /// [`SymFitError::UnsupportedOperation`] unless the model has exactly one
    /// variable.
    pub fn new(model: FunctionalModel) -> Result<Self> {
        if model.variables().len() != 1 {
            return Err(SymFitError::UnsupportedOperation(format!(
                "simulation needs a single-variable model, this one has variables ({})",
                model.variables().join(", ")
            )));
        }
        Ok(Self {
            model,
            x: Array1::zeros(0),
            noise_spec: NoiseSpec::default(),
            noise: Array1::zeros(0),
            data: Array1::zeros(0),
        })
    }

    /// The underlying model.
    pub fn model(&self) -> &FunctionalModel {
        &self.model
    }

    /// The sample grid.
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    /// The noise configuration.
    pub fn noise_spec(&self) -> &NoiseSpec {
        &self.noise_spec
    }

    /// The current noise values, one per grid point or empty.
    pub fn noise(&self) -> &Array1<f64> {
        &self.noise
    }

    /// The simulated data, one value per grid point or empty.
    pub fn data(&self) -> &Array1<f64> {
        &self.data
    }

    /// Replace the sample grid.
    pub fn set_x(&mut self, grid: GridSpec) -> Result<()> {
        self.x = grid.points()?;
        self.refresh()
    }

    /// Configure noise by distribution name.
    ///
    /// An unrecognised or absent name disables noise. The seed is kept.
    pub fn set_output_noise(
        &mut self,
        kind: Option<&str>,
        center: f64,
        width: f64,
        amplitude: f64,
    ) -> Result<()> {
        let parsed = kind.and_then(NoiseKind::from_name);
        if let (Some(name), None) = (kind, parsed) {
            log::warn!("unrecognised noise type '{}', noise disabled", name);
        }
        self.set_noise(NoiseSpec {
            kind: parsed,
            center,
            width,
            amplitude,
            seed: self.noise_spec.seed,
        })
    }

    /// Replace the noise configuration.
    pub fn set_noise(&mut self, spec: NoiseSpec) -> Result<()> {
        self.noise_spec = spec;
        self.refresh()
    }

    /// Set or clear the noise seed.
    pub fn set_seed(&mut self, seed: Option<u64>) -> Result<()> {
        self.noise_spec.seed = seed;
        self.refresh()
    }

    /// Bind model parameters and recompute the data.
    pub fn set_parameters<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.model.set_parameters(values)?;
        self.set_data()
    }

    /// Clear model parameters; the data becomes empty.
    pub fn clear_parameters(&mut self) -> Result<()> {
        self.model.clear_parameters();
        self.set_data()
    }

    fn refresh(&mut self) -> Result<()> {
        self.noise = if self.x.is_empty() {
            Array1::zeros(0)
        } else {
            self.noise_spec.sample(self.x.len())?
        };
        self.set_data()
    }

    /// Recompute the data from the grid, the model and the current noise.
    ///
    /// The data is empty when the grid is empty or some model parameter is
    /// unbound.
    pub fn set_data(&mut self) -> Result<()> {
        if self.x.is_empty() || !self.model.unbound_parameters().is_empty() {
            self.data = Array1::zeros(0);
            return Ok(());
        }

        let values = self.model.eval(&self.x)?;
        self.data = if self.noise.is_empty() {
            values
        } else {
            values + &self.noise
        };
        Ok(())
    }

    /// Simulate at ad hoc points without touching the grid or stored data.
    ///
    /// Noise is drawn for these points from the current noise configuration.
    pub fn sample(&self, points: &[f64]) -> Result<Array1<f64>> {
        if let Some(name) = self.model.unbound_parameters().first() {
            return Err(SymFitError::UnboundSymbol(name.to_string()));
        }
        let x = Array1::from(points.to_vec());
        let values = self.model.eval(&x)?;
        let noise = self.noise_spec.sample(points.len())?;
        Ok(if noise.is_empty() { values } else { values + &noise })
    }

    /// Simulate at a single point without touching the grid or stored data.
    pub fn sample_at(&self, x: f64) -> Result<f64> {
        let values = self.sample(&[x])?;
        Ok(values[0])
    }
}
