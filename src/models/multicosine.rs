//! Sum of cosines at fixed frequencies.

use std::ops::{Deref, DerefMut};

use crate::error::{Result, SymFitError};
use crate::model::FunctionalModel;

/// `f(t) = Σ A_i·cos(2π·f_i·t + phi_i)` for a fixed list of frequencies `f_i`.
///
/// The parameters are `A_1..A_N` followed by `phi_1..phi_N`; the variable is
/// `t`. A `Multicosine` dereferences to its [`FunctionalModel`], so it can be
/// called, bound and fitted like any other model.
///
/// ```rust
/// use symfit_rs::models::Multicosine;
///
/// let signal = Multicosine::new(&[1.0, 3.0]).unwrap();
/// assert_eq!(signal.parameters(), &["A_1", "A_2", "phi_1", "phi_2"]);
/// assert_eq!(signal.variables(), &["t"]);
/// ```
#[derive(Debug, Clone)]
pub struct Multicosine {
    frequencies: Vec<f64>,
    model: FunctionalModel,
}

impl Multicosine {
    /// Build the model for the given frequencies.
    ///
    /// # Errors
    ///
    /// [`SymFitError::InvalidInput`] for an empty list or a non-finite frequency.
    pub fn new(frequencies: &[f64]) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(SymFitError::InvalidInput(
                "Multicosine needs at least one frequency".to_string(),
            ));
        }
        if let Some(f) = frequencies.iter().find(|f| !f.is_finite()) {
            return Err(SymFitError::InvalidInput(format!(
                "frequency {} is not finite",
                f
            )));
        }

        let n = frequencies.len();
        let parameters: Vec<String> = (1..=n)
            .map(|i| format!("A_{}", i))
            .chain((1..=n).map(|i| format!("phi_{}", i)))
            .collect();
        let equation = Self::equation_text(frequencies);
        log::debug!("multicosine equation: {}", equation);

        let model = FunctionalModel::new(parameters, "t", &equation)?;
        Ok(Self {
            frequencies: frequencies.to_vec(),
            model,
        })
    }

    /// The generated equation text.
    pub fn equation_text(frequencies: &[f64]) -> String {
        frequencies
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let frequency = if *f < 0.0 {
                    format!("({})", f)
                } else {
                    f.to_string()
                };
                format!("A_{0}*cos(2*pi*{1}*t + phi_{0})", i + 1, frequency)
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// The frequencies, in order.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// The underlying model.
    pub fn into_model(self) -> FunctionalModel {
        self.model
    }
}

impl Deref for Multicosine {
    type Target = FunctionalModel;

    fn deref(&self) -> &FunctionalModel {
        &self.model
    }
}

impl DerefMut for Multicosine {
    fn deref_mut(&mut self) -> &mut FunctionalModel {
        &mut self.model
    }
}

impl From<Multicosine> for FunctionalModel {
    fn from(multicosine: Multicosine) -> Self {
        multicosine.model
    }
}
