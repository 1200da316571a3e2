//! Serialization of functional models.
//!
//! A model is persisted as its declaration (names and equation text) plus the
//! bound parameter values; the numeric function is rebuilt on load.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::FunctionalModel;
use crate::error::{Result, SymFitError};

/// Declaration of a [`FunctionalModel`] in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Parameter names, in order
    pub parameters: Vec<String>,

    /// Variable names, in order
    pub variables: Vec<String>,

    /// Equation text
    pub equation: String,

    /// Bound parameter values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameter_values: BTreeMap<String, f64>,
}

impl FunctionalModel {
    /// The serializable declaration of this model.
    pub fn definition(&self) -> ModelDefinition {
        ModelDefinition {
            parameters: self.parameters.clone(),
            variables: self.variables.clone(),
            equation: self.equation.to_string(),
            parameter_values: self
                .parameter_values
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        }
    }

    /// Rebuild a model from its declaration.
    pub fn from_definition(definition: &ModelDefinition) -> Result<Self> {
        let mut model = FunctionalModel::new(
            definition.parameters.as_slice(),
            definition.variables.as_slice(),
            &definition.equation,
        )?;
        if !definition.parameter_values.is_empty() {
            model.set_parameters(
                definition
                    .parameter_values
                    .iter()
                    .map(|(name, value)| (name, *value)),
            )?;
        }
        Ok(model)
    }

    /// The declaration, provided every bound value can be written as JSON.
    fn json_definition(&self) -> Result<ModelDefinition> {
        let definition = self.definition();
        if let Some((name, value)) = definition
            .parameter_values
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(SymFitError::InvalidInput(format!(
                "parameter {} is bound to {}, which JSON cannot represent",
                name, value
            )));
        }
        Ok(definition)
    }

    /// Serialize the model declaration to a JSON string.
    ///
    /// # Errors
    ///
    /// [`SymFitError::InvalidInput`] when a bound value is infinite or NaN.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.json_definition()?)?)
    }

    /// Load a model from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: ModelDefinition = serde_json::from_str(json)?;
        Self::from_definition(&definition)
    }

    /// Save the model declaration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let definition = self.json_definition()?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &definition)?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let definition: ModelDefinition = serde_json::from_reader(BufReader::new(file))?;
        Self::from_definition(&definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_json_keeps_declaration_and_bindings() {
        let mut model = FunctionalModel::new("A tau", "t", "A*exp(-t/tau)").unwrap();
        model.set_parameters([("A", 2.0), ("tau", 0.5)]).unwrap();

        let json = model.to_json().unwrap();
        let restored = FunctionalModel::from_json(&json).unwrap();

        assert_eq!(restored.parameters(), model.parameters());
        assert_eq!(restored.variables(), model.variables());
        assert_eq!(restored.parameter_value("tau"), Some(0.5));
        assert_relative_eq!(
            restored.call(&[1.0]).unwrap(),
            model.call(&[1.0]).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_definition_without_values() {
        let json = r#"{"parameters": ["a"], "variables": ["x"], "equation": "a*besselj(1, x)"}"#;
        let model = FunctionalModel::from_json(json).unwrap();
        assert!(model.is_special_function());
        assert!(model.parameter_values().is_empty());
        assert!(!model.to_json().unwrap().contains("parameter_values"));
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(matches!(
            FunctionalModel::from_json("{not json"),
            Err(SymFitError::JsonError(_))
        ));

        let json = r#"{"parameters": ["a"], "variables": ["x"], "equation": "a*x", "parameter_values": {"b": 1.0}}"#;
        assert!(matches!(
            FunctionalModel::from_json(json),
            Err(SymFitError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_non_finite_values() {
        let line = FunctionalModel::new("m b", "x", "m*x + b").unwrap();

        // Non-finite constants in the equation are printed in a parseable form
        let shifted = &line + f64::INFINITY;
        let restored = FunctionalModel::from_json(&shifted.to_json().unwrap()).unwrap();
        assert_eq!(restored.call(&[1.0, 0.0, 2.0]).unwrap(), f64::INFINITY);

        let lowered = &line - f64::INFINITY;
        let restored = FunctionalModel::from_json(&lowered.to_json().unwrap()).unwrap();
        assert_eq!(restored.call(&[1.0, 0.0, 2.0]).unwrap(), f64::NEG_INFINITY);

        let undefined = &line * f64::NAN;
        let restored = FunctionalModel::from_json(&undefined.to_json().unwrap()).unwrap();
        assert!(restored.call(&[1.0, 0.0, 2.0]).unwrap().is_nan());

        // Bound values have no JSON form
        let mut bound = line.clone();
        bound.set_parameters([("m", f64::NAN), ("b", 1.0)]).unwrap();
        assert!(matches!(bound.to_json(), Err(SymFitError::InvalidInput(_))));
        let path = std::env::temp_dir().join(format!("symfit_nan_{}.json", std::process::id()));
        assert!(matches!(bound.save_json(&path), Err(SymFitError::InvalidInput(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_file_round_trip() {
        let model = FunctionalModel::new("m b", "x", "m*x + b").unwrap();
        let path = std::env::temp_dir().join(format!("symfit_model_{}.json", std::process::id()));

        model.save_json(&path).unwrap();
        let loaded = FunctionalModel::load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.definition(), model.definition());
    }
}
