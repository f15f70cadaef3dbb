//! Positional parameter binding for callables

use crate::variant::{DataKind, DataVariant};
use crate::{Error, Result};

/// Declared shape of one callable argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub kind: DataKind,
    pub mandatory: bool,
}

/// Ordered argument declaration of a callable
pub type ParameterTypes = Vec<ParameterSpec>;

/// Positional arguments bound against a callable's declaration
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    bound: Vec<Option<DataVariant>>,
}

impl Parameters {
    /// Bind positional inputs against the declared parameter list
    ///
    /// Validation order matches dispatch semantics: the input count is
    /// checked first (the callable is not invoked on excess arguments),
    /// then each input's kind against its declared position, then the
    /// presence of every mandatory position.
    ///
    /// # Errors
    ///
    /// [`Error::TooManyArguments`] when more inputs than declared positions,
    /// [`Error::InvalidArgument`] on a positional kind mismatch and
    /// [`Error::MissingArgument`] when a mandatory position is unbound.
    pub fn bind(specs: &[ParameterSpec], inputs: Vec<DataVariant>) -> Result<Self> {
        if inputs.len() > specs.len() {
            return Err(Error::TooManyArguments {
                expected: specs.len(),
                actual: inputs.len(),
            });
        }

        let mut bound: Vec<Option<DataVariant>> = vec![None; specs.len()];
        for (position, input) in inputs.into_iter().enumerate() {
            let spec = specs[position];
            if input.kind() != spec.kind {
                return Err(Error::InvalidArgument(format!(
                    "parameter {position} expects {}, got {}",
                    spec.kind,
                    input.kind()
                )));
            }
            bound[position] = Some(input);
        }

        for (position, spec) in specs.iter().enumerate() {
            if spec.mandatory && bound[position].is_none() {
                return Err(Error::MissingArgument(format!(
                    "parameter {position} ({})",
                    spec.kind
                )));
            }
        }

        Ok(Self { bound })
    }

    /// Bound value at `position`, if any
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&DataVariant> {
        self.bound.get(position).and_then(Option::as_ref)
    }

    /// Number of declared positions
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
