//! Multi-step form wizard
//!
//! Steps partition the schema's fields. `next` validates only the active
//! step and never advances past an error; `previous` goes back without
//! revalidating; `submit` is only reachable from the last step and
//! validates everything.

use crate::schema::Schema;
use crate::{FormError, FormResult, ValidationErrors};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// One wizard step and the fields it owns
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub title: String,
    pub fields: Vec<String>,
}

impl Step {
    pub fn new<T: Into<String>>(title: T, fields: &[&str]) -> Self {
        Self {
            title: title.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn owns(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Mutable wizard state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    /// Zero-based index of the active step
    pub current_step_index: usize,
    pub field_values: Map<String, Value>,
    pub validation_errors: ValidationErrors,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    name: String,
    schema: Schema,
    steps: Vec<Step>,
    state: FormState,
}

impl Wizard {
    /// Create a wizard. Without steps the whole schema is one step.
    pub fn new<N: Into<String>>(name: N, schema: Schema, steps: Vec<Step>) -> Self {
        let steps = if steps.is_empty() {
            let fields: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
            vec![Step::new("Form", &fields)]
        } else {
            steps
        };

        Self {
            name: name.into(),
            schema,
            steps,
            state: FormState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn current_step_index(&self) -> usize {
        self.state.current_step_index
    }

    pub fn current_step(&self) -> &Step {
        // index is kept within bounds by every transition
        &self.steps[self.state.current_step_index.min(self.steps.len() - 1)]
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step_index + 1 == self.steps.len()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.state.validation_errors
    }

    /// Errors belonging to the fields of step `index`
    pub fn errors_for_step(&self, index: usize) -> ValidationErrors {
        match self.steps.get(index) {
            Some(step) => self
                .state
                .validation_errors
                .subset(step.fields.iter().map(String::as_str)),
            None => ValidationErrors::new(),
        }
    }

    /// Indices of steps that currently have errors
    pub fn steps_with_errors(&self) -> Vec<usize> {
        (0..self.steps.len())
            .filter(|&i| !self.errors_for_step(i).is_empty())
            .collect()
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.state.field_values.get(field)
    }

    /// Set a field value; any stale error on the field is dropped
    pub fn set_field<V: Into<Value>>(&mut self, field: &str, value: V) -> FormResult<()> {
        if self.schema.field(field).is_none() {
            return Err(FormError::UnknownField(field.to_string()));
        }
        self.state
            .field_values
            .insert(field.to_string(), value.into());
        self.state.validation_errors.remove(field);
        Ok(())
    }

    pub fn clear_field(&mut self, field: &str) {
        self.state.field_values.remove(field);
        self.state.validation_errors.remove(field);
    }

    /// Validate the active step and advance (bounded at the last step).
    ///
    /// On failure the step index is unchanged and the step's errors are
    /// stored in the state and returned.
    pub fn next(&mut self) -> FormResult<usize> {
        let step = self.current_step().clone();
        let errors = self
            .schema
            .validate_fields(&self.state.field_values, step.fields.iter().map(String::as_str));

        self.state
            .validation_errors
            .clear_fields(step.fields.iter().map(String::as_str));

        if !errors.is_empty() {
            debug!(
                wizard = %self.name,
                step = self.state.current_step_index,
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Step validation failed"
            );
            self.state.validation_errors.merge(errors.clone());
            return Err(FormError::Invalid(errors));
        }

        if !self.is_last_step() {
            self.state.current_step_index += 1;
        }
        debug!(wizard = %self.name, step = self.state.current_step_index, "Advanced");
        Ok(self.state.current_step_index)
    }

    /// Go back one step (bounded at the first); no validation
    pub fn previous(&mut self) -> usize {
        self.state.current_step_index = self.state.current_step_index.saturating_sub(1);
        self.state.current_step_index
    }

    /// Validate everything and build the outbound payload.
    ///
    /// Errors are stored per field so [`Wizard::errors_for_step`] can show
    /// them, but the wizard stays on the last step. A successful submit
    /// resets the state.
    pub fn submit(&mut self) -> FormResult<Map<String, Value>> {
        if !self.is_last_step() {
            return Err(FormError::NotOnLastStep {
                current: self.state.current_step_index + 1,
                last: self.steps.len(),
            });
        }

        let errors = self.schema.validate(&self.state.field_values);
        if !errors.is_empty() {
            debug!(
                wizard = %self.name,
                steps = ?self.steps_with(&errors),
                "Submit validation failed"
            );
            self.state.validation_errors = errors.clone();
            return Err(FormError::Invalid(errors));
        }

        let payload = self.schema.payload(&self.state.field_values);
        info!(wizard = %self.name, fields = payload.len(), "Form submitted");
        self.reset();
        Ok(payload)
    }

    pub fn reset(&mut self) {
        self.state = FormState::default();
    }

    fn steps_with(&self, errors: &ValidationErrors) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| errors.fields().any(|f| step.owns(f)))
            .map(|(i, _)| i)
            .collect()
    }
}
