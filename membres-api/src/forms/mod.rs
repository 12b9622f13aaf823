/// Form definitions
///
/// A form lists its fields (kind, requirement, whether the current user may
/// change them) and binds a submitted payload to the values a model needs.
/// Fields a user may not change are forced to their default on binding;
/// submitted values for them are ignored.
///
/// - [`registration`]: membership fee payments
/// - [`membership`]: new membership with its main beneficiary
/// - [`transformers`]: conversions between model values and input strings

pub mod membership;
pub mod registration;
pub mod transformers;

use serde::Serialize;

use transformers::TransformError;

/// Input widget of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Date,
    Money,
    Choice,
    Checkbox,

    /// Free text resolved to an entity, see [`transformers`]
    Autocomplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            disabled: false,
            choices: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }
}

/// Field list as sent to clients
#[derive(Debug, Clone, Serialize)]
pub struct Form {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl Form {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Forms depending on the current user cannot be built anonymously
    #[error("Form requires an authenticated user")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("{field}: {source}")]
    Transform {
        field: &'static str,
        #[source]
        source: TransformError,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl FormError {
    pub fn missing(field: &'static str) -> Self {
        FormError::Invalid {
            field,
            message: "This value is required".to_string(),
        }
    }

    pub fn transform(field: &'static str) -> impl FnOnce(TransformError) -> Self {
        move |source| match source {
            TransformError::DatabaseError(e) => FormError::DatabaseError(e),
            source => FormError::Transform { field, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = FieldSpec::new("date", "Date", FieldKind::Date)
            .required()
            .disabled(true);

        assert!(field.required);
        assert!(field.disabled);
        assert!(field.choices.is_empty());
    }

    #[test]
    fn test_choices_skipped_when_empty() {
        let json = serde_json::to_value(FieldSpec::new("x", "X", FieldKind::Text)).unwrap();
        assert!(json.get("choices").is_none());
        assert_eq!(json["kind"], "text");
    }
}
