//! Form descriptors returned by the `GET` form endpoints.
//!
//! Clients render these into HTML; field names match what the `POST`
//! handlers accept.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    DISPLAY_NAME_MAX, EMAIL_MAX, MOBILE_MAX, PROFILE_TEXT_MAX, RegistrationField, Role,
};

/// Input widget kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Email address.
    Email,
    /// Masked input.
    Password,
    /// One of [`FieldDescriptor::choices`].
    Select,
    /// Telephone number.
    Tel,
}

/// One option of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Choice {
    /// Submitted value.
    #[schema(example = "student")]
    pub value: String,
    /// Text shown to the user.
    #[schema(example = "Student")]
    pub label: String,
}

/// A single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Form field name expected by the `POST` handler.
    #[schema(example = "email")]
    pub name: String,
    /// Human readable label.
    #[schema(example = "Email")]
    pub label: String,
    /// Widget to render.
    pub kind: FieldKind,
    /// Whether a blank value is rejected.
    pub required: bool,
    /// Character limit, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Allowed values of a select field.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl FieldDescriptor {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_owned(),
            label: label.to_owned(),
            kind,
            required: true,
            max_length: None,
            choices: Vec::new(),
        }
    }

    fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// An empty form ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FormDescriptor {
    /// Form identifier.
    #[schema(example = "register")]
    pub form: String,
    /// Path the form posts to.
    #[schema(example = "/register/")]
    pub action: String,
    /// Fields in display order.
    pub fields: Vec<FieldDescriptor>,
    /// Field name to messages; empty for a fresh form.
    pub errors: std::collections::BTreeMap<String, Vec<String>>,
}

fn registration_field(field: RegistrationField) -> FieldDescriptor {
    match field {
        RegistrationField::Name => {
            FieldDescriptor::new("name", "Name", FieldKind::Text).max_length(DISPLAY_NAME_MAX)
        }
        RegistrationField::Email => {
            FieldDescriptor::new("email", "Email", FieldKind::Email).max_length(EMAIL_MAX)
        }
        RegistrationField::Password1 => {
            FieldDescriptor::new("password1", "Password", FieldKind::Password)
        }
        RegistrationField::Password2 => {
            FieldDescriptor::new("password2", "Password confirmation", FieldKind::Password)
        }
        RegistrationField::Role => FieldDescriptor {
            choices: Role::ALL
                .into_iter()
                .map(|role| Choice {
                    value: role.as_str().to_owned(),
                    label: role.label().to_owned(),
                })
                .collect(),
            ..FieldDescriptor::new("role", "Role", FieldKind::Select)
        },
        RegistrationField::Country => {
            FieldDescriptor::new("country", "Country", FieldKind::Text)
                .max_length(PROFILE_TEXT_MAX)
        }
        RegistrationField::Nationality => {
            FieldDescriptor::new("nationality", "Nationality", FieldKind::Text)
                .max_length(PROFILE_TEXT_MAX)
        }
        RegistrationField::Mobile => {
            FieldDescriptor::new("mobile", "Mobile", FieldKind::Tel).max_length(MOBILE_MAX)
        }
    }
}

/// Descriptor for `GET /register/`.
pub fn registration_form() -> FormDescriptor {
    FormDescriptor {
        form: "register".to_owned(),
        action: "/register/".to_owned(),
        fields: RegistrationField::ALL
            .into_iter()
            .map(registration_field)
            .collect(),
        errors: std::collections::BTreeMap::new(),
    }
}

/// Descriptor for `GET /login/`.
pub fn login_form() -> FormDescriptor {
    FormDescriptor {
        form: "login".to_owned(),
        action: "/login/".to_owned(),
        fields: vec![
            FieldDescriptor::new("username", "Email", FieldKind::Email),
            FieldDescriptor::new("password", "Password", FieldKind::Password),
        ],
        errors: std::collections::BTreeMap::new(),
    }
}
