//! The console's forms

use crate::schema::{FieldSpec, Rule, Schema};
use crate::wizard::{Step, Wizard};
use serde_json::json;

/// Departments an administrator can belong to
pub const DEPARTMENTS: [&str; 5] = [
    "Administración",
    "Ventas",
    "Logística",
    "Marketing",
    "Soporte",
];

/// Applied by the backend when `departamento` is omitted
pub const DEFAULT_DEPARTMENT: &str = "Administración";

/// Applied by the backend when `nivelAcceso` is omitted
pub const DEFAULT_ACCESS_LEVEL: u8 = 3;

fn name_field(name: &str, label: &str) -> FieldSpec {
    FieldSpec::required(name, label).rule(Rule::MinLength(2))
}

/// Administrator registration: account, role, confirmation.
///
/// Department and access level are optional and left out of the payload
/// when not chosen.
pub fn admin_registration() -> Wizard {
    let schema = Schema::new(vec![
        FieldSpec::required("email", "Email").rule(Rule::Email),
        FieldSpec::required("dni", "DNI").rule(Rule::ExactDigits(8)),
        FieldSpec::required("password", "Password")
            .rule(Rule::MinLength(8))
            .keep_whitespace(),
        name_field("nombre", "First name"),
        name_field("apellidoPaterno", "Paternal surname"),
        name_field("apellidoMaterno", "Maternal surname"),
        FieldSpec::optional("departamento", "Department").rule(Rule::OneOf(
            DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
        )),
        FieldSpec::optional("nivelAcceso", "Access level")
            .rule(Rule::IntRange(1, 5))
            .sentinel(json!(0)),
    ]);

    Wizard::new(
        "admin_registration",
        schema,
        vec![
            Step::new(
                "Account",
                &[
                    "email",
                    "dni",
                    "password",
                    "nombre",
                    "apellidoPaterno",
                    "apellidoMaterno",
                ],
            ),
            Step::new("Role", &["departamento", "nivelAcceso"]),
            Step::new("Confirmation", &[]),
        ],
    )
}

/// Client registration, a single step
pub fn client_registration() -> Wizard {
    let schema = Schema::new(vec![
        FieldSpec::required("email", "Email").rule(Rule::Email),
        FieldSpec::required("password", "Password")
            .rule(Rule::MinLength(8))
            .keep_whitespace(),
        name_field("nombre", "First name"),
        name_field("apellidos", "Surnames"),
        FieldSpec::optional("telefono", "Phone").rule(Rule::ExactDigits(9)),
    ]);

    Wizard::new("client_registration", schema, Vec::new())
}

/// Product create/edit: details, then pricing
pub fn product_form() -> Wizard {
    let schema = Schema::new(vec![
        name_field("nombre", "Name"),
        FieldSpec::optional("descripcion", "Description"),
        FieldSpec::required("categoriaId", "Category"),
        FieldSpec::optional("imagenUrl", "Image URL"),
        FieldSpec::required("precio", "Price").rule(Rule::NumberMin {
            min: 0.0,
            inclusive: false,
        }),
        FieldSpec::required("stock", "Stock").rule(Rule::IntRange(0, i64::MAX)),
    ]);

    Wizard::new(
        "product_form",
        schema,
        vec![
            Step::new("Details", &["nombre", "descripcion", "categoriaId", "imagenUrl"]),
            Step::new("Pricing", &["precio", "stock"]),
        ],
    )
}
