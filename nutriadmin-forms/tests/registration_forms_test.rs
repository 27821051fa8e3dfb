use nutriadmin_forms::{
    admin_registration, client_registration, product_form, FormError, Wizard, DEPARTMENTS,
};
use serde_json::{json, Value};

fn fill(wizard: &mut Wizard, values: Value) {
    for (field, value) in values.as_object().unwrap() {
        wizard.set_field(field, value.clone()).unwrap();
    }
}

fn account_step() -> Value {
    json!({
        "email": "a@b.com",
        "dni": "12345678",
        "password": "password1",
        "nombre": "Ana",
        "apellidoPaterno": "Lopez",
        "apellidoMaterno": "Diaz"
    })
}

#[test]
fn admin_payload_without_role_has_exactly_six_keys() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());

    assert_eq!(wizard.next().unwrap(), 1);
    assert_eq!(wizard.next().unwrap(), 2);
    let payload = wizard.submit().unwrap();

    assert_eq!(Value::Object(payload), account_step());
}

#[test]
fn admin_payload_omits_cleared_and_sentinel_role_fields() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.next().unwrap();
    wizard.set_field("departamento", "").unwrap();
    wizard.set_field("nivelAcceso", 0).unwrap();
    wizard.next().unwrap();

    let payload = wizard.submit().unwrap();
    assert!(!payload.contains_key("departamento"));
    assert!(!payload.contains_key("nivelAcceso"));
    assert_eq!(payload.len(), 6);
}

#[test]
fn admin_payload_keeps_chosen_role() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.next().unwrap();
    wizard.set_field("departamento", "Ventas").unwrap();
    wizard.set_field("nivelAcceso", "4").unwrap();
    wizard.next().unwrap();

    let payload = wizard.submit().unwrap();
    assert_eq!(payload["departamento"], json!("Ventas"));
    assert_eq!(payload["nivelAcceso"], json!(4));
}

#[test]
fn seven_digit_dni_blocks_first_step() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.set_field("dni", "1234567").unwrap();

    let err = wizard.next().unwrap_err();

    assert_eq!(wizard.current_step_index(), 0);
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["dni"]);
    assert!(wizard.errors_for_step(0).contains("dni"));
}

#[test]
fn padded_name_is_validated_as_sent() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.set_field("nombre", " A").unwrap();

    let err = wizard.next().unwrap_err();
    assert_eq!(wizard.current_step_index(), 0);
    assert_eq!(
        err.validation_errors().unwrap().fields().collect::<Vec<_>>(),
        vec!["nombre"]
    );

    wizard.set_field("nombre", "  Ana  ").unwrap();
    wizard.next().unwrap();
    wizard.next().unwrap();
    assert_eq!(wizard.submit().unwrap()["nombre"], json!("Ana"));
}

#[test]
fn password_is_validated_and_sent_untrimmed() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.set_field("password", " pass12 ").unwrap();
    wizard.next().unwrap();
    wizard.next().unwrap();
    assert_eq!(wizard.submit().unwrap()["password"], json!(" pass12 "));

    let mut client = client_registration();
    fill(
        &mut client,
        json!({
            "email": "c@d.com",
            "password": "  secret ",
            "nombre": "Luis",
            "apellidos": "Quispe Ramos"
        }),
    );
    assert_eq!(client.submit().unwrap()["password"], json!("  secret "));
}

#[test]
fn dni_accepts_only_eight_decimal_digits() {
    let accepted = |dni: &str| {
        let mut wizard = admin_registration();
        fill(&mut wizard, account_step());
        wizard.set_field("dni", dni).unwrap();
        wizard.next().is_ok()
    };

    for len in 0..=12 {
        let digits: String = "9081726354019283".chars().take(len).collect();
        assert_eq!(accepted(&digits), len == 8, "{:?}", digits);
    }
    for position in 0..8 {
        for bad in ['a', ' ', '-', '.', '٣'] {
            let mut dni: Vec<char> = "12345678".chars().collect();
            dni[position] = bad;
            let dni: String = dni.into_iter().collect();
            assert!(!accepted(&dni), "{:?}", dni);
        }
    }
}

#[test]
fn role_step_rejects_unknown_department_and_out_of_range_level() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.next().unwrap();

    wizard.set_field("departamento", "Finanzas").unwrap();
    wizard.set_field("nivelAcceso", 6).unwrap();
    let err = wizard.next().unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.contains("departamento"));
    assert!(errors.contains("nivelAcceso"));
    assert_eq!(wizard.current_step_index(), 1);

    for department in DEPARTMENTS {
        wizard.set_field("departamento", department).unwrap();
        wizard.set_field("nivelAcceso", 1).unwrap();
        assert!(wizard.next().is_ok(), "{}", department);
        wizard.previous();
    }
}

#[test]
fn previous_does_not_revalidate_and_stops_at_first_step() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.next().unwrap();

    wizard.set_field("nivelAcceso", 42).unwrap();
    assert_eq!(wizard.previous(), 0);
    assert_eq!(wizard.previous(), 0);
    assert!(wizard.errors().is_empty());
}

#[test]
fn submit_from_middle_step_is_rejected() {
    let mut wizard = admin_registration();
    fill(&mut wizard, account_step());
    wizard.next().unwrap();

    assert!(matches!(
        wizard.submit(),
        Err(FormError::NotOnLastStep {
            current: 2,
            last: 3
        })
    ));
}

#[test]
fn client_registration_single_step() {
    let mut wizard = client_registration();
    fill(
        &mut wizard,
        json!({
            "email": "cliente@correo.pe",
            "password": "short",
            "nombre": "Luis",
            "apellidos": "Torres Vega",
            "telefono": "98765432"
        }),
    );

    let errors = wizard.submit().unwrap_err();
    let errors = errors.validation_errors().unwrap();
    assert!(errors.contains("password"));
    assert!(errors.contains("telefono"));

    wizard.set_field("password", "segura123").unwrap();
    wizard.set_field("telefono", "").unwrap();
    let payload = wizard.submit().unwrap();
    assert_eq!(payload.len(), 4);
    assert!(!payload.contains_key("telefono"));
}

#[test]
fn product_form_normalizes_prices_and_stock() {
    let mut wizard = product_form();
    fill(
        &mut wizard,
        json!({"nombre": "Whey Protein", "categoriaId": "3", "descripcion": "  "}),
    );
    wizard.next().unwrap();

    wizard.set_field("precio", "0").unwrap();
    wizard.set_field("stock", "-1").unwrap();
    let err = wizard.next().unwrap_err();
    assert_eq!(err.validation_errors().unwrap().len(), 2);

    wizard.set_field("precio", "189.90").unwrap();
    wizard.set_field("stock", "12").unwrap();
    let payload = wizard.submit().unwrap();
    assert_eq!(
        Value::Object(payload),
        json!({"nombre": "Whey Protein", "categoriaId": "3", "precio": 189.9, "stock": 12})
    );
}
