//! Backend payload types

use nutriadmin_core::de;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login answer
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse<U> {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(alias = "usuario", alias = "admin")]
    pub user: U,
}

/// Administrator account as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Administrator {
    #[serde(alias = "_id", deserialize_with = "de::string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub dni: Option<String>,
    pub nombre: String,
    #[serde(default)]
    pub apellido_paterno: Option<String>,
    #[serde(default)]
    pub apellido_materno: Option<String>,
    #[serde(default)]
    pub departamento: Option<String>,
    #[serde(default)]
    pub nivel_acceso: Option<u8>,
    #[serde(default)]
    pub activo: Option<bool>,
}

impl Administrator {
    pub fn full_name(&self) -> String {
        [
            Some(self.nombre.as_str()),
            self.apellido_paterno.as_deref(),
            self.apellido_materno.as_deref(),
        ]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Client-side filter over administrator listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminFilter {
    /// Case-insensitive match on names, email and dni
    pub search: Option<String>,
    pub department: Option<String>,
    pub access_level: Option<u8>,
    pub active: Option<bool>,
}

impl AdminFilter {
    pub fn search<S: Into<String>>(mut self, text: S) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn department<S: Into<String>>(mut self, department: S) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn access_level(mut self, level: u8) -> Self {
        self.access_level = Some(level);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn matches(&self, admin: &Administrator) -> bool {
        if let Some(text) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let haystack = [
                Some(admin.full_name()),
                Some(admin.email.clone()),
                admin.dni.clone(),
            ];
            if !haystack
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        if let Some(department) = &self.department {
            let wanted = department.trim().to_lowercase();
            match &admin.departamento {
                Some(d) if d.trim().to_lowercase() == wanted => {}
                _ => return false,
            }
        }

        if let Some(level) = self.access_level {
            if admin.nivel_acceso != Some(level) {
                return false;
            }
        }

        if let Some(active) = self.active {
            // accounts without the flag are considered active
            if admin.activo.unwrap_or(true) != active {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, admins: Vec<Administrator>) -> Vec<Administrator> {
        admins.into_iter().filter(|a| self.matches(a)).collect()
    }
}

/// Product in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id", deserialize_with = "de::string_or_number")]
    pub id: String,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub precio: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub categoria_id: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Category, size or flavor: the inventory catalogs share one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(alias = "_id", deserialize_with = "de::string_or_number")]
    pub id: String,
    pub nombre: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which inventory catalog a [`CatalogItem`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Categories,
    Sizes,
    Flavors,
}

impl Catalog {
    pub fn label(&self) -> &'static str {
        match self {
            Catalog::Categories => "categorias",
            Catalog::Sizes => "tamanos",
            Catalog::Flavors => "sabores",
        }
    }
}

/// Result of an image upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    #[serde(alias = "secure_url", alias = "secureUrl")]
    pub url: String,
    #[serde(default, alias = "public_id", alias = "id")]
    pub public_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn admin(nombre: &str, dept: Option<&str>, level: Option<u8>) -> Administrator {
        Administrator {
            id: nombre.to_lowercase(),
            email: format!("{}@nutri.pe", nombre.to_lowercase()),
            dni: Some("12345678".to_string()),
            nombre: nombre.to_string(),
            apellido_paterno: Some("Quispe".to_string()),
            apellido_materno: None,
            departamento: dept.map(str::to_string),
            nivel_acceso: level,
            activo: None,
        }
    }

    #[test]
    fn test_administrator_decodes_backend_shape() {
        let admin: Administrator = serde_json::from_value(json!({
            "_id": "65f1",
            "email": "ana@nutri.pe",
            "dni": "12345678",
            "nombre": "Ana",
            "apellidoPaterno": "Lopez",
            "apellidoMaterno": "Diaz",
            "departamento": "Ventas",
            "nivelAcceso": 4
        }))
        .unwrap();

        assert_eq!(admin.id, "65f1");
        assert_eq!(admin.full_name(), "Ana Lopez Diaz");
        assert_eq!(admin.nivel_acceso, Some(4));
    }

    #[test]
    fn test_filter_by_search_department_and_level() {
        let admins = vec![
            admin("Ana", Some("Ventas"), Some(3)),
            admin("Bruno", Some("Logística"), Some(5)),
            admin("Carla", None, None),
        ];

        let by_name = AdminFilter::default().search("bru").apply(admins.clone());
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].nombre, "Bruno");

        let by_email = AdminFilter::default().search("CARLA@").apply(admins.clone());
        assert_eq!(by_email[0].nombre, "Carla");

        let by_dept = AdminFilter::default().department("ventas").apply(admins.clone());
        assert_eq!(by_dept.len(), 1);

        // accented letters fold too
        for query in ["logística", "LOGÍSTICA", "Logística"] {
            let found = AdminFilter::default().department(query).apply(admins.clone());
            assert_eq!(found.len(), 1, "{}", query);
            assert_eq!(found[0].nombre, "Bruno");
        }
        assert!(AdminFilter::default()
            .department("Logistica")
            .apply(admins.clone())
            .is_empty());

        let by_level = AdminFilter::default().access_level(5).apply(admins.clone());
        assert_eq!(by_level[0].nombre, "Bruno");

        let everyone = AdminFilter::default().search("  ").apply(admins.clone());
        assert_eq!(everyone.len(), 3);

        assert_eq!(AdminFilter::default().active(false).apply(admins).len(), 0);
    }

    #[test]
    fn test_product_keeps_unknown_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": 12,
            "nombre": "Whey Protein",
            "precio": 189.9,
            "categoriaId": 3,
            "marca": "NutriMax"
        }))
        .unwrap();

        assert_eq!(product.id, "12");
        assert_eq!(product.categoria_id.as_deref(), Some("3"));
        assert_eq!(product.extra.get("marca"), Some(&json!("NutriMax")));
    }

    #[test]
    fn test_login_response_aliases() {
        let login: LoginResponse<Value> =
            serde_json::from_value(json!({"accessToken": "t", "usuario": {"id": 1}})).unwrap();
        assert_eq!(login.token, "t");
        assert_eq!(login.user["id"], json!(1));
    }
}
