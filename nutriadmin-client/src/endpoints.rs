//! Backend endpoint table
//!
//! Each endpoint is a path template relative to its service prefix, with
//! positional `:name` parameters, e.g. `/productos/:id` under `/inventory`.

use crate::{ClientError, ClientResult};
use nutriadmin_core::ApiSettings;

/// Backend service an endpoint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiService {
    Auth,
    Storage,
    Inventory,
}

/// Path template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub service: ApiService,
    pub template: &'static str,
}

impl Endpoint {
    pub const fn new(service: ApiService, template: &'static str) -> Self {
        Self { service, template }
    }

    /// Names of the positional parameters, in order
    pub fn params(&self) -> Vec<&'static str> {
        self.template
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .collect()
    }

    /// Substitute parameters in order; each value is percent-encoded
    pub fn render(&self, args: &[&str]) -> ClientResult<String> {
        let expected = self.params().len();
        if expected != args.len() {
            return Err(ClientError::invalid_request(format!(
                "endpoint {} takes {} parameter(s), got {}",
                self.template,
                expected,
                args.len()
            )));
        }

        let mut args = args.iter();
        let mut rendered = Vec::new();
        for segment in self.template.split('/') {
            if segment.starts_with(':') {
                // arity checked above
                let value = args.next().copied().unwrap_or_default();
                if value.is_empty() {
                    return Err(ClientError::invalid_request(format!(
                        "empty value for parameter {} of {}",
                        segment, self.template
                    )));
                }
                rendered.push(urlencoding::encode(value).into_owned());
            } else {
                rendered.push(segment.to_string());
            }
        }

        Ok(rendered.join("/"))
    }
}

/// Service prefixes, taken from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPaths {
    pub auth: String,
    pub storage: String,
    pub inventory: String,
}

impl Default for ApiPaths {
    fn default() -> Self {
        Self::from_settings(&ApiSettings::default())
    }
}

impl ApiPaths {
    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self {
            auth: settings.auth_path.clone(),
            storage: settings.storage_path.clone(),
            inventory: settings.inventory_path.clone(),
        }
    }

    fn prefix(&self, service: ApiService) -> &str {
        match service {
            ApiService::Auth => &self.auth,
            ApiService::Storage => &self.storage,
            ApiService::Inventory => &self.inventory,
        }
    }

    /// Full path (without host) for an endpoint
    pub fn resolve(&self, endpoint: &Endpoint, args: &[&str]) -> ClientResult<String> {
        let prefix = self.prefix(endpoint.service).trim_end_matches('/');
        let rendered = endpoint.render(args)?;
        Ok(format!("{}/{}", prefix, rendered.trim_start_matches('/')))
    }
}

pub const AUTH_LOGIN: Endpoint = Endpoint::new(ApiService::Auth, "/login");
pub const AUTH_PROFILE: Endpoint = Endpoint::new(ApiService::Auth, "/me");
pub const AUTH_REGISTER_ADMIN: Endpoint = Endpoint::new(ApiService::Auth, "/register/admin");
pub const AUTH_REGISTER_CLIENT: Endpoint = Endpoint::new(ApiService::Auth, "/register/cliente");
pub const AUTH_ADMINS: Endpoint = Endpoint::new(ApiService::Auth, "/admins");

pub const STORAGE_UPLOAD: Endpoint = Endpoint::new(ApiService::Storage, "/upload");
pub const STORAGE_IMAGE: Endpoint = Endpoint::new(ApiService::Storage, "/images/:id");

pub const PRODUCTS: Endpoint = Endpoint::new(ApiService::Inventory, "/productos");
pub const PRODUCT: Endpoint = Endpoint::new(ApiService::Inventory, "/productos/:id");
pub const CATEGORIES: Endpoint = Endpoint::new(ApiService::Inventory, "/categorias");
pub const CATEGORY: Endpoint = Endpoint::new(ApiService::Inventory, "/categorias/:id");
pub const SIZES: Endpoint = Endpoint::new(ApiService::Inventory, "/tamanos");
pub const SIZE: Endpoint = Endpoint::new(ApiService::Inventory, "/tamanos/:id");
pub const FLAVORS: Endpoint = Endpoint::new(ApiService::Inventory, "/sabores");
pub const FLAVOR: Endpoint = Endpoint::new(ApiService::Inventory, "/sabores/:id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_positional_params() {
        assert_eq!(PRODUCT.params(), vec!["id"]);
        assert_eq!(PRODUCT.render(&["17"]).unwrap(), "/productos/17");
        assert_eq!(PRODUCTS.render(&[]).unwrap(), "/productos");
    }

    #[test]
    fn test_render_encodes_values() {
        assert_eq!(
            STORAGE_IMAGE.render(&["productos/whey 1.png"]).unwrap(),
            "/images/productos%2Fwhey%201.png"
        );
    }

    #[test]
    fn test_render_rejects_wrong_arity_and_empty_values() {
        assert!(matches!(
            PRODUCT.render(&[]),
            Err(ClientError::InvalidRequest { .. })
        ));
        assert!(PRODUCTS.render(&["1"]).is_err());
        assert!(PRODUCT.render(&[""]).is_err());
    }

    #[test]
    fn test_resolve_with_service_prefix() {
        let paths = ApiPaths::default();
        assert_eq!(
            paths.resolve(&PRODUCT, &["5"]).unwrap(),
            "/inventory/productos/5"
        );
        assert_eq!(paths.resolve(&AUTH_LOGIN, &[]).unwrap(), "/auth/login");

        let custom = ApiPaths {
            auth: "/api/v2/auth/".to_string(),
            ..ApiPaths::default()
        };
        assert_eq!(
            custom.resolve(&AUTH_ADMINS, &[]).unwrap(),
            "/api/v2/auth/admins"
        );
    }
}
