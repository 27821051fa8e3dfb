//! Inventory: products and the category/size/flavor catalogs

use super::ApiClients;
use crate::endpoints::{
    Endpoint, CATEGORIES, CATEGORY, FLAVOR, FLAVORS, PRODUCT, PRODUCTS, SIZE, SIZES,
};
use crate::models::{Catalog, CatalogItem, Product};
use crate::ClientResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::info;

pub struct InventoryApi<'a, U> {
    clients: &'a ApiClients<U>,
}

impl<'a, U> InventoryApi<'a, U>
where
    U: Serialize + DeserializeOwned + 'static,
{
    pub(crate) fn new(clients: &'a ApiClients<U>) -> Self {
        Self { clients }
    }

    pub async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let path = self.clients.paths().resolve(&PRODUCTS, &[])?;
        self.clients.json_client().get(&path).await
    }

    pub async fn get_product(&self, id: &str) -> ClientResult<Product> {
        let path = self.clients.paths().resolve(&PRODUCT, &[id])?;
        self.clients.json_client().get(&path).await
    }

    pub async fn create_product<P: Serialize + ?Sized>(&self, payload: &P) -> ClientResult<Product> {
        let path = self.clients.paths().resolve(&PRODUCTS, &[])?;
        let product: Product = self.clients.json_client().post(&path, payload).await?;
        info!(id = %product.id, "Product created");
        Ok(product)
    }

    pub async fn update_product<P: Serialize + ?Sized>(
        &self,
        id: &str,
        payload: &P,
    ) -> ClientResult<Product> {
        let path = self.clients.paths().resolve(&PRODUCT, &[id])?;
        let product: Product = self.clients.json_client().put(&path, payload).await?;
        info!(id = %product.id, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> ClientResult<()> {
        let path = self.clients.paths().resolve(&PRODUCT, &[id])?;
        self.clients.json_client().delete(&path).await?;
        info!(id, "Product deleted");
        Ok(())
    }

    pub async fn list_catalog(&self, catalog: Catalog) -> ClientResult<Vec<CatalogItem>> {
        let (collection, _) = catalog_endpoints(catalog);
        let path = self.clients.paths().resolve(&collection, &[])?;
        self.clients.json_client().get(&path).await
    }

    pub async fn create_catalog_item(
        &self,
        catalog: Catalog,
        nombre: &str,
    ) -> ClientResult<CatalogItem> {
        let (collection, _) = catalog_endpoints(catalog);
        let path = self.clients.paths().resolve(&collection, &[])?;
        let item: CatalogItem = self
            .clients
            .json_client()
            .post(&path, &json!({ "nombre": nombre }))
            .await?;
        info!(catalog = catalog.label(), id = %item.id, "Catalog item created");
        Ok(item)
    }

    pub async fn delete_catalog_item(&self, catalog: Catalog, id: &str) -> ClientResult<()> {
        let (_, item) = catalog_endpoints(catalog);
        let path = self.clients.paths().resolve(&item, &[id])?;
        self.clients.json_client().delete(&path).await?;
        info!(catalog = catalog.label(), id, "Catalog item deleted");
        Ok(())
    }
}

/// (collection, item) endpoints for a catalog
fn catalog_endpoints(catalog: Catalog) -> (Endpoint, Endpoint) {
    match catalog {
        Catalog::Categories => (CATEGORIES, CATEGORY),
        Catalog::Sizes => (SIZES, SIZE),
        Catalog::Flavors => (FLAVORS, FLAVOR),
    }
}
