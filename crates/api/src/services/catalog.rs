//! Product and category service.
//!
//! Public reads only see active rows. Admin reads see soft-deleted rows too.

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{CategoryId, Price, PriceError, ProductId};

use crate::db::{CategoryRepository, InventoryRepository, ProductRepository, RepositoryError};
use crate::models::{
    Category, CreateCategoryRequest, CreateProductRequest, PageQuery, Product, ProductFilter,
    UpdateCategoryRequest, UpdateProductRequest, non_empty,
};

/// Default page size for product listings.
pub const DEFAULT_PRODUCT_LIMIT: i64 = 20;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found")]
    ProductNotFound,

    #[error("category not found")]
    CategoryNotFound,

    /// A required field is blank or a value is out of range.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidPrice(#[from] PriceError),

    /// `category_id` on a product does not reference a category.
    #[error("category does not exist")]
    UnknownCategory,

    #[error("Search term is required")]
    SearchTermRequired,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
    inventory: InventoryRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
            inventory: InventoryRepository::new(pool),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List active products matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let (limit, offset) = PageQuery {
            limit: filter.limit,
            offset: filter.offset,
        }
        .resolve(DEFAULT_PRODUCT_LIMIT);

        Ok(self.products.list(filter, limit, offset).await?)
    }

    /// Case-insensitive search over name and description.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::SearchTermRequired` for a missing or blank term.
    pub async fn search_products(
        &self,
        term: Option<&str>,
        page: PageQuery,
    ) -> Result<Vec<Product>, CatalogError> {
        let term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CatalogError::SearchTermRequired)?;

        let filter = ProductFilter {
            search: Some(term.to_string()),
            limit: page.limit,
            offset: page.offset,
            ..ProductFilter::default()
        };
        self.list_products(&filter).await
    }

    /// An active product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if missing or deleted.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .get_active(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// A product, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if no row exists.
    pub async fn get_product_admin(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .get_any(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// Create a product and its empty stock row.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` or `CatalogError::InvalidPrice` for
    /// bad input, `CatalogError::UnknownCategory` for a dangling category and
    /// `RepositoryError::Conflict` for a duplicate slug or SKU.
    #[tracing::instrument(skip(self, req), fields(sku = %req.sku))]
    pub async fn create_product(&self, req: &CreateProductRequest) -> Result<Product, CatalogError> {
        require("name", &req.name)?;
        require("slug", &req.slug)?;
        require("sku", &req.sku)?;
        Price::new(req.price)?;
        if let Some(compare_price) = req.compare_price {
            Price::new(compare_price)?;
        }
        if !self.products.category_exists(req.category_id).await? {
            return Err(CatalogError::UnknownCategory);
        }

        let product = self.products.create(req).await?;
        self.inventory.create_for_product(product.id, 0).await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if no row exists.
    pub async fn update_product(
        &self,
        id: ProductId,
        req: UpdateProductRequest,
    ) -> Result<Product, CatalogError> {
        if let Some(price) = req.price {
            Price::new(price)?;
        }
        if let Some(category_id) = req.category_id
            && !self.products.category_exists(category_id).await?
        {
            return Err(CatalogError::UnknownCategory);
        }

        let req = UpdateProductRequest {
            name: non_empty(req.name),
            slug: non_empty(req.slug),
            sku: non_empty(req.sku),
            ..req
        };

        self.products
            .update(id, &req)
            .await
            .map_err(not_found(CatalogError::ProductNotFound))
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if no row exists.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.products
            .soft_delete(id)
            .await
            .map_err(not_found(CatalogError::ProductNotFound))
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Active categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list_active().await?)
    }

    /// An active category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if missing or deleted.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.categories
            .get_active(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)
    }

    /// A category, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if no row exists.
    pub async fn get_category_admin(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.categories
            .get_any(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for a blank name or slug and
    /// `RepositoryError::Conflict` for a duplicate slug.
    pub async fn create_category(
        &self,
        req: &CreateCategoryRequest,
    ) -> Result<Category, CatalogError> {
        require("name", &req.name)?;
        require("slug", &req.slug)?;

        let category = self.categories.create(req).await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if no row exists.
    pub async fn update_category(
        &self,
        id: CategoryId,
        req: UpdateCategoryRequest,
    ) -> Result<Category, CatalogError> {
        let req = UpdateCategoryRequest {
            name: non_empty(req.name),
            slug: non_empty(req.slug),
            ..req
        };

        self.categories
            .update(id, &req)
            .await
            .map_err(not_found(CatalogError::CategoryNotFound))
    }

    /// Soft-delete a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if no row exists.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.categories
            .soft_delete(id)
            .await
            .map_err(not_found(CatalogError::CategoryNotFound))
    }
}

fn require(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn not_found(err: CatalogError) -> impl FnOnce(RepositoryError) -> CatalogError {
    move |e| match e {
        RepositoryError::NotFound => err,
        other => CatalogError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("sku", "LAP001").is_ok());
        let err = require("sku", " ").err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("sku is required"));
    }

    #[test]
    fn test_not_found_mapping() {
        let err = not_found(CatalogError::ProductNotFound)(RepositoryError::NotFound);
        assert!(matches!(err, CatalogError::ProductNotFound));

        let err = not_found(CatalogError::ProductNotFound)(RepositoryError::Conflict(
            "product slug or sku already exists".to_string(),
        ));
        assert!(matches!(
            err,
            CatalogError::Repository(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn test_price_error_message() {
        let err: CatalogError = PriceError::NotPositive.into();
        assert_eq!(err.to_string(), "price must be greater than 0");
    }
}
