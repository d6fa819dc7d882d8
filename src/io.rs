use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RepositoryError;

pub type UserId = u64;
pub type ProductId = u64;
pub type CategoryId = u64;
pub type BrandId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub brand_id: BrandId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A user explicitly added a product to their wishlist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEdge {
    pub user_id: UserId,
    pub product_id: ProductId,
}

/// A user declared interest in a whole category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestEdge {
    pub user_id: UserId,
    pub category_id: CategoryId,
}

/// Read side of the relational store. Every call returns a complete table;
/// training calls each of them exactly once.
pub trait Repository {
    fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    fn list_products_with_category_and_brand(&self) -> Result<Vec<Product>, RepositoryError>;

    fn list_interest_edges(&self) -> Result<Vec<InterestEdge>, RepositoryError>;

    fn list_wishlist_edges(&self) -> Result<Vec<WishlistEdge>, RepositoryError>;
}

/// The five source tables as read at training time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTables {
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub interests: Vec<InterestEdge>,
    pub wishlists: Vec<WishlistEdge>,
}

impl SourceTables {
    pub fn fetch<R: Repository + ?Sized>(repository: &R) -> Result<SourceTables, RepositoryError> {
        let tables = SourceTables {
            users: repository.list_users()?,
            categories: repository.list_categories()?,
            products: repository.list_products_with_category_and_brand()?,
            interests: repository.list_interest_edges()?,
            wishlists: repository.list_wishlist_edges()?,
        };
        info!(
            users = tables.users.len(),
            categories = tables.categories.len(),
            products = tables.products.len(),
            interests = tables.interests.len(),
            wishlists = tables.wishlists.len(),
            "fetched source tables"
        );
        Ok(tables)
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryRepository {
    pub tables: SourceTables,
}

impl InMemoryRepository {
    pub fn new(tables: SourceTables) -> Self {
        InMemoryRepository { tables }
    }
}

impl Repository for InMemoryRepository {
    fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.tables.users.clone())
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.tables.categories.clone())
    }

    fn list_products_with_category_and_brand(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.products.clone())
    }

    fn list_interest_edges(&self) -> Result<Vec<InterestEdge>, RepositoryError> {
        Ok(self.tables.interests.clone())
    }

    fn list_wishlist_edges(&self) -> Result<Vec<WishlistEdge>, RepositoryError> {
        Ok(self.tables.wishlists.clone())
    }
}

/// Table exports on disk, one headered csv file per table.
pub struct CsvRepository {
    base_path: PathBuf,
}

impl CsvRepository {
    pub const USERS_FILE: &'static str = "users.csv";
    pub const CATEGORIES_FILE: &'static str = "categories.csv";
    pub const PRODUCTS_FILE: &'static str = "products.csv";
    pub const INTERESTS_FILE: &'static str = "user_interested_category.csv";
    pub const WISHLIST_FILE: &'static str = "wishlist.csv";

    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        CsvRepository {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn read_table<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>, RepositoryError> {
        let path = self.base_path.join(file_name);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|source| RepositoryError::Table {
                path: path.clone(),
                source,
            })?;

        let mut rows = Vec::new();
        for (position, result) in reader.deserialize().enumerate() {
            match result {
                Ok(row) => rows.push(row),
                Err(err) => {
                    // header is line 1
                    warn!(file = file_name, line = position + 2, error = %err, "skipping unparseable row");
                }
            }
        }
        Ok(rows)
    }
}

impl Repository for CsvRepository {
    fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.read_table(Self::USERS_FILE)
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.read_table(Self::CATEGORIES_FILE)
    }

    fn list_products_with_category_and_brand(&self) -> Result<Vec<Product>, RepositoryError> {
        self.read_table(Self::PRODUCTS_FILE)
    }

    fn list_interest_edges(&self) -> Result<Vec<InterestEdge>, RepositoryError> {
        self.read_table(Self::INTERESTS_FILE)
    }

    fn list_wishlist_edges(&self) -> Result<Vec<WishlistEdge>, RepositoryError> {
        self.read_table(Self::WISHLIST_FILE)
    }
}
