use crate::io::{
    BrandId, Category, CategoryId, InterestEdge, Product, ProductId, SourceTables, User,
    WishlistEdge,
};

pub(crate) const CATEGORY_A: CategoryId = 1;
pub(crate) const CATEGORY_B: CategoryId = 2;

/// Products from (id, category, brand) tuples.
pub(crate) fn products(rows: &[(ProductId, CategoryId, BrandId)]) -> Vec<Product> {
    rows.iter()
        .map(|(id, category_id, brand_id)| Product {
            id: *id,
            category_id: *category_id,
            brand_id: *brand_id,
            name: format!("product-{}", id),
            description: String::new(),
        })
        .collect()
}

/// Users 1, 2, 3 and products 10, 20, 30 where only 30 is in category A.
/// Wishlists: (1, 10), (2, 10), (2, 20). User 1 is interested in category A.
pub(crate) fn scenario_tables() -> SourceTables {
    SourceTables {
        users: vec![User { id: 1 }, User { id: 2 }, User { id: 3 }],
        categories: vec![
            Category { id: CATEGORY_A, name: "A".to_string() },
            Category { id: CATEGORY_B, name: "B".to_string() },
        ],
        products: products(&[(10, CATEGORY_B, 1), (20, CATEGORY_B, 2), (30, CATEGORY_A, 3)]),
        interests: vec![InterestEdge { user_id: 1, category_id: CATEGORY_A }],
        wishlists: vec![
            WishlistEdge { user_id: 1, product_id: 10 },
            WishlistEdge { user_id: 2, product_id: 10 },
            WishlistEdge { user_id: 2, product_id: 20 },
        ],
    }
}
