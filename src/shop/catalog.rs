// Product catalog
// Seeded once at startup, read-only afterwards

use tracing::info;

use super::models::Product;
use crate::store::ProductMap;

/// Products every shop sells
const SEED_PRODUCTS: [(&str, &str, f64); 4] = [
    ("1", "Laptop", 999.99),
    ("2", "Mouse", 29.99),
    ("3", "Keyboard", 79.99),
    ("4", "Monitor", 299.99),
];

#[derive(Clone)]
pub struct Catalog {
    products: ProductMap,
}

impl Catalog {
    /// Wrap an already populated product store
    pub fn new(products: ProductMap) -> Self {
        Self { products }
    }

    /// Populate the product store with the fixed catalog
    pub fn seeded(products: ProductMap) -> Self {
        for (id, name, price) in SEED_PRODUCTS {
            products.set(
                id.to_string(),
                Product {
                    id: id.to_string(),
                    name: name.to_string(),
                    price,
                },
            );
        }

        info!(products = products.len(), "Catalog seeded");
        Self { products }
    }

    /// All products ordered by id
    pub fn list_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .list()
            .into_iter()
            .map(|(_, product)| product)
            .collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub fn get_product(&self, id: &str) -> Option<Product> {
        self.products.get(&id.to_string())
    }

    /// Current authoritative price
    pub fn price_of(&self, id: &str) -> Option<f64> {
        self.get_product(id).map(|product| product.price)
    }
}
