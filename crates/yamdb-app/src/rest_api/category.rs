use yamdb_dal::category::{CategoryRepository, CreateCategory};

use crate::slug_api;

slug_api!(Category, CreateCategory, CategoryRepository, "/categories");
