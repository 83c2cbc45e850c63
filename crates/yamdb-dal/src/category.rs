use crate::macros::slug_repository;

slug_repository!(Category, CreateCategory, CategoryRepository, table = "categories");
