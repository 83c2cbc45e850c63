use crate::macros::slug_repository;

slug_repository!(Genre, CreateGenre, GenreRepository, table = "genres");
