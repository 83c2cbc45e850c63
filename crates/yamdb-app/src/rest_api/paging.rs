use garde::Validate;
use serde::{Deserialize, Serialize};
use yamdb_dal::{Batch, ListingParams};

#[derive(Debug, Clone, Default, Validate, Deserialize)]
pub struct Paging {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
}

impl Paging {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size).max(1)
    }

    pub fn into_listing_params(self, page_size: u32) -> ListingParams {
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page as i64 - 1) * page_size as i64;
        ListingParams::new(offset, page_size as i64)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub results: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        let size = page_size.max(1) as u64;
        let page = batch.offset.max(0) as u64 / size + 1;
        let total_pages = batch.total.div_ceil(size);
        Self {
            count: batch.total,
            page: u32::try_from(page).unwrap_or(u32::MAX),
            page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            results: batch.rows,
        }
    }
}
