//! Filtering, ordering and paging of medicine listings.
//!
//! The Postgres store expresses the same rules in SQL; the functions here are
//! the in-process rendition used by the memory store.

use std::cmp::Ordering;

use crate::{
    dto::{MedicineQuery, Page, SortOrder},
    models::MedicineEntity,
};

pub const DEFAULT_PER_PAGE: u32 = 12;
pub const MAX_PER_PAGE: u32 = 100;

/// Page number and size after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub per_page: u32,
}

impl Paging {
    pub fn from_query(query: &MedicineQuery) -> Self {
        Self {
            page: query.page.unwrap_or(1).max(1),
            per_page: query
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, paging: Paging, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(paging.per_page));
        Self {
            items,
            page: paging.page,
            per_page: paging.per_page,
            total,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Blank filter values are ignored.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn matches(query: &MedicineQuery, medicine: &MedicineEntity) -> bool {
    if let Some(name) = non_blank(&query.name) {
        if !contains_ci(&medicine.name, name) {
            return false;
        }
    }
    if let Some(location) = non_blank(&query.location) {
        if !contains_ci(&medicine.location, location) {
            return false;
        }
    }
    if let Some(q) = non_blank(&query.q) {
        if !contains_ci(&medicine.name, q) && !contains_ci(&medicine.description, q) {
            return false;
        }
    }
    if let Some(status) = query.status {
        if medicine.status != status.as_str() {
            return false;
        }
    }
    true
}

fn compare(order: SortOrder, a: &MedicineEntity, b: &MedicineEntity) -> Ordering {
    let primary = match order {
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
        SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        SortOrder::Expiry => a.expiry_date.cmp(&b.expiry_date),
        SortOrder::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

pub fn sort(medicines: &mut [MedicineEntity], order: SortOrder) {
    medicines.sort_by(|a, b| compare(order, a, b));
}

/// Filters, sorts and slices `medicines` according to `query`.
pub fn apply(
    query: &MedicineQuery,
    medicines: impl IntoIterator<Item = MedicineEntity>,
) -> Page<MedicineEntity> {
    let paging = Paging::from_query(query);
    let mut matching: Vec<MedicineEntity> = medicines
        .into_iter()
        .filter(|m| matches(query, m))
        .collect();
    sort(&mut matching, query.sort.unwrap_or_default());

    let total = matching.len() as u64;
    let offset = usize::try_from(paging.offset()).unwrap_or(usize::MAX);
    let items = matching
        .into_iter()
        .skip(offset)
        .take(paging.per_page as usize)
        .collect();

    Page::new(items, paging, total)
}
