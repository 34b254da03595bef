//! Filters and paging for `list`

use crate::model::BeerStyle;

/// Optional filters for listing beers. Unset fields are left out of the
/// query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeerListParams {
    pub name: Option<String>,
    pub style: Option<BeerStyle>,
    pub show_inventory: Option<bool>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl BeerListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn style(mut self, style: BeerStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn show_inventory(mut self, show: bool) -> Self {
        self.show_inventory = Some(show);
        self
    }

    pub fn page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Query pairs in a fixed order. A blank name counts as unset.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            pairs.push(("name", name.to_owned()));
        }
        if let Some(style) = self.style {
            pairs.push(("style", style.as_str().to_owned()));
        }
        if let Some(show) = self.show_inventory {
            pairs.push(("showInventory", show.to_string()));
        }
        if let Some(page_number) = self.page_number {
            pairs.push(("pageNumber", page_number.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("pageSize", page_size.to_string()));
        }
        pairs
    }
}
