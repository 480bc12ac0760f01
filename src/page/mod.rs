pub mod content;

pub use content::*;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The role a page plays inside a funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Quiz,
    Result,
    Form,
    Landing,
    ThankYou,
}

/// One step of a funnel. Pages are ordered by `order_index`, which may have gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", alias = "page_type")]
    pub page_type: PageType,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default, deserialize_with = "content::deserialize_content")]
    pub content: PageContent,
    #[serde(default)]
    pub funnel_id: String,
}

impl Page {
    pub fn new(id: impl Into<String>, page_type: PageType, order_index: i64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            page_type,
            order_index,
            content: PageContent::default(),
            funnel_id: String::new(),
        }
    }

    pub fn with_content(mut self, content: PageContent) -> Self {
        self.content = content;
        self
    }

    pub fn is_thank_you(&self) -> bool {
        self.page_type == PageType::ThankYou
    }
}

/// Sorts pages by `order_index`. Pages sharing an index keep their input order.
pub fn sort_pages(pages: Vec<Page>) -> Vec<Page> {
    pages.into_iter().sorted_by_key(|p| p.order_index).collect()
}

/// Position of the page with `id` in an ordered page list.
pub fn index_of(pages: &[Page], id: &str) -> Option<usize> {
    pages.iter().position(|p| p.id == id)
}

/// Position of the first thank-you page, if the funnel has one.
pub fn thank_you_index(pages: &[Page]) -> Option<usize> {
    pages.iter().position(Page::is_thank_you)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorting_tolerates_gaps_and_ties() {
        let pages = vec![
            Page::new("c", PageType::Form, 30),
            Page::new("a", PageType::Landing, 0),
            Page::new("b1", PageType::Quiz, 10),
            Page::new("b2", PageType::Quiz, 10),
        ];
        let ids: Vec<_> = sort_pages(pages).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn decodes_page_with_string_encoded_content() {
        let page: Page = serde_json::from_str(
            r#"{
                "id": "p1", "name": "Intro", "type": "thank_you", "order_index": 2,
                "content": "{\"elements\":[{\"id\":\"h\",\"type\":\"heading\",\"text\":\"Thanks\"}]}",
                "funnel_id": "f"
            }"#,
        )
        .unwrap();
        assert!(page.is_thank_you());
        assert_eq!(page.content.elements.len(), 1);
        assert!(!page.content.has_errors());
    }
}
