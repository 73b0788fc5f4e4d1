use scraper::{Html, Selector};

/// Parsed HTML document exposing the two lookups the crawl engine needs:
/// anchor hrefs and element-id existence for fragment checking.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// All `href` attribute values of `<a>` tags, in document order.
    /// Anchors without an href are skipped here; further filtering
    /// (whitespace, mailto, empties) is the engine's job.
    pub fn anchor_hrefs(&self) -> Vec<String> {
        let selector = Selector::parse("a[href]").unwrap();
        self.document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    /// Whether any element in the document carries the given id.
    pub fn has_element_with_id(&self, id: &str) -> bool {
        let selector = Selector::parse("[id]").unwrap();
        self.document
            .select(&selector)
            .any(|element| element.value().attr("id") == Some(id))
    }
}
