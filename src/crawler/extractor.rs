//! Product extraction from listing page markup
//!
//! The extractor is built from a [`SiteRules`] set: a CSS selector for the
//! product list container, a node path from the container to each product
//! card, and a locator chain per field. Supporting another shop means writing
//! another rule set.

use crate::config::{CardErrorPolicy, SiteRules};
use crate::crawler::locator::{LocatorChain, NodePath};
use crate::product::{code_from_url, full_title_from_code, PageResult, ProductRecord};
use crate::{ExtractionError, ExtractionResult};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Turns one page of listing markup into a [`PageResult`]
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    container: Selector,
    cards: NodePath,
    image: LocatorChain,
    short_title: LocatorChain,
    product_url: LocatorChain,
    price: LocatorChain,
    on_card_error: CardErrorPolicy,
}

impl ProductExtractor {
    /// Compiles a rule set
    ///
    /// # Returns
    ///
    /// * `Ok(ProductExtractor)` - All selectors and locators parsed
    /// * `Err(ExtractionError)` - A selector or locator is malformed
    pub fn new(rules: &SiteRules) -> ExtractionResult<Self> {
        let container = Selector::parse(&rules.container)
            .map_err(|_| ExtractionError::InvalidSelector(rules.container.clone()))?;

        Ok(Self {
            container,
            cards: NodePath::parse(&rules.card_path)?,
            image: LocatorChain::parse("image", &rules.fields.image)?,
            short_title: LocatorChain::parse("short_title", &rules.fields.short_title)?,
            product_url: LocatorChain::parse("product_url", &rules.fields.product_url)?,
            price: LocatorChain::parse("price", &rules.fields.price)?,
            on_card_error: rules.on_card_error,
        })
    }

    /// Extracts every product card on a page
    ///
    /// Relative product URLs are resolved against `page_url`. A page without
    /// the container yields an empty result. When two cards share a code the
    /// later card wins and a warning is logged.
    ///
    /// # Arguments
    ///
    /// * `page` - Page number, carried into the result
    /// * `body` - Raw page bytes; invalid UTF-8 is replaced
    /// * `page_url` - URL the page was fetched from
    pub fn extract(&self, page: u32, body: &[u8], page_url: &Url) -> ExtractionResult<PageResult> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);
        let mut result = PageResult::new(page);

        let cards = document
            .select(&self.container)
            .next()
            .map(|container| self.cards.select(container))
            .unwrap_or_default();

        if cards.is_empty() {
            tracing::debug!("No product cards found on {}", page_url);
        }

        for (index, card) in cards.into_iter().enumerate() {
            let record = match self.extract_card(index + 1, card, page_url) {
                Ok(record) => record,
                Err(e) if self.on_card_error == CardErrorPolicy::Skip => {
                    tracing::warn!("Skipping product card on {}: {}", page_url, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(previous) = result.insert(record) {
                tracing::warn!(
                    "Duplicate product code '{}' on {}; keeping the later card (dropped price {})",
                    previous.code,
                    page_url,
                    previous.price
                );
            }
        }

        Ok(result)
    }

    fn extract_card(
        &self,
        card_index: usize,
        card: ElementRef<'_>,
        page_url: &Url,
    ) -> ExtractionResult<ProductRecord> {
        let required = |chain: &LocatorChain| {
            chain
                .evaluate(card)
                .ok_or_else(|| ExtractionError::MissingField {
                    field: chain.field(),
                    card: card_index,
                })
        };

        let image_path = required(&self.image)?;
        let short_title = required(&self.short_title)?;
        let href = required(&self.product_url)?;
        let price = required(&self.price)?;

        let url = page_url
            .join(&href)
            .map_err(|source| ExtractionError::InvalidUrl {
                url: href.clone(),
                source,
            })?;
        let code = code_from_url(&url).ok_or_else(|| ExtractionError::MissingCode {
            url: url.to_string(),
        })?;

        Ok(ProductRecord {
            full_title: full_title_from_code(&code),
            code,
            short_title,
            image_path,
            product_url: url.to_string(),
            price,
            scraped_at: Utc::now(),
        })
    }
}
