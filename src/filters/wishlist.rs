//! Case-insensitive title prefix matching.

use super::Titled;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WishlistError {
    #[error("wishlist is empty; add at least one game title")]
    Empty,

    #[error("wishlist entry {0} is blank")]
    BlankEntry(usize),
}

/// An immutable list of title prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wishlist {
    /// Entries as the user wrote them.
    terms: Vec<String>,
    /// Lower-cased entries used for matching.
    prefixes: Vec<String>,
}

impl Wishlist {
    /// Creates a wishlist, rejecting an empty list or blank entries.
    pub fn new<I, S>(terms: I) -> Result<Self, WishlistError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        if terms.is_empty() {
            return Err(WishlistError::Empty);
        }
        if let Some(idx) = terms.iter().position(|t| t.trim().is_empty()) {
            return Err(WishlistError::BlankEntry(idx));
        }

        let prefixes = terms.iter().map(|t| t.to_lowercase()).collect();
        Ok(Self { terms, prefixes })
    }

    /// Returns true if the title starts with any entry, ignoring case.
    pub fn matches(&self, title: &str) -> bool {
        self.matching_term(title).is_some()
    }

    /// Returns the first entry the title starts with.
    pub fn matching_term(&self, title: &str) -> Option<&str> {
        let title = title.to_lowercase();
        self.prefixes
            .iter()
            .position(|p| title.starts_with(p.as_str()))
            .map(|idx| self.terms[idx].as_str())
    }

    /// Keeps only the records whose title matches.
    pub fn retain<'a, T: Titled>(&'a self, items: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        items.iter().filter(move |item| self.matches(item.title()))
    }

    /// Entries as originally written.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns a description of this filter.
    pub fn description(&self) -> String {
        format!("Title starts with: {}", self.terms.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eshop::models::IndexHit;

    fn hit(title: &str) -> IndexHit {
        IndexHit { title: title.to_string(), ..IndexHit::default() }
    }

    #[test]
    fn test_exact_title_matches() {
        let wishlist = Wishlist::new(["Aggelos"]).unwrap();
        assert!(wishlist.matches("Aggelos"));
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let wishlist = Wishlist::new(["DEAD cells", "shantae"]).unwrap();
        assert!(wishlist.matches("Dead Cells: Action Game of the Year"));
        assert!(wishlist.matches("Shantae and the Seven Sirens"));
        assert!(wishlist.matches("SHANTAE"));
    }

    #[test]
    fn test_non_matching_title_is_excluded() {
        let wishlist = Wishlist::new(["Aggelos"]).unwrap();
        assert!(!wishlist.matches("Picross S"));
        // Prefix, not substring.
        assert!(!wishlist.matches("The Aggelos Collection"));
        assert!(!wishlist.matches("Aggel"));
    }

    #[test]
    fn test_matching_term_returns_original_spelling() {
        let wishlist = Wishlist::new(["Dark Souls", "Dead Cells"]).unwrap();
        assert_eq!(wishlist.matching_term("dead cells"), Some("Dead Cells"));
        assert_eq!(wishlist.matching_term("Carrion"), None);
    }

    #[test]
    fn test_retain() {
        let wishlist = Wishlist::new(["Aggelos"]).unwrap();
        let hits = vec![hit("Picross"), hit("Aggelos"), hit("aggelos deluxe")];
        let kept: Vec<&str> = wishlist.retain(&hits).map(|h| h.title.as_str()).collect();
        assert_eq!(kept, vec!["Aggelos", "aggelos deluxe"]);
    }

    #[test]
    fn test_empty_wishlist_rejected() {
        assert_eq!(Wishlist::new(Vec::<String>::new()).unwrap_err(), WishlistError::Empty);
    }

    #[test]
    fn test_blank_entry_rejected() {
        let err = Wishlist::new(["Aggelos", "  "]).unwrap_err();
        assert_eq!(err, WishlistError::BlankEntry(1));
        assert!(err.to_string().contains("blank"));
    }

    #[test]
    fn test_terms_and_description() {
        let wishlist = Wishlist::new(vec!["Carrion".to_string(), "Evergate".to_string()]).unwrap();
        assert_eq!(wishlist.len(), 2);
        assert!(!wishlist.is_empty());
        assert_eq!(wishlist.terms(), &["Carrion".to_string(), "Evergate".to_string()]);
        assert_eq!(wishlist.description(), "Title starts with: Carrion, Evergate");
    }
}
