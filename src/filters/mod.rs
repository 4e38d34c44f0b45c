//! Title filtering against the user's wishlist.

pub mod wishlist;

use crate::eshop::models::{GeoDoc, IndexHit, SwitchGame};

pub use wishlist::{Wishlist, WishlistError};

/// Anything with a title a wishlist can be matched against.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for IndexHit {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for GeoDoc {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for SwitchGame {
    fn title(&self) -> &str {
        &self.title
    }
}
