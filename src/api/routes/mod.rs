//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod bookmarks;
pub mod channels;
pub mod distances;
pub mod feedback;
pub mod friends;
pub mod groups;
pub mod health;
pub mod images;
pub mod preorder;
pub mod profiles;
pub mod restaurants;
pub mod tax_rate;
