//! HTML Pages
//!
//! Server-rendered pages: the site root and the landing page for
//! confirmation links.
//!
//! - **`index`** - GET /
//! - **`confirm_email`** - GET /confirm-email/{token}
//! - **`templates`** - layout and escaping helpers

pub mod templates;

pub mod index;

pub mod confirm_email;

pub use confirm_email::confirm_email;
pub use index::index;
