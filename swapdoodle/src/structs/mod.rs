//! Data structures representing decoded and rendered Letters.
//!
//! - **Documents** ([`document`]): named blocks and decoded parts of a Letter
//! - **Stationery** ([`stationery`]): backgrounds and transparency mask
//! - **Sheets** ([`sheet`]): pen strokes of each drawing page
//! - **Mii** ([`mii`]): the sender's Mii record
//! - **Assets** ([`asset`]): encoded images ready for display
//! - **Rendered Letters** ([`rendered`]): post-processed documents

pub mod asset;
pub mod document;
pub mod mii;
pub mod rendered;
pub mod sheet;
pub mod stationery;
