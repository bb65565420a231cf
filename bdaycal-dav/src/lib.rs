//! WebDAV plumbing for bdaycal: the calendar collection transport and the
//! CardDAV address book the contacts come from.

pub mod carddav;
pub mod client;
mod requests;
pub mod vcard;

pub use carddav::CardDavSource;
pub use client::DavClient;
