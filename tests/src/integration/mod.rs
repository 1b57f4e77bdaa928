//! Integration flows between an API tier and a storage tier sharing a topic.

pub mod books;
pub mod flows;
pub mod support;
