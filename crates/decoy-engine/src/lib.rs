// ===== Core engine modules =====
pub mod codec;
pub mod ledger;
pub mod matcher;
pub mod pipeline;
pub mod route;

// ===== Shared data types =====
pub mod body;
pub mod headers;

pub use body::Body;
pub use headers::Headers;
