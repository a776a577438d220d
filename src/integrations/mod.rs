//! External service integrations.

pub mod narrative {
    pub use crate::narrative::*;
}

pub mod narrative_cache {
    pub use crate::narrative_cache::*;
}
