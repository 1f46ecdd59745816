//! SeaORM entity definitions for the starwatch database schema.

pub mod prelude;
pub mod star_record;
pub mod version_record;
