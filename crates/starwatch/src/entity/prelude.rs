//! Common re-exports for convenient entity usage.

pub use super::star_record::{
    ActiveModel as StarRecordActiveModel, Column as StarRecordColumn, Entity as StarRecords,
    Model as StarRecordModel,
};
pub use super::version_record::{
    ActiveModel as VersionRecordActiveModel, Column as VersionRecordColumn,
    Entity as VersionRecords, Model as VersionRecordModel,
};
