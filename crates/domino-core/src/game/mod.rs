pub mod record;

pub use record::GameRecord;
