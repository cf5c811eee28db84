pub mod blast_date;
pub mod error;
pub mod filter;
pub mod record;
pub mod source;
