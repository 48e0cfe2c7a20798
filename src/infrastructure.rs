pub mod csv;
mod csv_file;
mod http;

pub use self::csv_file::*;
pub use self::http::*;
