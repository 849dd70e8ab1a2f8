// Student submissions: uploads with text extraction, listing for the analyzer,
// and serving the original file back.

pub mod handlers;
pub mod store;
