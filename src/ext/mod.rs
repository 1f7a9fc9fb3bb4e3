// Extensions - Output handlers, config decoders and their hooks
pub mod json;
pub mod table;
pub mod text;

pub use json::{JsonConfigDecoder, JsonOutputHandler};
pub use table::{TableOutputHandler, TableStyle};
pub use text::TextOutputHandler;
