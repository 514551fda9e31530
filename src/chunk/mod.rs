//! Generic chunk framing for the .vox container.
//!
//! ## File Structure
//!
//! ```text
//! +------------------+
//! | Magic: "VOX "    |  4 bytes
//! +------------------+
//! | Version          |  u32 LE (150)
//! +------------------+
//! | MAIN chunk       |  no content, every other chunk nested as children
//! +------------------+
//! ```

mod format;
mod reader;
mod writer;

pub use format::*;
pub use reader::*;
pub use writer::*;
