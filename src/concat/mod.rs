//! Asset concatenation: URL encoding, request decoding, and file combining.
//!
//! # Module Structure
//!
//! ```text
//! concat/
//! ├── request    # inbound: `??` argument string → reference list
//! ├── encode     # outbound: path list → combined or cache-busted URL
//! ├── path       # reference → file under the document root
//! ├── mime       # extension → MIME type
//! ├── css        # url()/filter rewriting, @charset/@import hoisting
//! ├── minify     # lightningcss / oxc
//! ├── combine    # the request pipeline
//! └── error      # failure taxonomy → HTTP status
//! ```

mod combine;
mod css;
mod encode;
mod error;
pub mod mime;
mod minify;
mod path;
pub mod request;

pub use combine::{CombinedResponse, Combiner};
pub use encode::ReferenceEncoder;
pub use error::{ConcatError, ConcatResult};
