//! XER (XML Encoding Rules) output
//!
//! One element per value, named after the field, the chosen alternative or
//! (for the document root, list elements and open types) the type:
//!
//! ```text
//! <Header>
//!   <version>3</version>
//!   <flag><true/></flag>
//!   <extensions/>
//! </Header>
//! ```
//!
//! Output is well-formed XML except for the REAL special values `INF`,
//! `-INF` and `NaN`, which are written as bare content.

pub mod encoder;
pub mod tag_state;

pub use encoder::{XerEncoder, encode_xer, escape_text};
pub use tag_state::{TagState, TagWriter};
