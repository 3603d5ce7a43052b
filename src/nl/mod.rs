//! Reader for the NL format, the problem representation AMPL hands to solvers.
//!
//! An NL file is a text header of ten lines followed by a body of segments.
//! The header fixes the problem dimensions and tells whether the body is text
//! (`g`) or binary (`b`). Binary bodies may be in the byte order of the
//! writing host, which need not be the reader's.
//!
//! # Body Grammar
//!
//! ```text
//! body        = { segment }
//! segment     = tag fields { item }
//! expr        = number | reference | string | operator | call
//! number      = ('n' real) | ('s' short) | ('l' long)
//! reference   = 'v' index
//! string      = 'h' length ':' chars
//! operator    = 'o' opcode [count] expr*
//! call        = 'f' index count expr*
//! ```
//!
//! In text bodies every node and every item sits on its own line, and
//! anything after the fields of a line is a comment. In binary bodies ints are
//! 4 bytes, reals 8 bytes, `s` literals 2 bytes and tags a single byte.
//!
//! # Segments
//!
//! | Tag | Description | Syntax |
//! |-----|-------------|--------|
//! | O | Objective | `O<index> <sense>` then `expr` |
//! | C | Algebraic constraint | `C<index>` then `expr` |
//! | L | Logical constraint | `L<index>` then `expr` |
//! | V | Common expression | `V<index> <terms> <position>`, terms, then `expr` |
//! | F | Imported function | `F<index> <type> <args> <name>` |
//! | S | Suffix | `S<kind> <count> <name>` then `<item> <value>` lines |
//! | r | Constraint bounds | `r` then one bound line per constraint |
//! | b | Variable bounds | `b` then one bound line per variable |
//! | k | Jacobian column sizes | `k<count>` then `count` sizes |
//! | J | Linear constraint part | `J<index> <count>` then `<var> <coef>` lines |
//! | G | Linear objective part | `G<index> <count>` then `<var> <coef>` lines |
//! | x | Initial primal values | `x<count>` then `<var> <value>` lines |
//! | d | Initial dual values | `d<count>` then `<con> <value>` lines |
//!
//! # Example
//!
//! ```text
//! g3 1 1 0    # problem example
//!  1 0 1 0 0
//!  0 1
//!  0 0
//!  0 1 0
//!  0 0 0 1
//!  0 0 0 0 0
//!  0 1
//!  0 0
//!  0 0 0 0 0
//! O0 0
//! o41
//! v0
//! ```

mod expr;
mod handler;
mod header;
mod lexer;
mod opcode;
mod parser;

pub use expr::Expr;
pub use handler::{
    Bounds, Complementarity, FunctionKind, Handler, LinearTerm, NullHandler, Suffix, SuffixKind,
    SuffixValues,
};
pub use header::{read_header, Format, Header, SWAPPED_ARITH_KIND};
pub use lexer::{
    BinaryReader, Cursor, NativeBinaryReader, Position, SwappedBinaryReader, SwappedEndian,
    TextReader, TokenReader,
};
pub use opcode::{Arity, Notation, Opcode};
pub use parser::Reader;

use std::path::Path;

use crate::error::{NlError, Result};

/// Check NL input held in memory without keeping any of its contents.
pub fn read(source: &[u8], source_name: &str) -> Result<()> {
    Reader::new(NullHandler).read(source, source_name)
}

/// Check an NL string.
pub fn read_str(input: &str) -> Result<()> {
    Reader::new(NullHandler).read_str(input)
}

/// Check an NL file.
pub fn read_file(path: &Path) -> Result<()> {
    Reader::new(NullHandler).read_file(path)
}

/// Read only the header of an NL file.
pub fn read_file_header(path: &Path) -> Result<Header> {
    let content = load_file(path)?;
    let name = path.display().to_string();
    read_header(&mut TextReader::new(&content, &name))
}

/// Load the contents of an NL file.
pub(crate) fn load_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| NlError::FileRead {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "g3 1 1 0\t# problem example\n \
                           1 0 1 0 0\n 0 1\n 0 0\n 0 1 0\n 0 0 0 1\n 0 0 0 0 0\n 0 1\n 0 0\n 0 0 0 0 0\n\
                           O0 0\no41\nv0\n";

    #[test]
    fn test_read_str() {
        read_str(EXAMPLE).unwrap();
    }

    #[test]
    fn test_header_error_position() {
        let err = read_str("x").unwrap_err();
        assert_eq!(err.to_string(), "(input):1:1: expected format specifier");
    }

    #[test]
    fn test_read_named_source() {
        let err = read(b"g\n 1", "model.nl").unwrap_err();
        assert!(err.to_string().starts_with("model.nl:2:"));
    }

    #[test]
    fn test_read_file_missing() {
        let err = read_file(Path::new("/nonexistent/model.nl")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read NL file '/nonexistent/model.nl'"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = Path::new("/nonexistent/header.nl");
        let err = read_file_header(path).unwrap_err();
        assert!(matches!(err, NlError::FileRead { .. }));
        assert!(err.to_string().starts_with("Failed to read NL file '/nonexistent/header.nl'"));

        let err = Reader::new(NullHandler).read_file(path).unwrap_err();
        assert!(matches!(err, NlError::FileRead { .. }));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_read_file_header() {
        let path = std::env::temp_dir().join(format!("nlreader-header-{}.nl", std::process::id()));
        std::fs::write(&path, EXAMPLE).unwrap();
        let header = read_file_header(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(header.num_vars, 1);
        assert_eq!(header.num_objs, 1);
        assert_eq!(header.num_nl_objs, 1);
    }
}
