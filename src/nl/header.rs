//! NL header: problem dimensions and format information.
//!
//! The header occupies the first ten lines of every NL file, in text even
//! when the body is binary:
//!
//! ```text
//! g9 2 3 5 7 11 13 17 19 23 1.23   format, options, vbtol
//!  29 47 37 41 43 31               vars, cons, objs, ranges, eqns, logical cons
//!  53 59 6 61 71 73                nonlinear cons/objs, complementarity
//!  79 83                           network cons
//!  89 97 101                       nonlinear vars
//!  103 107 0 109                   linear network vars, funcs, arith, flags
//!  113 127 131 137 139             discrete vars
//!  149 151                         nonzeros
//!  157 163                         max name lengths
//!  167 173 179 181 191             common expressions
//! ```

use std::fmt;

use log::debug;

use super::lexer::{TextReader, TokenReader};
use crate::error::Result;
use crate::{MAX_NL_OPTIONS, NATIVE_ARITH_KIND};

/// Arithmetic kind of a binary file written with the opposite byte order.
pub const SWAPPED_ARITH_KIND: i32 = 3 - NATIVE_ARITH_KIND;

/// Encoding of the body of an NL file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    /// Binary in the reader's byte order
    Binary,
    /// Binary in the opposite byte order
    BinarySwapped,
}

impl Format {
    /// Arithmetic kind code written on header line 6.
    pub fn arith_kind(self) -> i32 {
        match self {
            Self::Text => 0,
            Self::Binary => NATIVE_ARITH_KIND,
            Self::BinarySwapped => SWAPPED_ARITH_KIND,
        }
    }

    /// Format of a `b` file given its arithmetic kind; 0 means unspecified.
    fn binary_from_arith_kind(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Binary),
            c if c == NATIVE_ARITH_KIND => Some(Self::Binary),
            c if c == SWAPPED_ARITH_KIND => Some(Self::BinarySwapped),
            _ => None,
        }
    }
}

/// Problem dimensions and format information from the NL header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Header {
    pub format: Format,

    // Line 1
    pub num_options: i32,
    pub options: [i32; MAX_NL_OPTIONS],
    /// Branching tolerance; only on the wire when [`Header::has_vbtol`] holds
    pub vbtol: f64,

    // Line 2
    pub num_vars: i32,
    pub num_algebraic_cons: i32,
    pub num_objs: i32,
    pub num_ranges: i32,
    pub num_eqns: i32,
    pub num_logical_cons: i32,

    // Line 3
    pub num_nl_cons: i32,
    pub num_nl_objs: i32,
    /// Total complementarity conditions, linear and nonlinear
    pub num_compl_conds: i32,
    pub num_nl_compl_conds: i32,
    /// `-1` when the file does not say
    pub num_compl_dbl_ineqs: i32,
    pub num_compl_vars_with_nz_lb: i32,

    // Line 4
    pub num_nl_net_cons: i32,
    pub num_linear_net_cons: i32,

    // Line 5
    pub num_nl_vars_in_cons: i32,
    pub num_nl_vars_in_objs: i32,
    pub num_nl_vars_in_both: i32,

    // Line 6
    pub num_linear_net_vars: i32,
    pub num_funcs: i32,
    pub flags: i32,

    // Line 7
    pub num_linear_binary_vars: i32,
    pub num_linear_integer_vars: i32,
    pub num_nl_integer_vars_in_both: i32,
    pub num_nl_integer_vars_in_cons: i32,
    pub num_nl_integer_vars_in_objs: i32,

    // Line 8
    pub num_con_nonzeros: i32,
    pub num_obj_nonzeros: i32,

    // Line 9
    pub max_con_name_len: i32,
    pub max_var_name_len: i32,

    // Line 10
    pub num_common_exprs_in_both: i32,
    pub num_common_exprs_in_cons: i32,
    pub num_common_exprs_in_objs: i32,
    pub num_common_exprs_in_single_cons: i32,
    pub num_common_exprs_in_single_objs: i32,
}

impl Header {
    /// Flag bit asking the solver to write suffixes to its solution file.
    pub const WANT_OUTPUT_SUFFIXES: i32 = 1;

    /// Whether `vbtol` is carried on line 1: at least three options with a
    /// nonzero third one.
    pub fn has_vbtol(&self) -> bool {
        self.num_options >= 3 && self.options[2] != 0
    }

    /// Total number of common subexpressions.
    pub fn num_common_exprs(&self) -> i64 {
        [
            self.num_common_exprs_in_both,
            self.num_common_exprs_in_cons,
            self.num_common_exprs_in_objs,
            self.num_common_exprs_in_single_cons,
            self.num_common_exprs_in_single_objs,
        ]
        .iter()
        .map(|&n| i64::from(n))
        .sum()
    }

    fn supplied_options(&self) -> &[i32] {
        let count = usize::try_from(self.num_options).unwrap_or(0).min(MAX_NL_OPTIONS);
        &self.options[..count]
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[i32]) -> fmt::Result {
    for field in fields {
        write!(f, " {}", field)?;
    }
    writeln!(f)
}

/// Writes the ten header lines of a file in this header's format.
impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.format {
            Format::Text => 'g',
            Format::Binary | Format::BinarySwapped => 'b',
        };
        write!(f, "{}{}", tag, self.num_options)?;
        for option in self.supplied_options() {
            write!(f, " {}", option)?;
        }
        if self.has_vbtol() {
            write!(f, " {}", self.vbtol)?;
        }
        writeln!(f)?;

        write_fields(
            f,
            &[
                self.num_vars,
                self.num_algebraic_cons,
                self.num_objs,
                self.num_ranges,
                self.num_eqns,
                self.num_logical_cons,
            ],
        )?;
        write_fields(
            f,
            &[
                self.num_nl_cons,
                self.num_nl_objs,
                self.num_compl_conds - self.num_nl_compl_conds,
                self.num_nl_compl_conds,
                self.num_compl_dbl_ineqs,
                self.num_compl_vars_with_nz_lb,
            ],
        )?;
        write_fields(f, &[self.num_nl_net_cons, self.num_linear_net_cons])?;
        write_fields(
            f,
            &[
                self.num_nl_vars_in_cons,
                self.num_nl_vars_in_objs,
                self.num_nl_vars_in_both,
            ],
        )?;
        write_fields(
            f,
            &[
                self.num_linear_net_vars,
                self.num_funcs,
                self.format.arith_kind(),
                self.flags,
            ],
        )?;
        write_fields(
            f,
            &[
                self.num_linear_binary_vars,
                self.num_linear_integer_vars,
                self.num_nl_integer_vars_in_both,
                self.num_nl_integer_vars_in_cons,
                self.num_nl_integer_vars_in_objs,
            ],
        )?;
        write_fields(f, &[self.num_con_nonzeros, self.num_obj_nonzeros])?;
        write_fields(f, &[self.max_con_name_len, self.max_var_name_len])?;
        write_fields(
            f,
            &[
                self.num_common_exprs_in_both,
                self.num_common_exprs_in_cons,
                self.num_common_exprs_in_objs,
                self.num_common_exprs_in_single_cons,
                self.num_common_exprs_in_single_objs,
            ],
        )
    }
}

/// Read optional fields in order, stopping at the first one that is absent.
/// Returns whether all of them were present.
fn read_optional_fields(reader: &mut TextReader<'_>, fields: &mut [&mut i32]) -> Result<bool> {
    for field in fields.iter_mut() {
        match reader.read_optional_nonnegative_integer()? {
            Some(value) => **field = value,
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Read an optional count that may also be `-1`, meaning unknown.
fn read_optional_count_or_unknown(reader: &mut TextReader<'_>) -> Result<Option<i32>> {
    reader.skip_space();
    let start = reader.position();
    match reader.read_optional_integer()? {
        Some(value) if value < -1 => {
            Err(reader.syntax_error(start, "expected nonnegative integer"))
        }
        value => Ok(value),
    }
}

fn read_options(reader: &mut TextReader<'_>, header: &mut Header) -> Result<()> {
    reader.skip_space();
    let count_pos = reader.position();
    let Some(count) = reader.read_optional_nonnegative_integer()? else {
        return Ok(());
    };
    if count as usize > MAX_NL_OPTIONS {
        return Err(reader.semantic_error(count_pos, "too many options"));
    }
    header.num_options = count;
    for option in header.options.iter_mut().take(count as usize) {
        match reader.read_optional_integer()? {
            Some(value) => *option = value,
            None => return Ok(()),
        }
    }
    if header.has_vbtol() {
        if let Some(vbtol) = reader.read_optional_real() {
            header.vbtol = vbtol;
        }
    }
    Ok(())
}

/// Parse the ten header lines, leaving `reader` at the start of the body.
pub fn read_header(reader: &mut TextReader<'_>) -> Result<Header> {
    let mut header = Header::default();

    let start = reader.position();
    header.format = match reader.read_char() {
        Some(b'g') => Format::Text,
        Some(b'b') => Format::Binary,
        _ => return Err(reader.syntax_error(start, "expected format specifier")),
    };
    read_options(reader, &mut header)?;
    reader.skip_to_next_line();

    header.num_vars = reader.read_nonnegative_integer()?;
    header.num_algebraic_cons = reader.read_nonnegative_integer()?;
    header.num_objs = reader.read_nonnegative_integer()?;
    read_optional_fields(
        reader,
        &mut [
            &mut header.num_ranges,
            &mut header.num_eqns,
            &mut header.num_logical_cons,
        ],
    )?;
    reader.skip_to_next_line();

    header.num_nl_cons = reader.read_nonnegative_integer()?;
    header.num_nl_objs = reader.read_nonnegative_integer()?;
    let mut num_linear_compl_conds = 0;
    let mut all_compl = read_optional_fields(
        reader,
        &mut [&mut num_linear_compl_conds, &mut header.num_nl_compl_conds],
    )?;
    if all_compl {
        all_compl = match read_optional_count_or_unknown(reader)? {
            Some(value) => {
                header.num_compl_dbl_ineqs = value;
                read_optional_fields(reader, &mut [&mut header.num_compl_vars_with_nz_lb])?
            }
            None => false,
        };
    }
    header.num_compl_conds = num_linear_compl_conds.saturating_add(header.num_nl_compl_conds);
    if header.num_compl_conds > 0 && !all_compl {
        header.num_compl_dbl_ineqs = -1;
    }
    reader.skip_to_next_line();

    header.num_nl_net_cons = reader.read_nonnegative_integer()?;
    header.num_linear_net_cons = reader.read_nonnegative_integer()?;
    reader.skip_to_next_line();

    header.num_nl_vars_in_cons = reader.read_nonnegative_integer()?;
    header.num_nl_vars_in_objs = reader.read_nonnegative_integer()?;
    let has_vars_in_both = read_optional_fields(reader, &mut [&mut header.num_nl_vars_in_both])?;
    reader.skip_to_next_line();

    header.num_linear_net_vars = reader.read_nonnegative_integer()?;
    header.num_funcs = reader.read_nonnegative_integer()?;
    reader.skip_space();
    let arith_pos = reader.position();
    if let Some(arith) = reader.read_optional_integer()? {
        // Text bodies have no byte order; the code is carried but unused.
        if header.format != Format::Text {
            header.format = Format::binary_from_arith_kind(arith)
                .ok_or_else(|| reader.semantic_error(arith_pos, "unrecognized binary format"))?;
        }
        read_optional_fields(reader, &mut [&mut header.flags])?;
    }
    reader.skip_to_next_line();

    header.num_linear_binary_vars = reader.read_nonnegative_integer()?;
    header.num_linear_integer_vars = reader.read_nonnegative_integer()?;
    // Files without a count of nonlinear variables in both constraints and
    // objectives predate the nonlinear integer counts as well.
    if has_vars_in_both {
        header.num_nl_integer_vars_in_both = reader.read_nonnegative_integer()?;
        header.num_nl_integer_vars_in_cons = reader.read_nonnegative_integer()?;
        header.num_nl_integer_vars_in_objs = reader.read_nonnegative_integer()?;
    }
    reader.skip_to_next_line();

    header.num_con_nonzeros = reader.read_nonnegative_integer()?;
    header.num_obj_nonzeros = reader.read_nonnegative_integer()?;
    reader.skip_to_next_line();

    header.max_con_name_len = reader.read_nonnegative_integer()?;
    header.max_var_name_len = reader.read_nonnegative_integer()?;
    reader.skip_to_next_line();

    header.num_common_exprs_in_both = reader.read_nonnegative_integer()?;
    header.num_common_exprs_in_cons = reader.read_nonnegative_integer()?;
    header.num_common_exprs_in_objs = reader.read_nonnegative_integer()?;
    header.num_common_exprs_in_single_cons = reader.read_nonnegative_integer()?;
    header.num_common_exprs_in_single_objs = reader.read_nonnegative_integer()?;
    reader.skip_to_next_line();

    debug!(
        "header: {:?}, {} vars, {} cons, {} objs, {} logical cons",
        header.format,
        header.num_vars,
        header.num_algebraic_cons,
        header.num_objs,
        header.num_logical_cons
    );
    Ok(header)
}
