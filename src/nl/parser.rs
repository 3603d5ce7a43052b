//! Reader for NL files: segment dispatch and expression trees.

use std::path::Path;

use log::trace;

use super::expr::Expr;
use super::handler::{
    Bounds, Complementarity, FunctionKind, Handler, LinearTerm, NullHandler, Suffix, SuffixKind,
    SuffixValues,
};
use super::header::{read_header, Format, Header};
use super::lexer::{NativeBinaryReader, SwappedBinaryReader, TextReader, TokenReader};
use super::opcode::{Arity, Opcode};
use crate::error::Result;
use crate::{DEFAULT_MAX_EXPR_DEPTH, INPUT_SOURCE_NAME};

/// Reads NL input and passes its contents to a [`Handler`].
///
/// A reader keeps no state between calls; the same reader can read any
/// number of inputs in sequence.
#[derive(Debug)]
pub struct Reader<H = NullHandler> {
    handler: H,
    max_depth: usize,
}

impl Default for Reader<NullHandler> {
    fn default() -> Self {
        Self::new(NullHandler)
    }
}

impl<H: Handler> Reader<H> {
    /// Create a new reader delivering to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            max_depth: DEFAULT_MAX_EXPR_DEPTH,
        }
    }

    /// Limit the nesting depth of expressions.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Read a complete NL file held in memory.
    ///
    /// `source_name` only appears in error messages. Callbacks already made
    /// before an error are not undone.
    pub fn read(&mut self, source: &[u8], source_name: &str) -> Result<()> {
        let mut text = TextReader::new(source, source_name);
        let header = read_header(&mut text)?;
        self.handler.handle_header(header);

        let cursor = text.into_cursor();
        match header.format {
            Format::Text => SegmentParser::new(
                TextReader::from_cursor(cursor),
                header,
                &mut self.handler,
                self.max_depth,
            )
            .parse(),
            Format::Binary => SegmentParser::new(
                NativeBinaryReader::from_cursor(cursor),
                header,
                &mut self.handler,
                self.max_depth,
            )
            .parse(),
            Format::BinarySwapped => SegmentParser::new(
                SwappedBinaryReader::from_cursor(cursor),
                header,
                &mut self.handler,
                self.max_depth,
            )
            .parse(),
        }
    }

    /// Read NL input from a string, reported as `(input)` in errors.
    pub fn read_str(&mut self, input: &str) -> Result<()> {
        self.read(input.as_bytes(), INPUT_SOURCE_NAME)
    }

    /// Read an NL file from disk.
    pub fn read_file(&mut self, path: &Path) -> Result<()> {
        let content = super::load_file(path)?;
        self.read(&content, &path.display().to_string())
    }
}

/// State of one pass over the body of an NL file.
struct SegmentParser<'h, R, H> {
    reader: R,
    header: Header,
    handler: &'h mut H,
    max_depth: usize,
}

impl<'h, R: TokenReader, H: Handler> SegmentParser<'h, R, H> {
    fn new(reader: R, header: Header, handler: &'h mut H, max_depth: usize) -> Self {
        Self {
            reader,
            header,
            handler,
            max_depth,
        }
    }

    fn parse(mut self) -> Result<()> {
        loop {
            self.reader.begin_segment();
            let start = self.reader.position();
            let Some(tag) = self.reader.read_char() else {
                return Ok(());
            };
            trace!("segment '{}' at {}:{}", char::from(tag), start.line, start.column);
            match tag {
                b'C' => self.read_algebraic_constraint()?,
                b'L' => self.read_logical_constraint()?,
                b'O' => self.read_objective()?,
                b'V' => self.read_common_expression()?,
                b'F' => self.read_function()?,
                b'S' => self.read_suffix()?,
                b'r' => self.read_constraint_bounds()?,
                b'b' => self.read_variable_bounds()?,
                b'k' => self.read_column_sizes()?,
                b'J' => self.read_linear_constraint()?,
                b'G' => self.read_linear_objective()?,
                b'x' => self.read_initial_values()?,
                b'd' => self.read_initial_dual_values()?,
                _ => {
                    return Err(self.reader.syntax_error(
                        start,
                        format!("invalid segment type '{}'", char::from(tag).escape_default()),
                    ));
                }
            }
        }
    }

    /// Read an index and check it against `count` items of kind `what`.
    fn read_index(&mut self, count: i32, what: &str) -> Result<usize> {
        let at = self.reader.token_position();
        let index = self.reader.read_nonnegative_integer()?;
        if index >= count {
            return Err(self
                .reader
                .semantic_error(at, format!("{} index {} is out of bounds", what, index)));
        }
        Ok(index as usize)
    }

    fn read_count(&mut self) -> Result<usize> {
        Ok(self.reader.read_nonnegative_integer()? as usize)
    }

    /// Read a count of entries that must not exceed `limit`.
    fn read_bounded_count(&mut self, limit: i32, message: &str) -> Result<usize> {
        let at = self.reader.token_position();
        let count = self.reader.read_nonnegative_integer()?;
        if count > limit {
            return Err(self.reader.semantic_error(at, message));
        }
        Ok(count as usize)
    }

    // ============ Segments ============

    fn read_objective(&mut self) -> Result<()> {
        let index = self.read_index(self.header.num_objs, "objective")?;
        let sense = self.reader.read_nonnegative_integer()?;
        self.reader.skip_to_next_line();
        let expr = self.read_expr(0)?;
        self.handler.handle_objective(index, sense != 0, expr);
        Ok(())
    }

    fn read_algebraic_constraint(&mut self) -> Result<()> {
        let index = self.read_index(self.header.num_algebraic_cons, "constraint")?;
        self.reader.skip_to_next_line();
        let expr = self.read_expr(0)?;
        self.handler.handle_algebraic_constraint(index, expr);
        Ok(())
    }

    fn read_logical_constraint(&mut self) -> Result<()> {
        let index = self.read_index(self.header.num_logical_cons, "logical constraint")?;
        self.reader.skip_to_next_line();
        let expr = self.read_expr(0)?;
        self.handler.handle_logical_constraint(index, expr);
        Ok(())
    }

    fn read_common_expression(&mut self) -> Result<()> {
        let at = self.reader.token_position();
        let index = i64::from(self.reader.read_nonnegative_integer()?);
        let num_terms = self.read_count()?;
        let position = self.read_count()?;
        self.reader.skip_to_next_line();

        // Common expressions are numbered after the variables.
        let first = i64::from(self.header.num_vars);
        if index < first || index - first >= self.header.num_common_exprs() {
            return Err(self
                .reader
                .semantic_error(at, format!("common expression index {} is out of bounds", index)));
        }
        let linear = self.read_linear_terms(num_terms)?;
        let expr = self.read_expr(0)?;
        self.handler
            .handle_common_expression((index - first) as usize, position, linear, expr);
        Ok(())
    }

    fn read_function(&mut self) -> Result<()> {
        let index = self.read_index(self.header.num_funcs, "function")?;
        let kind_pos = self.reader.token_position();
        let kind = match self.reader.read_nonnegative_integer()? {
            0 => FunctionKind::Numeric,
            1 => FunctionKind::Symbolic,
            _ => return Err(self.reader.semantic_error(kind_pos, "invalid function type")),
        };
        let num_args = self.reader.read_integer()?;
        let name = self.reader.read_name()?;
        self.reader.skip_to_next_line();
        self.handler.handle_function(index, &name, num_args, kind);
        Ok(())
    }

    fn read_suffix(&mut self) -> Result<()> {
        let bits = self.reader.read_nonnegative_integer()?;
        let num_values = self.read_count()?;
        let name = self.reader.read_name()?;
        self.reader.skip_to_next_line();

        let kind = SuffixKind::from_bits(bits);
        let num_items = match kind {
            SuffixKind::Variable => self.header.num_vars,
            SuffixKind::Constraint => self.header.num_algebraic_cons,
            SuffixKind::Objective => self.header.num_objs,
            SuffixKind::Problem => 1,
        };
        let values = if bits & 4 != 0 {
            let mut values = Vec::new();
            for _ in 0..num_values {
                let index = self.read_index(num_items, "suffix")?;
                values.push((index, self.reader.read_real()?));
                self.reader.skip_to_next_line();
            }
            SuffixValues::Real(values)
        } else {
            let mut values = Vec::new();
            for _ in 0..num_values {
                let index = self.read_index(num_items, "suffix")?;
                values.push((index, self.reader.read_integer()?));
                self.reader.skip_to_next_line();
            }
            SuffixValues::Int(values)
        };
        self.handler.handle_suffix(Suffix { kind, name, values });
        Ok(())
    }

    /// Read one bound line. Returns `None` for a complementarity line, which
    /// has already been delivered.
    fn read_bound(&mut self, constraint: Option<usize>) -> Result<Option<Bounds>> {
        let at = self.reader.token_position();
        let bounds = match self.reader.read_char() {
            Some(b'0') => {
                let lower = self.reader.read_real()?;
                let upper = self.reader.read_real()?;
                Bounds::Range { lower, upper }
            }
            Some(b'1') => Bounds::Upper(self.reader.read_real()?),
            Some(b'2') => Bounds::Lower(self.reader.read_real()?),
            Some(b'3') => Bounds::Free,
            Some(b'4') => Bounds::Equal(self.reader.read_real()?),
            Some(b'5') if constraint.is_some() => {
                let flags = self.reader.read_integer()?;
                let var_pos = self.reader.token_position();
                let variable = self.reader.read_nonnegative_integer()?;
                if variable < 1 || variable > self.header.num_vars {
                    return Err(self.reader.semantic_error(
                        var_pos,
                        format!("variable index {} is out of bounds", variable),
                    ));
                }
                self.reader.skip_to_next_line();
                if let Some(index) = constraint {
                    let condition = Complementarity {
                        variable: variable as usize - 1,
                        flags,
                    };
                    self.handler.handle_complementarity(index, condition);
                }
                return Ok(None);
            }
            _ => return Err(self.reader.syntax_error(at, "invalid bound type")),
        };
        self.reader.skip_to_next_line();
        Ok(Some(bounds))
    }

    fn read_constraint_bounds(&mut self) -> Result<()> {
        self.reader.skip_to_next_line();
        for index in 0..self.header.num_algebraic_cons as usize {
            if let Some(bounds) = self.read_bound(Some(index))? {
                self.handler.handle_constraint_bounds(index, bounds);
            }
        }
        Ok(())
    }

    fn read_variable_bounds(&mut self) -> Result<()> {
        self.reader.skip_to_next_line();
        for index in 0..self.header.num_vars as usize {
            if let Some(bounds) = self.read_bound(None)? {
                self.handler.handle_variable_bounds(index, bounds);
            }
        }
        Ok(())
    }

    fn read_column_sizes(&mut self) -> Result<()> {
        let at = self.reader.token_position();
        let count = self.reader.read_nonnegative_integer()?;
        let expected = (self.header.num_vars - 1).max(0);
        if count != expected {
            return Err(self.reader.semantic_error(at, format!("expected {}", expected)));
        }
        self.reader.skip_to_next_line();
        let mut sizes = Vec::new();
        for _ in 0..count {
            sizes.push(self.read_count()?);
            self.reader.skip_to_next_line();
        }
        self.handler.handle_column_sizes(sizes);
        Ok(())
    }

    fn read_linear_terms(&mut self, count: usize) -> Result<Vec<LinearTerm>> {
        let mut terms = Vec::new();
        for _ in 0..count {
            let variable = self.read_index(self.header.num_vars, "variable")?;
            let coef = self.reader.read_real()?;
            self.reader.skip_to_next_line();
            terms.push(LinearTerm { variable, coef });
        }
        Ok(terms)
    }

    fn read_linear_constraint(&mut self) -> Result<()> {
        let index = self.read_index(self.header.num_algebraic_cons, "constraint")?;
        let num_terms = self.read_count()?;
        self.reader.skip_to_next_line();
        let terms = self.read_linear_terms(num_terms)?;
        self.handler.handle_linear_constraint(index, terms);
        Ok(())
    }

    fn read_linear_objective(&mut self) -> Result<()> {
        let index = self.read_index(self.header.num_objs, "objective")?;
        let num_terms = self.read_count()?;
        self.reader.skip_to_next_line();
        let terms = self.read_linear_terms(num_terms)?;
        self.handler.handle_linear_objective(index, terms);
        Ok(())
    }

    fn read_initial_values(&mut self) -> Result<()> {
        let count = self.read_bounded_count(self.header.num_vars, "too many initial values")?;
        self.reader.skip_to_next_line();
        for _ in 0..count {
            let variable = self.read_index(self.header.num_vars, "variable")?;
            let value = self.reader.read_real()?;
            self.reader.skip_to_next_line();
            self.handler.handle_initial_value(variable, value);
        }
        Ok(())
    }

    fn read_initial_dual_values(&mut self) -> Result<()> {
        let num_cons = self.header.num_algebraic_cons;
        let count = self.read_bounded_count(num_cons, "too many initial values")?;
        self.reader.skip_to_next_line();
        for _ in 0..count {
            let constraint = self.read_index(num_cons, "constraint")?;
            let value = self.reader.read_real()?;
            self.reader.skip_to_next_line();
            self.handler.handle_initial_dual_value(constraint, value);
        }
        Ok(())
    }

    // ============ Expressions ============

    fn read_expr(&mut self, depth: usize) -> Result<Expr> {
        let start = self.reader.position();
        if depth > self.max_depth {
            return Err(self
                .reader
                .semantic_error(start, "expression nesting is too deep"));
        }
        let expr = match self.reader.read_char() {
            Some(b'n') => Expr::Number(self.reader.read_real()?),
            Some(b's') => Expr::Number(f64::from(self.reader.read_short()?)),
            Some(b'l') => Expr::Number(f64::from(self.reader.read_long()?)),
            Some(b'v') => self.read_reference()?,
            Some(b'h') => Expr::String(self.reader.read_string()?),
            Some(b'o') => return self.read_operator(depth),
            Some(b'f') => return self.read_call(depth),
            _ => return Err(self.reader.syntax_error(start, "expected expression")),
        };
        self.reader.skip_to_next_line();
        Ok(expr)
    }

    /// Payload of a `v` node; the tag has been consumed.
    fn read_reference(&mut self) -> Result<Expr> {
        let index = self.read_count()?;
        let num_vars = self.header.num_vars as usize;
        Ok(if index < num_vars {
            Expr::Variable(index)
        } else {
            Expr::CommonExpr(index - num_vars)
        })
    }

    fn read_operator(&mut self, depth: usize) -> Result<Expr> {
        let at = self.reader.token_position();
        let code = self.reader.read_nonnegative_integer()?;
        self.reader.skip_to_next_line();
        let opcode = Opcode::from_code(code)
            .ok_or_else(|| self.reader.syntax_error(at, format!("invalid opcode {}", code)))?;

        let num_args = match opcode.arity() {
            Arity::Fixed(n) => n,
            Arity::Variadic => {
                let n = self.read_count()?;
                self.reader.skip_to_next_line();
                n
            }
            Arity::PiecewiseLinear => return self.read_piecewise_linear(),
        };
        let mut args = Vec::new();
        for _ in 0..num_args {
            args.push(self.read_expr(depth + 1)?);
        }
        Ok(Expr::Op { opcode, args })
    }

    fn read_constant(&mut self) -> Result<f64> {
        let start = self.reader.position();
        let value = match self.reader.read_char() {
            Some(b'n') => self.reader.read_real()?,
            Some(b's') => f64::from(self.reader.read_short()?),
            Some(b'l') => f64::from(self.reader.read_long()?),
            _ => return Err(self.reader.syntax_error(start, "expected constant")),
        };
        self.reader.skip_to_next_line();
        Ok(value)
    }

    fn read_piecewise_linear(&mut self) -> Result<Expr> {
        let at = self.reader.token_position();
        let num_slopes = self.read_count()?;
        if num_slopes < 2 {
            return Err(self
                .reader
                .semantic_error(at, "too few slopes in piecewise-linear term"));
        }
        self.reader.skip_to_next_line();

        let mut slopes = Vec::new();
        let mut breakpoints = Vec::new();
        for _ in 1..num_slopes {
            slopes.push(self.read_constant()?);
            breakpoints.push(self.read_constant()?);
        }
        slopes.push(self.read_constant()?);

        let start = self.reader.position();
        if self.reader.read_char() != Some(b'v') {
            return Err(self.reader.syntax_error(start, "expected reference"));
        }
        let argument = self.read_reference()?;
        self.reader.skip_to_next_line();
        Ok(Expr::PiecewiseLinear {
            slopes,
            breakpoints,
            argument: Box::new(argument),
        })
    }

    fn read_call(&mut self, depth: usize) -> Result<Expr> {
        let function = self.read_index(self.header.num_funcs, "function")?;
        let num_args = self.read_count()?;
        self.reader.skip_to_next_line();
        let mut args = Vec::new();
        for _ in 0..num_args {
            args.push(self.read_expr(depth + 1)?);
        }
        Ok(Expr::Call { function, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NlError;
    use crate::nl::SwappedEndian;
    use approx::assert_relative_eq;
    use byteorder::{ByteOrder, NativeEndian, WriteBytesExt};

    /// Records callbacks as readable text, one line each.
    #[derive(Default)]
    struct TestHandler {
        header: Header,
        log: String,
        obj_exprs: Vec<Option<Expr>>,
    }

    impl Handler for TestHandler {
        fn handle_header(&mut self, header: Header) {
            self.header = header;
            self.obj_exprs = vec![None; header.num_objs as usize];
            self.log.clear();
        }

        fn handle_objective(&mut self, index: usize, maximize: bool, expr: Expr) {
            let sense = if maximize { "maximize" } else { "minimize" };
            self.log
                .push_str(&format!("{} o{}: {};\n", sense, index + 1, expr));
            self.obj_exprs[index] = Some(expr);
        }

        fn handle_algebraic_constraint(&mut self, index: usize, expr: Expr) {
            self.log.push_str(&format!("c{}: {};\n", index + 1, expr));
        }

        fn handle_logical_constraint(&mut self, index: usize, expr: Expr) {
            self.log.push_str(&format!("l{}: {};\n", index + 1, expr));
        }

        fn handle_common_expression(
            &mut self,
            index: usize,
            position: usize,
            linear: Vec<LinearTerm>,
            expr: Expr,
        ) {
            let terms: Vec<String> = linear
                .iter()
                .map(|t| format!("{} * x{}", t.coef, t.variable + 1))
                .collect();
            self.log.push_str(&format!(
                "e{} @{}: {} | {};\n",
                index + 1,
                position,
                terms.join(" + "),
                expr
            ));
        }

        fn handle_function(&mut self, index: usize, name: &str, num_args: i32, kind: FunctionKind) {
            self.log
                .push_str(&format!("function f{} {} {} {:?};\n", index + 1, name, num_args, kind));
        }

        fn handle_suffix(&mut self, suffix: Suffix) {
            self.log.push_str(&format!(
                "suffix {} {:?} {:?};\n",
                suffix.name, suffix.kind, suffix.values
            ));
        }

        fn handle_variable_bounds(&mut self, index: usize, bounds: Bounds) {
            self.log.push_str(&format!("x{} in {:?};\n", index + 1, bounds));
        }

        fn handle_constraint_bounds(&mut self, index: usize, bounds: Bounds) {
            self.log.push_str(&format!("c{} in {:?};\n", index + 1, bounds));
        }

        fn handle_complementarity(&mut self, constraint: usize, condition: Complementarity) {
            self.log.push_str(&format!(
                "c{} complements x{} flags {};\n",
                constraint + 1,
                condition.variable + 1,
                condition.flags
            ));
        }

        fn handle_initial_value(&mut self, variable: usize, value: f64) {
            self.log.push_str(&format!("x{} := {};\n", variable + 1, value));
        }

        fn handle_initial_dual_value(&mut self, constraint: usize, value: f64) {
            self.log.push_str(&format!("c{} dual := {};\n", constraint + 1, value));
        }

        fn handle_column_sizes(&mut self, sizes: Vec<usize>) {
            self.log.push_str(&format!("columns {:?};\n", sizes));
        }

        fn handle_linear_constraint(&mut self, index: usize, terms: Vec<LinearTerm>) {
            self.log
                .push_str(&format!("c{} linear {};\n", index + 1, terms.len()));
        }

        fn handle_linear_objective(&mut self, index: usize, terms: Vec<LinearTerm>) {
            self.log
                .push_str(&format!("o{} linear {};\n", index + 1, terms.len()));
        }
    }

    fn header_with(num_objs: i32, num_vars: i32) -> Header {
        Header {
            num_objs,
            num_vars,
            ..Header::default()
        }
    }

    fn read_nl(header: &Header, body: &str) -> Result<()> {
        Reader::new(NullHandler).read_str(&(header.to_string() + body))
    }

    fn log_of(header: &Header, body: &str) -> String {
        let mut reader = Reader::new(TestHandler::default());
        reader.read_str(&(header.to_string() + body)).unwrap();
        reader.into_handler().log
    }

    fn error_of(header: &Header, body: &str) -> NlError {
        read_nl(header, body).unwrap_err()
    }

    #[test]
    fn test_no_newline_at_eof() {
        Reader::new(NullHandler)
            .read_str(
                "g\n 1 1 0\n 0 0\n 0 0\n 0 0 0\n 0 0 0 1\n 0 0 0 0 0\n 0 0\n 0 0\n 0 0 0 0 0\nk0",
            )
            .unwrap();

        let header = header_with(1, 1);
        assert_eq!(log_of(&header, "O0 0\nn1"), log_of(&header, "O0 0\nn1\n"));
    }

    #[test]
    fn test_empty_body() {
        read_nl(&Header::default(), "").unwrap();
    }

    #[test]
    fn test_obj_index() {
        let err = error_of(&Header::default(), "O-1 0\nn0");
        assert_eq!(err.to_string(), "(input):11:2: expected nonnegative integer");
        assert!(err.is_syntax());

        let header = header_with(10, 0);
        read_nl(&header, "O0 9\nn0").unwrap();
        let err = error_of(&header, "O10 0\nn0");
        assert_eq!(err.to_string(), "(input):11:2: objective index 10 is out of bounds");
        assert!(err.is_semantic());
    }

    #[test]
    fn test_obj_type() {
        let header = header_with(1, 0);
        read_nl(&header, "O0 0\nn0").unwrap();
        read_nl(&header, "O0 1\nn0").unwrap();
        read_nl(&header, "O0 10\nn0").unwrap();
        let err = error_of(&header, "O0 -1\nn0");
        assert_eq!(err.to_string(), "(input):11:4: expected nonnegative integer");
    }

    #[test]
    fn test_obj_expr() {
        let mut reader = Reader::new(TestHandler::default());
        let header = header_with(2, 1);
        let text = header.to_string();

        reader.read_str(&(text.clone() + "O1 0\nn0")).unwrap();
        assert!(reader.handler().obj_exprs[0].is_none());
        assert_eq!(reader.handler().log, "minimize o2: 0;\n");

        reader.read_str(&(text.clone() + "O0 1\nn4.2")).unwrap();
        assert_eq!(reader.handler().log, "maximize o1: 4.2;\n");

        reader.read_str(&(text.clone() + "O0 1\ns4.2")).unwrap();
        assert_eq!(reader.handler().log, "maximize o1: 4;\n");

        reader.read_str(&(text.clone() + "O0 1\nl4.2")).unwrap();
        assert_eq!(reader.handler().log, "maximize o1: 4;\n");

        reader.read_str(&(text + "O0 1\nv0")).unwrap();
        assert_eq!(reader.handler().log, "maximize o1: x1;\n");
        assert_eq!(reader.handler().obj_exprs[0], Some(Expr::Variable(0)));
    }

    #[test]
    fn test_reader_resets_position_between_reads() {
        let mut reader = Reader::new(NullHandler);
        let header = header_with(1, 0);
        let input = header.to_string() + "O0 0\nx";
        for _ in 0..2 {
            let err = reader.read_str(&input).unwrap_err();
            assert_eq!(err.to_string(), "(input):12:1: expected expression");
        }
    }

    #[test]
    fn test_invalid_segment() {
        let err = error_of(&Header::default(), "Z0\n");
        assert_eq!(err.to_string(), "(input):11:1: invalid segment type 'Z'");
    }

    #[test]
    fn test_operators() {
        let header = header_with(1, 2);
        let body = "O0 0\no2\t#*\no0\t#+\nv0\t#x\nn2\nv1\n";
        assert_eq!(log_of(&header, body), "minimize o1: (x1 + 2) * x2;\n");

        let body = "O0 0\no54\n3\nv0\nv1\nn1\n";
        assert_eq!(log_of(&header, body), "minimize o1: x1 + x2 + 1;\n");

        let body = "O0 0\no35\no22\nv0\nn0\no16\nv0\nv0\n";
        assert_eq!(log_of(&header, body), "minimize o1: if x1 < 0 then -x1 else x1;\n");

        let err = error_of(&header, "O0 0\no7\nv0\nv0\n");
        assert_eq!(err.to_string(), "(input):12:2: invalid opcode 7");
    }

    #[test]
    fn test_common_expression_reference() {
        let header = Header {
            num_objs: 1,
            num_vars: 2,
            num_common_exprs_in_objs: 1,
            ..Header::default()
        };
        let body = "V2 1 0\n1 3.5\no5\nv0\nn2\nO0 0\no2\nv2\nv2\n";
        assert_eq!(
            log_of(&header, body),
            "e1 @0: 3.5 * x2 | x1 ^ 2;\nminimize o1: e1 * e1;\n"
        );

        let err = error_of(&header, "V1 0 0\nn0\n");
        assert_eq!(
            err.to_string(),
            "(input):11:2: common expression index 1 is out of bounds"
        );
        let err = error_of(&header, "V3 0 0\nn0\n");
        assert_eq!(
            err.to_string(),
            "(input):11:2: common expression index 3 is out of bounds"
        );
    }

    #[test]
    fn test_constraints() {
        let header = Header {
            num_vars: 1,
            num_algebraic_cons: 1,
            num_logical_cons: 1,
            ..Header::default()
        };
        let body = "C0\no41\nv0\nL0\no24\nv0\nn1\n";
        assert_eq!(log_of(&header, body), "c1: sin(x1);\nl1: x1 = 1;\n");

        let err = error_of(&header, "C1\nn0\n");
        assert_eq!(err.to_string(), "(input):11:2: constraint index 1 is out of bounds");
        let err = error_of(&header, "L2\nn0\n");
        assert_eq!(
            err.to_string(),
            "(input):11:2: logical constraint index 2 is out of bounds"
        );
    }

    #[test]
    fn test_functions_and_calls() {
        let header = Header {
            num_objs: 1,
            num_vars: 1,
            num_funcs: 1,
            ..Header::default()
        };
        let body = "F0 1 -1 myfunc\nO0 0\nf0 2\nv0\nh3:abc\n";
        assert_eq!(
            log_of(&header, body),
            "function f1 myfunc -1 Symbolic;\nminimize o1: f1(x1, 'abc');\n"
        );

        let err = error_of(&header, "F0 2 1 g\n");
        assert_eq!(err.to_string(), "(input):11:4: invalid function type");
        let err = error_of(&header, "O0 0\nf1 0\n");
        assert_eq!(err.to_string(), "(input):12:2: function index 1 is out of bounds");
    }

    #[test]
    fn test_piecewise_linear() {
        let header = header_with(1, 1);
        let body = "O0 0\no64\n2\nn-1\nn0\nn1\nv0\n";
        assert_eq!(log_of(&header, body), "minimize o1: <<0; -1, 1>> x1;\n");

        let err = error_of(&header, "O0 0\no64\n1\nn1\nv0\n");
        assert_eq!(
            err.to_string(),
            "(input):13:1: too few slopes in piecewise-linear term"
        );
    }

    #[test]
    fn test_bounds() {
        let header = Header {
            num_vars: 2,
            num_algebraic_cons: 3,
            ..Header::default()
        };
        let body = "b\n0 1 2\n3\nr\n1 5\n4 0\n5 3 2\n";
        assert_eq!(
            log_of(&header, body),
            "x1 in Range { lower: 1.0, upper: 2.0 };\n\
             x2 in Free;\n\
             c1 in Upper(5.0);\n\
             c2 in Equal(0.0);\n\
             c3 complements x2 flags 3;\n"
        );

        let err = error_of(&header, "b\n5 1 1\n3\n");
        assert_eq!(err.to_string(), "(input):12:1: invalid bound type");
        let err = error_of(&header, "r\n3\n3\n5 0 3\n");
        assert_eq!(err.to_string(), "(input):14:5: variable index 3 is out of bounds");
    }

    #[test]
    fn test_linear_parts_and_initial_values() {
        let header = Header {
            num_objs: 1,
            num_vars: 3,
            num_algebraic_cons: 1,
            ..Header::default()
        };
        let body = "k2\n1\n2\nJ0 2\n0 1.5\n2 -1\nG0 1\n1 1\nx1\n2 0.5\nd1\n0 -2\n";
        assert_eq!(
            log_of(&header, body),
            "columns [1, 2];\n\
             c1 linear 2;\n\
             o1 linear 1;\n\
             x3 := 0.5;\n\
             c1 dual := -2;\n"
        );

        let err = error_of(&header, "k1\n0\n");
        assert_eq!(err.to_string(), "(input):11:2: expected 2");
        let err = error_of(&header, "J0 1\n3 1\n");
        assert_eq!(err.to_string(), "(input):12:1: variable index 3 is out of bounds");
        let err = error_of(&header, "x4\n");
        assert_eq!(err.to_string(), "(input):11:2: too many initial values");
    }

    #[test]
    fn test_suffixes() {
        let header = Header {
            num_vars: 2,
            num_algebraic_cons: 1,
            ..Header::default()
        };
        let body = "S0 2 priority\n0 3\n1 -1\nS5 1 dual_tol\n0 0.25\n";
        let log = log_of(&header, body);
        assert_eq!(
            log,
            "suffix priority Variable Int([(0, 3), (1, -1)]);\n\
             suffix dual_tol Constraint Real([(0, 0.25)]);\n"
        );

        let err = error_of(&header, "S1 1 s\n1 1\n");
        assert_eq!(err.to_string(), "(input):12:1: suffix index 1 is out of bounds");

        let mut reader = Reader::new(SuffixCollector::default());
        reader.read_str(&(header.to_string() + body)).unwrap();
        let suffixes = reader.into_handler().suffixes;
        assert_eq!(suffixes[1].kind, SuffixKind::Constraint);
        match &suffixes[1].values {
            SuffixValues::Real(values) => assert_relative_eq!(values[0].1, 0.25),
            other => panic!("unexpected values {:?}", other),
        }
    }

    #[derive(Default)]
    struct SuffixCollector {
        suffixes: Vec<Suffix>,
    }

    impl Handler for SuffixCollector {
        fn handle_suffix(&mut self, suffix: Suffix) {
            self.suffixes.push(suffix);
        }
    }

    #[test]
    fn test_max_depth() {
        let header = header_with(1, 1);
        let body = "O0 0\no16\no16\no16\nv0\n";
        let mut reader = Reader::new(NullHandler).with_max_depth(2);
        let err = reader.read_str(&(header.to_string() + body)).unwrap_err();
        assert_eq!(err.to_string(), "(input):15:1: expression nesting is too deep");

        let mut reader = Reader::new(NullHandler).with_max_depth(3);
        reader.read_str(&(header.to_string() + body)).unwrap();
    }

    #[test]
    fn test_callbacks_before_error_are_kept() {
        let header = header_with(2, 0);
        let mut reader = Reader::new(TestHandler::default());
        let result = reader.read_str(&(header.to_string() + "O0 0\nn1\nO5 0\nn2\n"));
        assert!(result.is_err());
        assert_eq!(reader.handler().log, "minimize o1: 1;\n");
    }

    #[test]
    fn test_blank_lines_between_segments() {
        let header = header_with(1, 0);
        let log = log_of(&header, "O0 0\nn0\n\n\nO0 1\nn1\n\n");
        assert_eq!(log, "minimize o1: 0;\nmaximize o1: 1;\n");

        let err = error_of(&header, "O0 0\nn0\n\n?\n");
        assert_eq!(err.to_string(), "(input):14:1: invalid segment type '?'");
    }

    // ============ Binary bodies ============

    /// Assembles a binary body in byte order `B`.
    struct BinaryBody<B> {
        bytes: Vec<u8>,
        order: std::marker::PhantomData<B>,
    }

    impl<B: ByteOrder> BinaryBody<B> {
        fn new(header: &Header) -> Self {
            Self {
                bytes: header.to_string().into_bytes(),
                order: std::marker::PhantomData,
            }
        }

        fn tag(mut self, tag: u8) -> Self {
            self.bytes.push(tag);
            self
        }

        fn int(mut self, value: i32) -> Self {
            self.bytes.write_i32::<B>(value).unwrap();
            self
        }

        fn short(mut self, value: i16) -> Self {
            self.bytes.write_i16::<B>(value).unwrap();
            self
        }

        fn real(mut self, value: f64) -> Self {
            self.bytes.write_f64::<B>(value).unwrap();
            self
        }

        fn string(mut self, value: &str) -> Self {
            self = self.int(value.len() as i32);
            self.bytes.extend_from_slice(value.as_bytes());
            self
        }
    }

    fn binary_log(bytes: &[u8]) -> Result<String> {
        let mut reader = Reader::new(TestHandler::default());
        reader.read(bytes, INPUT_SOURCE_NAME)?;
        Ok(reader.into_handler().log)
    }

    fn sample_body<B: ByteOrder>(format: Format) -> Vec<u8> {
        let header = Header {
            format,
            num_objs: 1,
            num_vars: 2,
            num_algebraic_cons: 1,
            num_funcs: 1,
            ..Header::default()
        };
        BinaryBody::<B>::new(&header)
            .tag(b'F')
            .int(0)
            .int(0)
            .int(2)
            .string("hypot")
            .tag(b'O')
            .int(0)
            .int(1)
            .tag(b'o')
            .int(0)
            .tag(b'n')
            .real(4.2)
            .tag(b'f')
            .int(0)
            .int(2)
            .tag(b'v')
            .int(1)
            .tag(b's')
            .short(7)
            .tag(b'C')
            .int(0)
            .tag(b'l')
            .int(-3)
            .tag(b'r')
            .tag(b'0')
            .real(-1.0)
            .real(1.0)
            .tag(b'b')
            .tag(b'2')
            .real(0.0)
            .tag(b'3')
            .bytes
    }

    const SAMPLE_LOG: &str = "function f1 hypot 2 Numeric;\n\
                              maximize o1: 4.2 + f1(x2, 7);\n\
                              c1: -3;\n\
                              c1 in Range { lower: -1.0, upper: 1.0 };\n\
                              x1 in Lower(0.0);\n\
                              x2 in Free;\n";

    #[test]
    fn test_binary_body() {
        let bytes = sample_body::<NativeEndian>(Format::Binary);
        assert_eq!(binary_log(&bytes).unwrap(), SAMPLE_LOG);
    }

    #[test]
    fn test_binary_swapped_body() {
        let bytes = sample_body::<SwappedEndian>(Format::BinarySwapped);
        assert_eq!(binary_log(&bytes).unwrap(), SAMPLE_LOG);
    }

    #[test]
    fn test_binary_matches_text() {
        let header = header_with(1, 2);
        let text = log_of(&header, "O0 1\no2\nv0\nn0.5\n");
        let binary_header = Header {
            format: Format::Binary,
            ..header
        };
        let bytes = BinaryBody::<NativeEndian>::new(&binary_header)
            .tag(b'O')
            .int(0)
            .int(1)
            .tag(b'o')
            .int(2)
            .tag(b'v')
            .int(0)
            .tag(b'n')
            .real(0.5)
            .bytes;
        assert_eq!(binary_log(&bytes).unwrap(), text);
    }

    #[test]
    fn test_binary_errors() {
        let header = Header {
            format: Format::Binary,
            num_objs: 1,
            ..Header::default()
        };
        let bytes = BinaryBody::<NativeEndian>::new(&header)
            .tag(b'O')
            .int(-1)
            .int(0)
            .bytes;
        assert_eq!(
            binary_log(&bytes).unwrap_err().to_string(),
            "(input):11:2: expected nonnegative integer"
        );

        // The second segment is the second record.
        let bytes = BinaryBody::<NativeEndian>::new(&header)
            .tag(b'O')
            .int(0)
            .int(0)
            .tag(b'n')
            .real(1.0)
            .tag(b'O')
            .int(1)
            .int(0)
            .bytes;
        let err = binary_log(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "(input):12:2: objective index 1 is out of bounds");

        let bytes = BinaryBody::<NativeEndian>::new(&header)
            .tag(b'O')
            .int(0)
            .int(0)
            .tag(b'n')
            .bytes;
        assert_eq!(
            binary_log(&bytes).unwrap_err().to_string(),
            "(input):11:11: expected double"
        );
    }

    fn catalogue_header(format: Format) -> Header {
        Header {
            format,
            num_vars: 3,
            num_algebraic_cons: 2,
            num_objs: 1,
            num_logical_cons: 1,
            num_funcs: 1,
            num_common_exprs_in_both: 1,
            ..Header::default()
        }
    }

    /// Every segment kind, the string literal, a variadic sum and a
    /// piecewise-linear term, in text.
    const CATALOGUE_TEXT: &str = "F0 1 2 fs\n\
                                  S0 2 priority\n0 3\n2 -1\n\
                                  S5 1 dual_tol\n1 0.25\n\
                                  V3 1 0\n2 1.5\no54\n3\nv0\nv1\nn1\n\
                                  L0\no24\nv3\nn2\n\
                                  C0\nf0 2\nv0\nh3:abc\n\
                                  C1\no64\n2\nn-1\nn0\nn1\nv2\n\
                                  O0 0\no2\nv3\ns7\n\
                                  r\n5 3 2\n1 4\n\
                                  b\n0 -1 1\n3\n4 2.5\n\
                                  k2\n1\n2\n\
                                  J0 2\n0 1\n1 -1\n\
                                  J1 1\n2 3\n\
                                  G0 1\n0 2\n\
                                  x2\n0 0.5\n2 -0.5\n\
                                  d1\n1 4\n";

    const CATALOGUE_LOG: &str = "function f1 fs 2 Symbolic;\n\
                                 suffix priority Variable Int([(0, 3), (2, -1)]);\n\
                                 suffix dual_tol Constraint Real([(1, 0.25)]);\n\
                                 e1 @0: 1.5 * x3 | x1 + x2 + 1;\n\
                                 l1: e1 = 2;\n\
                                 c1: f1(x1, 'abc');\n\
                                 c2: <<0; -1, 1>> x3;\n\
                                 minimize o1: e1 * 7;\n\
                                 c1 complements x2 flags 3;\n\
                                 c2 in Upper(4.0);\n\
                                 x1 in Range { lower: -1.0, upper: 1.0 };\n\
                                 x2 in Free;\n\
                                 x3 in Equal(2.5);\n\
                                 columns [1, 2];\n\
                                 c1 linear 2;\n\
                                 c2 linear 1;\n\
                                 o1 linear 1;\n\
                                 x1 := 0.5;\n\
                                 x3 := -0.5;\n\
                                 c2 dual := 4;\n";

    /// The binary form of `CATALOGUE_TEXT` in byte order `B`.
    fn catalogue_body<B: ByteOrder>(format: Format) -> Vec<u8> {
        BinaryBody::<B>::new(&catalogue_header(format))
            // F0 1 2 fs
            .tag(b'F')
            .int(0)
            .int(1)
            .int(2)
            .string("fs")
            // S0 2 priority
            .tag(b'S')
            .int(0)
            .int(2)
            .string("priority")
            .int(0)
            .int(3)
            .int(2)
            .int(-1)
            // S5 1 dual_tol
            .tag(b'S')
            .int(5)
            .int(1)
            .string("dual_tol")
            .int(1)
            .real(0.25)
            // V3 1 0
            .tag(b'V')
            .int(3)
            .int(1)
            .int(0)
            .int(2)
            .real(1.5)
            .tag(b'o')
            .int(54)
            .int(3)
            .tag(b'v')
            .int(0)
            .tag(b'v')
            .int(1)
            .tag(b'n')
            .real(1.0)
            // L0
            .tag(b'L')
            .int(0)
            .tag(b'o')
            .int(24)
            .tag(b'v')
            .int(3)
            .tag(b'n')
            .real(2.0)
            // C0
            .tag(b'C')
            .int(0)
            .tag(b'f')
            .int(0)
            .int(2)
            .tag(b'v')
            .int(0)
            .tag(b'h')
            .string("abc")
            // C1
            .tag(b'C')
            .int(1)
            .tag(b'o')
            .int(64)
            .int(2)
            .tag(b'n')
            .real(-1.0)
            .tag(b'n')
            .real(0.0)
            .tag(b'n')
            .real(1.0)
            .tag(b'v')
            .int(2)
            // O0 0
            .tag(b'O')
            .int(0)
            .int(0)
            .tag(b'o')
            .int(2)
            .tag(b'v')
            .int(3)
            .tag(b's')
            .short(7)
            // r
            .tag(b'r')
            .tag(b'5')
            .int(3)
            .int(2)
            .tag(b'1')
            .real(4.0)
            // b
            .tag(b'b')
            .tag(b'0')
            .real(-1.0)
            .real(1.0)
            .tag(b'3')
            .tag(b'4')
            .real(2.5)
            // k2
            .tag(b'k')
            .int(2)
            .int(1)
            .int(2)
            // J0 2, J1 1
            .tag(b'J')
            .int(0)
            .int(2)
            .int(0)
            .real(1.0)
            .int(1)
            .real(-1.0)
            .tag(b'J')
            .int(1)
            .int(1)
            .int(2)
            .real(3.0)
            // G0 1
            .tag(b'G')
            .int(0)
            .int(1)
            .int(0)
            .real(2.0)
            // x2
            .tag(b'x')
            .int(2)
            .int(0)
            .real(0.5)
            .int(2)
            .real(-0.5)
            // d1
            .tag(b'd')
            .int(1)
            .int(1)
            .real(4.0)
            .bytes
    }

    #[test]
    fn test_segment_catalogue_text() {
        let header = catalogue_header(Format::Text);
        assert_eq!(log_of(&header, CATALOGUE_TEXT), CATALOGUE_LOG);
    }

    #[test]
    fn test_segment_catalogue_binary() {
        let bytes = catalogue_body::<NativeEndian>(Format::Binary);
        assert_eq!(binary_log(&bytes).unwrap(), CATALOGUE_LOG);
    }

    #[test]
    fn test_segment_catalogue_binary_swapped() {
        let bytes = catalogue_body::<SwappedEndian>(Format::BinarySwapped);
        assert_eq!(binary_log(&bytes).unwrap(), CATALOGUE_LOG);
    }

    #[test]
    fn test_binary_suffix_name_is_length_prefixed() {
        let header = Header {
            format: Format::Binary,
            num_vars: 1,
            ..Header::default()
        };
        // The name may contain spaces; only its length prefix delimits it.
        let bytes = BinaryBody::<NativeEndian>::new(&header)
            .tag(b'S')
            .int(0)
            .int(1)
            .string("my suffix")
            .int(0)
            .int(9)
            .bytes;
        assert_eq!(
            binary_log(&bytes).unwrap(),
            "suffix my suffix Variable Int([(0, 9)]);\n"
        );

        let bytes = BinaryBody::<NativeEndian>::new(&header)
            .tag(b'S')
            .int(0)
            .int(1)
            .int(20)
            .bytes;
        assert_eq!(
            binary_log(&bytes).unwrap_err().to_string(),
            "(input):11:14: unexpected end of input"
        );
    }
}
