//! Callbacks through which the reader delivers the contents of an NL file.

use super::expr::Expr;
use super::header::Header;

/// A term `coef * x[variable]` of a linear expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTerm {
    pub variable: usize,
    pub coef: f64,
}

/// Bounds of a variable or an algebraic constraint body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// `lower <= body <= upper`
    Range { lower: f64, upper: f64 },
    /// `body <= upper`
    Upper(f64),
    /// `body >= lower`
    Lower(f64),
    /// No bounds
    Free,
    /// `body = value`
    Equal(f64),
}

/// Complementarity condition attached to an algebraic constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Complementarity {
    /// 0-based index of the complementary variable
    pub variable: usize,
    /// Bit 0: the constraint has a finite lower bound; bit 1: a finite upper bound
    pub flags: i32,
}

/// Kind of an imported function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Accepts numeric arguments only
    Numeric,
    /// May accept string arguments
    Symbolic,
}

/// Items a suffix attaches values to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixKind {
    Variable,
    Constraint,
    Objective,
    Problem,
}

impl SuffixKind {
    /// Decode the low two bits of a wire suffix kind.
    pub fn from_bits(kind: i32) -> Self {
        match kind & 3 {
            0 => Self::Variable,
            1 => Self::Constraint,
            2 => Self::Objective,
            _ => Self::Problem,
        }
    }
}

/// Values of a suffix, keyed by item index.
#[derive(Debug, Clone, PartialEq)]
pub enum SuffixValues {
    Int(Vec<(usize, i32)>),
    Real(Vec<(usize, f64)>),
}

impl SuffixValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(values) => values.len(),
            Self::Real(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named set of values attached to variables, constraints, objectives or
/// the problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Suffix {
    pub kind: SuffixKind,
    pub name: String,
    pub values: SuffixValues,
}

/// Receiver of the decoded contents of an NL file.
///
/// Every method has a no-op default, so an implementation only overrides the
/// parts of the problem it cares about. Methods are called in file order,
/// starting with [`handle_header`](Handler::handle_header).
pub trait Handler {
    fn handle_header(&mut self, _header: Header) {}

    /// Nonlinear part of objective `index`.
    fn handle_objective(&mut self, _index: usize, _maximize: bool, _expr: Expr) {}

    /// Nonlinear part of algebraic constraint `index`.
    fn handle_algebraic_constraint(&mut self, _index: usize, _expr: Expr) {}

    fn handle_logical_constraint(&mut self, _index: usize, _expr: Expr) {}

    /// Common subexpression `index`, referenced from trees as
    /// [`Expr::CommonExpr`]. `position` tells where the subexpression is used.
    fn handle_common_expression(
        &mut self,
        _index: usize,
        _position: usize,
        _linear: Vec<LinearTerm>,
        _expr: Expr,
    ) {
    }

    fn handle_function(&mut self, _index: usize, _name: &str, _num_args: i32, _kind: FunctionKind) {}

    fn handle_suffix(&mut self, _suffix: Suffix) {}

    fn handle_variable_bounds(&mut self, _index: usize, _bounds: Bounds) {}

    fn handle_constraint_bounds(&mut self, _index: usize, _bounds: Bounds) {}

    fn handle_complementarity(&mut self, _constraint: usize, _condition: Complementarity) {}

    fn handle_initial_value(&mut self, _variable: usize, _value: f64) {}

    fn handle_initial_dual_value(&mut self, _constraint: usize, _value: f64) {}

    /// Cumulative Jacobian column counts, one per variable except the last.
    fn handle_column_sizes(&mut self, _sizes: Vec<usize>) {}

    /// Linear part of algebraic constraint `index`.
    fn handle_linear_constraint(&mut self, _index: usize, _terms: Vec<LinearTerm>) {}

    /// Linear part of objective `index`.
    fn handle_linear_objective(&mut self, _index: usize, _terms: Vec<LinearTerm>) {}
}

/// Handler that ignores everything; reading with it only checks the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHandler;

impl Handler for NullHandler {}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn handle_header(&mut self, header: Header) {
        (**self).handle_header(header);
    }

    fn handle_objective(&mut self, index: usize, maximize: bool, expr: Expr) {
        (**self).handle_objective(index, maximize, expr);
    }

    fn handle_algebraic_constraint(&mut self, index: usize, expr: Expr) {
        (**self).handle_algebraic_constraint(index, expr);
    }

    fn handle_logical_constraint(&mut self, index: usize, expr: Expr) {
        (**self).handle_logical_constraint(index, expr);
    }

    fn handle_common_expression(
        &mut self,
        index: usize,
        position: usize,
        linear: Vec<LinearTerm>,
        expr: Expr,
    ) {
        (**self).handle_common_expression(index, position, linear, expr);
    }

    fn handle_function(&mut self, index: usize, name: &str, num_args: i32, kind: FunctionKind) {
        (**self).handle_function(index, name, num_args, kind);
    }

    fn handle_suffix(&mut self, suffix: Suffix) {
        (**self).handle_suffix(suffix);
    }

    fn handle_variable_bounds(&mut self, index: usize, bounds: Bounds) {
        (**self).handle_variable_bounds(index, bounds);
    }

    fn handle_constraint_bounds(&mut self, index: usize, bounds: Bounds) {
        (**self).handle_constraint_bounds(index, bounds);
    }

    fn handle_complementarity(&mut self, constraint: usize, condition: Complementarity) {
        (**self).handle_complementarity(constraint, condition);
    }

    fn handle_initial_value(&mut self, variable: usize, value: f64) {
        (**self).handle_initial_value(variable, value);
    }

    fn handle_initial_dual_value(&mut self, constraint: usize, value: f64) {
        (**self).handle_initial_dual_value(constraint, value);
    }

    fn handle_column_sizes(&mut self, sizes: Vec<usize>) {
        (**self).handle_column_sizes(sizes);
    }

    fn handle_linear_constraint(&mut self, index: usize, terms: Vec<LinearTerm>) {
        (**self).handle_linear_constraint(index, terms);
    }

    fn handle_linear_objective(&mut self, index: usize, terms: Vec<LinearTerm>) {
        (**self).handle_linear_objective(index, terms);
    }
}
