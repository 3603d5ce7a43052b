//! Expression trees decoded from the nonlinear parts of an NL file.

use std::fmt;

use super::opcode::{Notation, Opcode};

/// A node of a nonlinear expression.
///
/// Trees are strictly owned: an operator owns its children in wire order.
/// Common subexpressions are not copied into the trees that use them;
/// [`Expr::CommonExpr`] refers to one by its index in the list delivered
/// through [`Handler::handle_common_expression`](super::Handler::handle_common_expression).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal (`n`, `s` or `l` on the wire)
    Number(f64),
    /// Reference to a variable by 0-based index
    Variable(usize),
    /// Reference to a common subexpression by 0-based index
    CommonExpr(usize),
    /// String literal (`h` on the wire), used as a symbolic argument
    String(String),
    /// Operator applied to its children
    Op { opcode: Opcode, args: Vec<Expr> },
    /// Piecewise-linear term `<<breakpoints; slopes>> argument`
    PiecewiseLinear {
        slopes: Vec<f64>,
        breakpoints: Vec<f64>,
        argument: Box<Expr>,
    },
    /// Call of an imported function by 0-based index
    Call { function: usize, args: Vec<Expr> },
}

impl Expr {
    pub fn op(opcode: Opcode, args: Vec<Expr>) -> Self {
        Self::Op { opcode, args }
    }

    /// Returns the value of a numeric literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Self::Op { args, .. } | Self::Call { args, .. } => {
                1 + args.iter().map(Expr::size).sum::<usize>()
            }
            Self::PiecewiseLinear { argument, .. } => 1 + argument.size(),
            _ => 1,
        }
    }

    // Operands that must be parenthesized when nested inside another operator.
    fn is_compound(&self) -> bool {
        match self {
            Self::Op { opcode, .. } => !matches!(opcode.notation(), Notation::Function),
            Self::Number(value) => *value < 0.0,
            _ => false,
        }
    }
}

/// Displays an operand, parenthesized if needed.
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_compound() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, args: &[Expr], separator: &str) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Variable(index) => write!(f, "x{}", index + 1),
            Self::CommonExpr(index) => write!(f, "e{}", index + 1),
            Self::String(value) => write!(f, "'{}'", value),
            Self::Call { function, args } => {
                write!(f, "f{}(", function + 1)?;
                write_list(f, args, ", ")?;
                f.write_str(")")
            }
            Self::PiecewiseLinear {
                slopes,
                breakpoints,
                argument,
            } => {
                f.write_str("<<")?;
                for (i, breakpoint) in breakpoints.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", breakpoint)?;
                }
                f.write_str("; ")?;
                for (i, slope) in slopes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", slope)?;
                }
                write!(f, ">> {}", argument)
            }
            Self::Op { opcode, args } => match (opcode.notation(), args.as_slice()) {
                (Notation::Infix, [lhs, rhs]) => {
                    write!(f, "{} {} {}", Operand(lhs), opcode, Operand(rhs))
                }
                (Notation::Prefix, [arg]) => write!(f, "{}{}", opcode, Operand(arg)),
                (Notation::Postfix, [arg]) => write!(f, "{}{}", Operand(arg), opcode),
                (Notation::Conditional, [condition, then, otherwise]) => {
                    if *opcode == Opcode::Implication {
                        write!(
                            f,
                            "{} ==> {} else {}",
                            Operand(condition),
                            Operand(then),
                            Operand(otherwise)
                        )
                    } else {
                        write!(f, "if {} then {} else {}", condition, then, otherwise)
                    }
                }
                (Notation::Chain, [_, ..]) => {
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {} ", opcode)?;
                        }
                        write!(f, "{}", Operand(arg))?;
                    }
                    Ok(())
                }
                _ => {
                    let name = match opcode {
                        Opcode::Sum => "sum",
                        Opcode::AndList => "forall",
                        Opcode::OrList => "exists",
                        _ => opcode.name(),
                    };
                    write!(f, "{}(", name)?;
                    write_list(f, args, ", ")?;
                    f.write_str(")")
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(index: usize) -> Expr {
        Expr::Variable(index)
    }

    #[test]
    fn test_display_leaves() {
        assert_eq!(Expr::Number(0.0).to_string(), "0");
        assert_eq!(Expr::Number(4.2).to_string(), "4.2");
        assert_eq!(Expr::Number(4.0).to_string(), "4");
        assert_eq!(x(0).to_string(), "x1");
        assert_eq!(Expr::CommonExpr(2).to_string(), "e3");
        assert_eq!(Expr::String("abc".to_string()).to_string(), "'abc'");
    }

    #[test]
    fn test_display_operators() {
        let sum = Expr::op(Opcode::Add, vec![x(0), Expr::Number(2.0)]);
        assert_eq!(sum.to_string(), "x1 + 2");

        let product = Expr::op(Opcode::Mul, vec![sum.clone(), x(1)]);
        assert_eq!(product.to_string(), "(x1 + 2) * x2");

        let negated = Expr::op(Opcode::Neg, vec![product]);
        assert_eq!(negated.to_string(), "-((x1 + 2) * x2)");

        let sine = Expr::op(Opcode::Sin, vec![sum]);
        assert_eq!(sine.to_string(), "sin(x1 + 2)");

        let square = Expr::op(Opcode::Pow2, vec![x(0)]);
        assert_eq!(square.to_string(), "x1^2");

        let sum_list = Expr::op(Opcode::Sum, vec![x(0), x(1), Expr::Number(-1.0)]);
        assert_eq!(sum_list.to_string(), "x1 + x2 + (-1)");

        let max = Expr::op(Opcode::Max, vec![x(0), x(1)]);
        assert_eq!(max.to_string(), "max(x1, x2)");
    }

    #[test]
    fn test_display_conditional() {
        let condition = Expr::op(Opcode::Lt, vec![x(0), Expr::Number(1.0)]);
        let expr = Expr::op(Opcode::If, vec![condition, x(1), Expr::Number(0.0)]);
        assert_eq!(expr.to_string(), "if x1 < 1 then x2 else 0");
    }

    #[test]
    fn test_display_piecewise_linear() {
        let expr = Expr::PiecewiseLinear {
            slopes: vec![-1.0, 1.0],
            breakpoints: vec![0.0],
            argument: Box::new(x(0)),
        };
        assert_eq!(expr.to_string(), "<<0; -1, 1>> x1");
    }

    #[test]
    fn test_size() {
        let expr = Expr::op(
            Opcode::Add,
            vec![x(0), Expr::op(Opcode::Neg, vec![Expr::Number(1.0)])],
        );
        assert_eq!(expr.size(), 4);
    }
}
