//! Opcode catalogue of the NL expression notation.
//!
//! Every `o<code>` node selects one entry of this table, which fixes how many
//! children follow it on the wire.

use std::fmt;

/// Operators that can appear after an `o` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Opcode {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Mod = 4,
    Pow = 5,
    Less = 6,
    Min = 11,
    Max = 12,
    Floor = 13,
    Ceil = 14,
    Abs = 15,
    Neg = 16,
    Or = 20,
    And = 21,
    Lt = 22,
    Le = 23,
    Eq = 24,
    Ge = 28,
    Gt = 29,
    Ne = 30,
    Not = 34,
    If = 35,
    Tanh = 37,
    Tan = 38,
    Sqrt = 39,
    Sinh = 40,
    Sin = 41,
    Log10 = 42,
    Log = 43,
    Exp = 44,
    Cosh = 45,
    Cos = 46,
    Atanh = 47,
    Atan2 = 48,
    Atan = 49,
    Asinh = 50,
    Asin = 51,
    Acosh = 52,
    Acos = 53,
    Sum = 54,
    IntDiv = 55,
    Precision = 56,
    Round = 57,
    Trunc = 58,
    Count = 59,
    NumberOf = 60,
    NumberOfSym = 61,
    AtLeast = 62,
    AtMost = 63,
    PiecewiseLinear = 64,
    IfSym = 65,
    Exactly = 66,
    NotAtLeast = 67,
    NotAtMost = 68,
    NotExactly = 69,
    AndList = 70,
    OrList = 71,
    Implication = 72,
    Iff = 73,
    AllDiff = 74,
    SomeSame = 75,
    PowConstExp = 76,
    Pow2 = 77,
    PowConstBase = 78,
}

/// How the children of an operator are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many child expressions follow.
    Fixed(usize),
    /// A count follows, then that many child expressions.
    Variadic,
    /// A slope count, alternating slopes and breakpoints, then a reference.
    PiecewiseLinear,
}

/// How an operator is written when an expression is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `a op b`
    Infix,
    /// `op a`
    Prefix,
    /// `a op`
    Postfix,
    /// `op(a, b, ...)`
    Function,
    /// `a op b op c ...`
    Chain,
    /// `if a then b else c` and `a ==> b else c`
    Conditional,
}

impl Opcode {
    /// Look up an opcode by its wire code.
    pub fn from_code(code: i32) -> Option<Self> {
        use Opcode::*;
        let opcode = match code {
            0 => Add,
            1 => Sub,
            2 => Mul,
            3 => Div,
            4 => Mod,
            5 => Pow,
            6 => Less,
            11 => Min,
            12 => Max,
            13 => Floor,
            14 => Ceil,
            15 => Abs,
            16 => Neg,
            20 => Or,
            21 => And,
            22 => Lt,
            23 => Le,
            24 => Eq,
            28 => Ge,
            29 => Gt,
            30 => Ne,
            34 => Not,
            35 => If,
            37 => Tanh,
            38 => Tan,
            39 => Sqrt,
            40 => Sinh,
            41 => Sin,
            42 => Log10,
            43 => Log,
            44 => Exp,
            45 => Cosh,
            46 => Cos,
            47 => Atanh,
            48 => Atan2,
            49 => Atan,
            50 => Asinh,
            51 => Asin,
            52 => Acosh,
            53 => Acos,
            54 => Sum,
            55 => IntDiv,
            56 => Precision,
            57 => Round,
            58 => Trunc,
            59 => Count,
            60 => NumberOf,
            61 => NumberOfSym,
            62 => AtLeast,
            63 => AtMost,
            64 => PiecewiseLinear,
            65 => IfSym,
            66 => Exactly,
            67 => NotAtLeast,
            68 => NotAtMost,
            69 => NotExactly,
            70 => AndList,
            71 => OrList,
            72 => Implication,
            73 => Iff,
            74 => AllDiff,
            75 => SomeSame,
            76 => PowConstExp,
            77 => Pow2,
            78 => PowConstBase,
            _ => return None,
        };
        Some(opcode)
    }

    /// The wire code of this opcode.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn arity(self) -> Arity {
        use Opcode::*;
        match self {
            Floor | Ceil | Abs | Neg | Not | Tanh | Tan | Sqrt | Sinh | Sin | Log10 | Log
            | Exp | Cosh | Cos | Atanh | Atan | Asinh | Asin | Acosh | Acos | Pow2 => {
                Arity::Fixed(1)
            }
            If | IfSym | Implication => Arity::Fixed(3),
            Min | Max | Sum | Count | NumberOf | NumberOfSym | AndList | OrList | AllDiff
            | SomeSame => Arity::Variadic,
            PiecewiseLinear => Arity::PiecewiseLinear,
            _ => Arity::Fixed(2),
        }
    }

    pub fn notation(self) -> Notation {
        use Opcode::*;
        match self {
            Add | Sub | Mul | Div | Mod | Pow | Less | Or | And | Lt | Le | Eq | Ge | Gt
            | Ne | IntDiv | AtLeast | AtMost | Exactly | NotAtLeast | NotAtMost | NotExactly
            | Iff | PowConstExp | PowConstBase => Notation::Infix,
            Neg | Not => Notation::Prefix,
            Pow2 => Notation::Postfix,
            Sum | AndList | OrList => Notation::Chain,
            If | IfSym | Implication => Notation::Conditional,
            _ => Notation::Function,
        }
    }

    /// Symbol or function name used when displaying the operator.
    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Add | Sum => "+",
            Sub | Neg => "-",
            Mul => "*",
            Div => "/",
            Mod => "mod",
            Pow | PowConstExp | PowConstBase => "^",
            Pow2 => "^2",
            Less => "less",
            Min => "min",
            Max => "max",
            Floor => "floor",
            Ceil => "ceil",
            Abs => "abs",
            Or | OrList => "||",
            And | AndList => "&&",
            Lt => "<",
            Le => "<=",
            Eq => "=",
            Ge => ">=",
            Gt => ">",
            Ne => "!=",
            Not => "!",
            If | IfSym => "if",
            Tanh => "tanh",
            Tan => "tan",
            Sqrt => "sqrt",
            Sinh => "sinh",
            Sin => "sin",
            Log10 => "log10",
            Log => "log",
            Exp => "exp",
            Cosh => "cosh",
            Cos => "cos",
            Atanh => "atanh",
            Atan2 => "atan2",
            Atan => "atan",
            Asinh => "asinh",
            Asin => "asin",
            Acosh => "acosh",
            Acos => "acos",
            IntDiv => "div",
            Precision => "precision",
            Round => "round",
            Trunc => "trunc",
            Count => "count",
            NumberOf => "numberof",
            NumberOfSym => "numberof",
            AtLeast => "atleast",
            AtMost => "atmost",
            PiecewiseLinear => "<<>>",
            Exactly => "exactly",
            NotAtLeast => "!atleast",
            NotAtMost => "!atmost",
            NotExactly => "!exactly",
            Implication => "==>",
            Iff => "<==>",
            AllDiff => "alldiff",
            SomeSame => "!alldiff",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
