// Abstract syntax tree for number format strings

/// A parsed format string: one to three `;`-separated sections.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    pub sections: Vec<FormatSection>,
}

impl NumberFormat {
    /// True when sections are chosen by `[...]` conditions rather than sign.
    pub fn is_conditional(&self) -> bool {
        self.sections
            .iter()
            .any(|s| matches!(s.condition, Some(Condition::Compare(..))))
    }

    pub fn null_section(&self) -> Option<&FormatSection> {
        self.sections
            .iter()
            .find(|s| s.condition == Some(Condition::Null))
    }
}

/// One section of a format string
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatSection {
    pub condition: Option<Condition>,
    pub tokens: Vec<FormatToken>,
}

impl FormatSection {
    pub fn has_digits(&self) -> bool {
        self.tokens.iter().any(FormatToken::is_digit)
    }

    pub fn has_percent(&self) -> bool {
        self.tokens.contains(&FormatToken::Percent)
    }

    /// Commas right after the last digit placeholder each divide by 1000.
    pub fn scale_commas(&self) -> i32 {
        let last_digit = match self.tokens.iter().rposition(FormatToken::is_digit) {
            Some(i) => i,
            None => return 0,
        };
        self.tokens[last_digit + 1..]
            .iter()
            .take_while(|t| **t == FormatToken::Comma)
            .count() as i32
    }

    /// A comma between digit placeholders turns on thousands grouping.
    pub fn uses_grouping(&self) -> bool {
        let first = self.tokens.iter().position(FormatToken::is_digit);
        let last = self.tokens.iter().rposition(FormatToken::is_digit);
        match (first, last) {
            (Some(first), Some(last)) => self.tokens[first..last].contains(&FormatToken::Comma),
            _ => false,
        }
    }

    /// (minimum integer digits, minimum decimals, maximum decimals)
    pub fn digit_counts(&self) -> (usize, usize, usize) {
        let mut int_zeros = 0;
        let mut frac_zeros = 0;
        let mut frac_hashes = 0;
        let mut past_decimal = false;

        for token in &self.tokens {
            match (token, past_decimal) {
                (FormatToken::DecimalPoint, _) => past_decimal = true,
                (FormatToken::DigitZero, false) => int_zeros += 1,
                (FormatToken::DigitZero, true) => frac_zeros += 1,
                (FormatToken::DigitHash, true) => frac_hashes += 1,
                _ => {}
            }
        }
        (int_zeros, frac_zeros, frac_zeros + frac_hashes)
    }
}

/// Section selector written as `[>=100]` or `[=null]`
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Null,
    Compare(ConditionOp, f64),
}

impl Condition {
    pub fn matches(&self, value: f64) -> bool {
        match self {
            Condition::Null => false,
            Condition::Compare(op, bound) => match op {
                ConditionOp::Eq => value == *bound,
                ConditionOp::Ne => value != *bound,
                ConditionOp::Gt => value > *bound,
                ConditionOp::Ge => value >= *bound,
                ConditionOp::Lt => value < *bound,
                ConditionOp::Le => value <= *bound,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatToken {
    /// `0`: always shown
    DigitZero,
    /// `#`: shown when significant
    DigitHash,
    DecimalPoint,
    /// `,`: grouping or, when trailing, scaling
    Comma,
    /// `%`: value shown times 100
    Percent,
    Literal(String),
}

impl FormatToken {
    pub fn is_digit(&self) -> bool {
        matches!(self, FormatToken::DigitZero | FormatToken::DigitHash)
    }
}
