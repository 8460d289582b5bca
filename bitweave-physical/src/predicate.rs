//! This module defines [Predicate]s over codes,
//! the [Comparator]s they are built from
//! and the [CombineOp] that merges a scan result into a bitvector.

use std::{
    fmt,
    ops::{Bound, RangeBounds},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    columnar::code::{Code, Word},
    error::Error,
};

/// Comparison of a code against a constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// `code = constant`
    Equal,
    /// `code != constant`
    NotEqual,
    /// `code < constant`
    Less,
    /// `code <= constant`
    LessEqual,
    /// `code > constant`
    Greater,
    /// `code >= constant`
    GreaterEqual,
}

impl Comparator {
    /// Evaluate the comparison on a single code.
    pub fn evaluate(self, code: Code, constant: Code) -> bool {
        match self {
            Comparator::Equal => code == constant,
            Comparator::NotEqual => code != constant,
            Comparator::Less => code < constant,
            Comparator::LessEqual => code <= constant,
            Comparator::Greater => code > constant,
            Comparator::GreaterEqual => code >= constant,
        }
    }

    /// Symbol of this comparator.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::Less => "<",
            Comparator::LessEqual => "<=",
            Comparator::Greater => ">",
            Comparator::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Comparator::Equal),
            "!=" | "<>" => Ok(Comparator::NotEqual),
            "<" => Ok(Comparator::Less),
            "<=" => Ok(Comparator::LessEqual),
            ">" => Ok(Comparator::Greater),
            ">=" => Ok(Comparator::GreaterEqual),
            other => Err(Error::UnsupportedComparator(other.to_string())),
        }
    }
}

/// Policy for merging the result of a scan into an existing bitvector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineOp {
    /// Overwrite the bitvector
    #[default]
    Set,
    /// Intersect with the bitvector
    And,
    /// Unite with the bitvector
    Or,
}

impl CombineOp {
    /// Merge the freshly computed `result` into `current`.
    pub fn apply(self, current: Word, result: Word) -> Word {
        match self {
            CombineOp::Set => result,
            CombineOp::And => current & result,
            CombineOp::Or => current | result,
        }
    }
}

impl FromStr for CombineOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "set" => Ok(CombineOp::Set),
            "and" => Ok(CombineOp::And),
            "or" => Ok(CombineOp::Or),
            _ => Err(Error::UnknownCombineOp(s.to_string())),
        }
    }
}

/// Condition on the codes of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Compare each code against a constant
    Compare {
        /// How to compare
        comparator: Comparator,
        /// Constant from the code domain
        constant: Code,
    },
    /// Test whether each code lies within a range
    Range {
        /// Lower end of the range
        lower: Bound<Code>,
        /// Upper end of the range
        upper: Bound<Code>,
    },
}

impl Predicate {
    /// Create a predicate comparing codes against `constant`.
    pub fn compare(comparator: Comparator, constant: Code) -> Self {
        Self::Compare {
            comparator,
            constant,
        }
    }

    /// Create a predicate selecting codes within `range`.
    pub fn between<R: RangeBounds<Code>>(range: R) -> Self {
        Self::Range {
            lower: range.start_bound().cloned(),
            upper: range.end_bound().cloned(),
        }
    }

    /// Evaluate the predicate on a single code.
    pub fn evaluate(&self, code: Code) -> bool {
        match self {
            Predicate::Compare {
                comparator,
                constant,
            } => comparator.evaluate(code, *constant),
            Predicate::Range { lower, upper } => (*lower, *upper).contains(&code),
        }
    }

    /// Restrict this predicate to codes in `0..=max_code`.
    ///
    /// Constants outside of the domain are not truncated;
    /// instead the predicate is resolved to the outcome it has on every code of the domain.
    pub(crate) fn normalize(&self, max_code: Code) -> Normalized {
        match *self {
            Predicate::Compare {
                comparator,
                constant,
            } => normalize_compare(comparator, constant, max_code),
            Predicate::Range { lower, upper } => {
                let lower = match lower {
                    Bound::Included(value) => value,
                    Bound::Excluded(value) => match value.checked_add(1) {
                        Some(value) => value,
                        None => return Normalized::Constant(false),
                    },
                    Bound::Unbounded => 0,
                };
                let upper = match upper {
                    Bound::Included(value) => value.min(max_code),
                    Bound::Excluded(0) => return Normalized::Constant(false),
                    Bound::Excluded(value) => (value - 1).min(max_code),
                    Bound::Unbounded => max_code,
                };

                if lower > upper {
                    Normalized::Constant(false)
                } else if lower == 0 && upper == max_code {
                    Normalized::Constant(true)
                } else if lower == 0 {
                    Normalized::Scan(ScanCondition::Compare(Comparator::LessEqual, upper))
                } else if upper == max_code {
                    Normalized::Scan(ScanCondition::Compare(Comparator::GreaterEqual, lower))
                } else if lower == upper {
                    Normalized::Scan(ScanCondition::Compare(Comparator::Equal, lower))
                } else {
                    Normalized::Scan(ScanCondition::Between(lower, upper))
                }
            }
        }
    }
}

fn normalize_compare(comparator: Comparator, constant: Code, max_code: Code) -> Normalized {
    let outcome = match comparator {
        Comparator::Equal if constant > max_code => Some(false),
        Comparator::NotEqual if constant > max_code => Some(true),
        Comparator::Less if constant == 0 => Some(false),
        Comparator::Less if constant > max_code => Some(true),
        Comparator::LessEqual if constant >= max_code => Some(true),
        Comparator::Greater if constant >= max_code => Some(false),
        Comparator::GreaterEqual if constant == 0 => Some(true),
        Comparator::GreaterEqual if constant > max_code => Some(false),
        _ => None,
    };

    match outcome {
        Some(value) => Normalized::Constant(value),
        None => Normalized::Scan(ScanCondition::Compare(comparator, constant)),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                comparator,
                constant,
            } => write!(f, "code {comparator} {constant}"),
            Predicate::Range { lower, upper } => {
                match lower {
                    Bound::Included(value) => write!(f, "[{value}, ")?,
                    Bound::Excluded(value) => write!(f, "({value}, ")?,
                    Bound::Unbounded => write!(f, "(-inf, ")?,
                }
                match upper {
                    Bound::Included(value) => write!(f, "{value}]"),
                    Bound::Excluded(value) => write!(f, "{value})"),
                    Bound::Unbounded => write!(f, "inf)"),
                }
            }
        }
    }
}

/// A [Predicate] resolved against the domain of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Normalized {
    /// The predicate has the same outcome for every code
    Constant(bool),
    /// The codes need to be scanned
    Scan(ScanCondition),
}

/// Condition handed to the scanners
///
/// All constants lie within the domain of the scanned column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanCondition {
    /// Single comparison
    Compare(Comparator, Code),
    /// `lower <= code <= upper` with `lower < upper`
    Between(Code, Code),
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;

    use super::{CombineOp, Comparator, Normalized, Predicate, ScanCondition};

    const COMPARATORS: [Comparator; 6] = [
        Comparator::Equal,
        Comparator::NotEqual,
        Comparator::Less,
        Comparator::LessEqual,
        Comparator::Greater,
        Comparator::GreaterEqual,
    ];

    #[test]
    fn comparator_symbols() {
        for comparator in COMPARATORS {
            assert_eq!(comparator.symbol().parse::<Comparator>().unwrap(), comparator);
        }

        assert_eq!("<>".parse::<Comparator>().unwrap(), Comparator::NotEqual);
        assert!("=>".parse::<Comparator>().is_err());
    }

    #[test]
    fn combine_ops() {
        assert_eq!(CombineOp::Set.apply(0b1100, 0b1010), 0b1010);
        assert_eq!(CombineOp::And.apply(0b1100, 0b1010), 0b1000);
        assert_eq!(CombineOp::Or.apply(0b1100, 0b1010), 0b1110);
        assert_eq!("AND".parse::<CombineOp>().unwrap(), CombineOp::And);
    }

    #[test]
    fn normalize_out_of_domain() {
        let max = 15;

        let ge = Predicate::compare(Comparator::GreaterEqual, 56);
        assert_eq!(ge.normalize(max), Normalized::Constant(false));

        let lt = Predicate::compare(Comparator::Less, 56);
        assert_eq!(lt.normalize(max), Normalized::Constant(true));

        let eq = Predicate::compare(Comparator::Equal, 15);
        assert_eq!(
            eq.normalize(max),
            Normalized::Scan(ScanCondition::Compare(Comparator::Equal, 15))
        );

        let range = Predicate::between(3..8);
        assert_eq!(
            range.normalize(max),
            Normalized::Scan(ScanCondition::Between(3, 7))
        );

        let empty = Predicate::between(8..8);
        assert_eq!(empty.normalize(max), Normalized::Constant(false));

        let full = Predicate::between(0..100);
        assert_eq!(full.normalize(max), Normalized::Constant(true));
    }

    /// Evaluate a normalized predicate the slow way.
    fn evaluate_normalized(normalized: Normalized, code: u64) -> bool {
        match normalized {
            Normalized::Constant(value) => value,
            Normalized::Scan(ScanCondition::Compare(comparator, constant)) => {
                comparator.evaluate(code, constant)
            }
            Normalized::Scan(ScanCondition::Between(lower, upper)) => {
                lower <= code && code <= upper
            }
        }
    }

    #[quickcheck]
    fn normalize_preserves_semantics(code: u8, constant: u8, lower: u8, upper: u8) -> bool {
        let max = 0x3f;
        let code = u64::from(code & 0x3f);

        let compare_ok = COMPARATORS.iter().all(|&comparator| {
            let predicate = Predicate::compare(comparator, u64::from(constant));
            predicate.evaluate(code) == evaluate_normalized(predicate.normalize(max), code)
        });

        let range = Predicate::between(u64::from(lower)..=u64::from(upper));
        let range_ok = range.evaluate(code) == evaluate_normalized(range.normalize(max), code);

        compare_ok && range_ok
    }
}
