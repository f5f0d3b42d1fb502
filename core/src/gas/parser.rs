use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1},
    combinator::{map, opt, value},
    sequence::{pair, preceded},
    IResult,
};

use crate::error::PlanError;
use crate::gas::{GasMix, O2_IN_AIR};

/// Parse a gas specification into a mix.
///
/// Accepted forms: `air`, `eanXX`, a bare O2 percentage (`32`, `32%`) or an
/// O2/He pair (`21/35`). Percentages are read in tenths, so `35.5` means
/// 35.5%, i.e. 355 permille. Leading and trailing whitespace is ignored;
/// anything else left over rejects the input.
pub fn validate_gas(input: &str) -> Result<GasMix, PlanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PlanError::InvalidGas {
            input: input.to_string(),
            message: "empty gas specification".to_string(),
        });
    }

    match gas_spec(trimmed) {
        Ok((remaining, mix)) => {
            if !remaining.trim().is_empty() {
                return Err(PlanError::InvalidGas {
                    input: input.to_string(),
                    message: format!("unexpected characters: '{}'", remaining.trim()),
                });
            }
            if mix.o2 < 1 || mix.o2 > 1000 || mix.he < 0 || mix.o2 + mix.he > 1000 {
                return Err(PlanError::InvalidGas {
                    input: input.to_string(),
                    message: format!("fractions out of range: {}/{} permille", mix.o2, mix.he),
                });
            }
            Ok(mix)
        }
        Err(_) => Err(PlanError::InvalidGas {
            input: input.to_string(),
            message: "not a gas specification".to_string(),
        }),
    }
}

/// Parse a setpoint ("1.4") into mbar (1400).
pub fn validate_po2(input: &str) -> Result<i32, PlanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PlanError::InvalidPo2 {
            input: input.to_string(),
            message: "empty pO2 value".to_string(),
        });
    }

    match tenths(trimmed) {
        Ok((remaining, v)) => {
            if !remaining.trim().is_empty() {
                return Err(PlanError::InvalidPo2 {
                    input: input.to_string(),
                    message: format!("unexpected characters: '{}'", remaining.trim()),
                });
            }
            Ok(v * 100)
        }
        Err(_) => Err(PlanError::InvalidPo2 {
            input: input.to_string(),
            message: "not a number".to_string(),
        }),
    }
}

fn gas_spec(input: &str) -> IResult<&str, GasMix> {
    alt((air, ean, fractions))(input)
}

fn air(input: &str) -> IResult<&str, GasMix> {
    value(GasMix::new(O2_IN_AIR, 0), tag_no_case("air"))(input)
}

fn ean(input: &str) -> IResult<&str, GasMix> {
    map(preceded(tag_no_case("ean"), permille), |o2| {
        GasMix::new(o2, 0)
    })(input)
}

fn fractions(input: &str) -> IResult<&str, GasMix> {
    map(
        pair(permille, opt(preceded(char('/'), permille))),
        |(o2, he)| GasMix::new(o2, he.unwrap_or(0)),
    )(input)
}

/// A tenths value with an optional trailing percent sign.
fn permille(input: &str) -> IResult<&str, i32> {
    let (input, v) = tenths(input)?;
    let (input, _) = opt(char('%'))(input)?;
    Ok((input, v))
}

/// Scan a decimal number scaled by ten ("10.2" -> 102, "9" -> 90). Only the
/// first fractional digit is kept; a bare trailing dot is not consumed.
fn tenths(input: &str) -> IResult<&str, i32> {
    let (input, whole) = digit1(input)?;
    let (input, frac) = opt(preceded(char('.'), digit1))(input)?;

    let whole: i64 = match whole.parse() {
        Ok(v) => v,
        Err(_) => {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Digit,
            )))
        }
    };
    let mut v = whole * 10;
    if let Some(frac) = frac {
        v += i64::from(frac.as_bytes()[0] - b'0');
    }
    if v > i64::from(i32::MAX) {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    Ok((input, v as i32))
}
