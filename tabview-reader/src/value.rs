//! Conversion of single Arrow cells into Rust values.
//!
//! Conversions are lenient about the physical array type and strict about
//! the value: any integer array can feed an `i32` as long as the value fits,
//! and text arrays are parsed, but a null only decodes into an `Option`.
//! This is what lets a reader keep working when the store's declared type
//! and the stored content disagree, while still failing the individual row
//! whose content does not convert.

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};
use arrow::util::display::array_value_to_string;
use tabview_types::TypeDescriptor;
use thiserror::Error;

/// Why a cell could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unexpected null value")]
    Null,
    #[error("unsupported source type {0}")]
    Unsupported(DataType),
    #[error("cannot parse {text:?}: {cause}")]
    Parse { text: String, cause: String },
    #[error("value {value} is out of range")]
    OutOfRange { value: String },
    #[error("{0}")]
    Format(String),
}

/// A Rust type that can be decoded from one Arrow cell.
pub trait ColumnValue: Sized + Send + 'static {
    /// Descriptor of `Self`, including type arguments for generic
    /// implementations such as `Option<T>`.
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>()
    }

    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError>;
}

#[inline]
fn is_null_cell(array: &dyn Array, row: usize) -> bool {
    array.data_type() == &DataType::Null || array.is_null(row)
}

fn text_cell(array: &dyn Array, row: usize) -> Option<&str> {
    match array.data_type() {
        DataType::Utf8 => Some(array.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Some(array.as_string::<i64>().value(row)),
        DataType::Utf8View => Some(array.as_string_view().value(row)),
        _ => None,
    }
}

fn parse_text<T>(text: &str) -> Result<T, ValueError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.trim().parse::<T>().map_err(|e| ValueError::Parse {
        text: text.to_string(),
        cause: e.to_string(),
    })
}

/// Widen any integer cell (or integer text) to `i128`.
fn integer_cell(array: &dyn Array, row: usize) -> Result<i128, ValueError> {
    if is_null_cell(array, row) {
        return Err(ValueError::Null);
    }
    let wide = match array.data_type() {
        DataType::Int8 => array.as_primitive::<Int8Type>().value(row) as i128,
        DataType::Int16 => array.as_primitive::<Int16Type>().value(row) as i128,
        DataType::Int32 => array.as_primitive::<Int32Type>().value(row) as i128,
        DataType::Int64 => array.as_primitive::<Int64Type>().value(row) as i128,
        DataType::UInt8 => array.as_primitive::<UInt8Type>().value(row) as i128,
        DataType::UInt16 => array.as_primitive::<UInt16Type>().value(row) as i128,
        DataType::UInt32 => array.as_primitive::<UInt32Type>().value(row) as i128,
        DataType::UInt64 => array.as_primitive::<UInt64Type>().value(row) as i128,
        other => match text_cell(array, row) {
            Some(text) => parse_text::<i128>(text)?,
            None => return Err(ValueError::Unsupported(other.clone())),
        },
    };
    Ok(wide)
}

/// Integers convert to floats only when no precision is lost.
fn exact_f64(value: i128) -> Result<f64, ValueError> {
    let float = value as f64;
    if float as i128 != value {
        return Err(ValueError::OutOfRange {
            value: value.to_string(),
        });
    }
    Ok(float)
}

fn float_cell(array: &dyn Array, row: usize) -> Result<f64, ValueError> {
    if is_null_cell(array, row) {
        return Err(ValueError::Null);
    }
    match array.data_type() {
        DataType::Float32 => Ok(array.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Ok(array.as_primitive::<Float64Type>().value(row)),
        dt if dt.is_integer() => integer_cell(array, row).and_then(exact_f64),
        other => match text_cell(array, row) {
            Some(text) => parse_text::<f64>(text),
            None => Err(ValueError::Unsupported(other.clone())),
        },
    }
}

macro_rules! integer_column_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ColumnValue for $ty {
                fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
                    let wide = integer_cell(array, row)?;
                    <$ty>::try_from(wide).map_err(|_| ValueError::OutOfRange {
                        value: wide.to_string(),
                    })
                }
            }
        )+
    };
}

integer_column_value!(i16, i32, i64, u16, u32, u64);

impl ColumnValue for f64 {
    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
        float_cell(array, row)
    }
}

impl ColumnValue for f32 {
    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
        if !is_null_cell(array, row) && array.data_type() == &DataType::Float32 {
            return Ok(array.as_primitive::<Float32Type>().value(row));
        }
        let wide = float_cell(array, row)?;
        if wide.is_finite() && wide.abs() > f32::MAX as f64 {
            return Err(ValueError::OutOfRange {
                value: wide.to_string(),
            });
        }
        Ok(wide as f32)
    }
}

impl ColumnValue for bool {
    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
        if is_null_cell(array, row) {
            return Err(ValueError::Null);
        }
        match array.data_type() {
            DataType::Boolean => Ok(array.as_boolean().value(row)),
            other => match text_cell(array, row) {
                Some(text) => parse_text::<bool>(text),
                None => Err(ValueError::Unsupported(other.clone())),
            },
        }
    }
}

impl ColumnValue for String {
    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
        if is_null_cell(array, row) {
            return Err(ValueError::Null);
        }
        match text_cell(array, row) {
            Some(text) => Ok(text.to_string()),
            None => {
                array_value_to_string(array, row).map_err(|e| ValueError::Format(e.to_string()))
            }
        }
    }
}

impl ColumnValue for Vec<u8> {
    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
        if is_null_cell(array, row) {
            return Err(ValueError::Null);
        }
        match array.data_type() {
            DataType::Binary => Ok(array.as_binary::<i32>().value(row).to_vec()),
            DataType::LargeBinary => Ok(array.as_binary::<i64>().value(row).to_vec()),
            DataType::BinaryView => Ok(array.as_binary_view().value(row).to_vec()),
            other => match text_cell(array, row) {
                Some(text) => Ok(text.as_bytes().to_vec()),
                None => Err(ValueError::Unsupported(other.clone())),
            },
        }
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic::<Option<T>>([T::descriptor()])
    }

    fn from_array(array: &dyn Array, row: usize) -> Result<Self, ValueError> {
        if is_null_cell(array, row) {
            return Ok(None);
        }
        T::from_array(array, row).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BooleanArray, Float32Array, Float64Array, Int64Array, NullArray, StringArray, UInt8Array,
    };

    #[test]
    fn integers_widen_and_narrow_with_range_checks() {
        let small = UInt8Array::from(vec![7u8]);
        assert_eq!(i64::from_array(&small, 0), Ok(7));

        let big = Int64Array::from(vec![i64::from(i32::MAX) + 1]);
        assert_eq!(
            i32::from_array(&big, 0),
            Err(ValueError::OutOfRange {
                value: "2147483648".into()
            })
        );
        assert!(u32::from_array(&Int64Array::from(vec![-1]), 0).is_err());
    }

    #[test]
    fn text_is_parsed_for_numeric_targets() {
        let text = StringArray::from(vec!["20", "not-a-number"]);
        assert_eq!(i32::from_array(&text, 0), Ok(20));
        let err = i32::from_array(&text, 1).unwrap_err();
        assert_eq!(
            err,
            ValueError::Parse {
                text: "not-a-number".into(),
                cause: "invalid digit found in string".into()
            }
        );
    }

    #[test]
    fn nulls_only_decode_into_options() {
        let ints = Int64Array::from(vec![None, Some(3)]);
        assert_eq!(i64::from_array(&ints, 0), Err(ValueError::Null));
        assert_eq!(Option::<i64>::from_array(&ints, 0), Ok(None));
        assert_eq!(Option::<i64>::from_array(&ints, 1), Ok(Some(3)));

        let nulls = NullArray::new(1);
        assert_eq!(Option::<String>::from_array(&nulls, 0), Ok(None));
    }

    #[test]
    fn strings_fall_back_to_display() {
        let ints = Int64Array::from(vec![42]);
        assert_eq!(String::from_array(&ints, 0), Ok("42".to_string()));
        let flags = BooleanArray::from(vec![true]);
        assert_eq!(String::from_array(&flags, 0), Ok("true".to_string()));
    }

    #[test]
    fn floats_and_bools() {
        let floats = Float32Array::from(vec![1.5f32]);
        assert_eq!(f32::from_array(&floats, 0), Ok(1.5));
        assert_eq!(f64::from_array(&floats, 0), Ok(1.5));
        assert_eq!(bool::from_array(&StringArray::from(vec!["true"]), 0), Ok(true));
        assert!(matches!(
            bool::from_array(&Int64Array::from(vec![1]), 0),
            Err(ValueError::Unsupported(DataType::Int64))
        ));
    }

    #[test]
    fn float_conversions_reject_values_they_cannot_hold() {
        let wide = Float64Array::from(vec![1e300, f64::INFINITY, 0.25]);
        assert_eq!(
            f32::from_array(&wide, 0),
            Err(ValueError::OutOfRange {
                value: 1e300f64.to_string()
            })
        );
        assert_eq!(f32::from_array(&wide, 1), Ok(f32::INFINITY));
        assert_eq!(f32::from_array(&wide, 2), Ok(0.25));
        assert!(matches!(
            f32::from_array(&StringArray::from(vec!["1e39"]), 0),
            Err(ValueError::OutOfRange { .. })
        ));

        let ints = Int64Array::from(vec![i64::MAX, 1 << 53, (1 << 53) + 1]);
        assert_eq!(
            f64::from_array(&ints, 0),
            Err(ValueError::OutOfRange {
                value: i64::MAX.to_string()
            })
        );
        assert_eq!(f64::from_array(&ints, 1), Ok(9007199254740992.0));
        assert!(f64::from_array(&ints, 2).is_err());
    }

    #[test]
    fn option_descriptor_reifies_argument() {
        let desc = <Option<i32> as ColumnValue>::descriptor();
        assert!(desc.is::<Option<i32>>());
        assert_eq!(desc.args(), &[TypeDescriptor::of::<i32>()]);
        assert_eq!(desc, TypeDescriptor::of::<Option<i32>>());
    }
}
