use super::scalar::coerce;
use crate::error::{CodecError, CodecResult};
use crate::schema::{base_type, is_optional, literal_kind, unwrap_optional, MemberDef, TypeAnnotation};
use crate::value::Value;

/// Fit an in-memory value (typically a declared default) to `annotation`.
///
/// Scalars go through [`coerce`], so a default may be written either as a typed
/// value or as its wire text. Unions are tried in declared order. Records and
/// dictionaries are taken as they are.
///
/// # Errors
///
/// `TypeMismatch` or `FormatError` when the value cannot take the annotated
/// shape.
pub fn conform(value: Value, annotation: &TypeAnnotation) -> CodecResult<Value> {
    if let Some(kind) = literal_kind(annotation) {
        return coerce(value, kind);
    }
    match base_type(annotation) {
        TypeAnnotation::Union(_) if is_optional(annotation) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                conform(value, &unwrap_optional(annotation))
            }
        }
        TypeAnnotation::Union(alternatives) => {
            for alternative in alternatives {
                if let Ok(v) = conform(value.clone(), alternative) {
                    return Ok(v);
                }
            }
            Err(CodecError::mismatch(annotation.to_string(), value.type_name()))
        }
        TypeAnnotation::List(element) => match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| conform(item, element))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::List),
            other => Err(CodecError::mismatch(annotation.to_string(), other.type_name())),
        },
        TypeAnnotation::Record(_) | TypeAnnotation::Dict => match value {
            record @ Value::Record(_) => Ok(record),
            other => Err(CodecError::mismatch(annotation.to_string(), other.type_name())),
        },
        TypeAnnotation::NoneType => match value {
            Value::Null => Ok(Value::Null),
            other => Err(CodecError::mismatch("None", other.type_name())),
        },
        TypeAnnotation::Body(inner) => conform(value, inner),
        TypeAnnotation::Literal(_) | TypeAnnotation::Annotated(..) => {
            Err(CodecError::mismatch(annotation.to_string(), value.type_name()))
        }
    }
}

/// Value for a record member whose key is missing from the wire.
///
/// Optionals read as `None`, then a declared default applies; anything else
/// is a missing required field reported under the member's wire `key`. An
/// optional member with a default therefore round-trips its `None`, which the
/// serializers express by omitting the key.
///
/// # Errors
///
/// `MissingRequiredField`, or whatever [`conform`] reports for a bad default.
pub fn absent_member(member: &MemberDef, key: &str) -> CodecResult<Value> {
    if is_optional(&member.annotation) {
        return Ok(Value::Null);
    }
    if let Some(default) = &member.default {
        return conform(default.clone(), &member.annotation);
    }
    Err(CodecError::missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_default_decimal_passes_through() {
        let ann = TypeAnnotation::optional(TypeAnnotation::decimal());
        let one = Value::Decimal(Decimal::ONE);
        assert_eq!(conform(one.clone(), &ann).unwrap(), one);
        assert_eq!(conform(Value::Null, &ann).unwrap(), Value::Null);
    }

    #[test]
    fn test_text_default_is_decoded() {
        let ann = TypeAnnotation::list(TypeAnnotation::integer());
        let value = Value::List(vec![Value::from("1"), Value::Int(2)]);
        assert_eq!(
            conform(value, &ann).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_absent_member_precedence() {
        let limit = MemberDef::with_default("limit", TypeAnnotation::optional(TypeAnnotation::integer()), 5_i64);
        assert_eq!(absent_member(&limit, "limit").unwrap(), Value::Null);

        let pages = MemberDef::with_default("pages", TypeAnnotation::integer(), "100");
        assert_eq!(absent_member(&pages, "pages").unwrap(), Value::Int(100));

        let title = MemberDef::required("title", TypeAnnotation::string());
        let err = absent_member(&title, "Title").unwrap_err();
        assert_eq!(err, CodecError::missing("Title"));
    }

    #[test]
    fn test_union_declared_order() {
        let ann = TypeAnnotation::union(vec![TypeAnnotation::integer(), TypeAnnotation::string()]);
        assert_eq!(conform(Value::from("42"), &ann).unwrap(), Value::Int(42));
        assert_eq!(conform(Value::from("x"), &ann).unwrap(), Value::from("x"));
    }
}
